//! Layout engine for the flattened sequence and its windows.
//!
//! This module handles:
//! - Projecting record trees onto a flat, index-addressable sequence
//! - Pre-computing column offsets and fixed/scrollable partitions
//! - Vertical windowing (provider trait and a measured-height list)
//! - Horizontal windowing with column-span edge correction

mod column_geometry;
mod flatten;
mod horizontal;
mod viewport;

pub use column_geometry::ColumnGeometry;
pub use flatten::{expand_all_keys, flatten, RecordTree};
pub use horizontal::HorizontalWindow;
pub use viewport::{
    Align, MeasuredList, ScrollConfig, ScrollInfo, VerticalWindowProvider, DEFAULT_ITEM_HEIGHT,
    DEFAULT_OVERSCAN,
};
