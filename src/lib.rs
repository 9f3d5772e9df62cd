//! vgrid - headless virtual grid engine
//!
//! Computes what a virtualized, tree-aware table should draw for the current
//! scroll position:
//! - Tree records flattened into a contiguous row sequence by expansion state
//! - Row windowing through a pluggable vertical window provider
//! - Column windowing with fixed left/right columns
//! - Row and column spans that stay whole when their anchor scrolls away
//!
//! # Usage
//!
//! ```
//! use serde_json::json;
//! use vgrid::{GridInput, ScrollControl, VirtualGrid};
//!
//! let input: GridInput = serde_json::from_value(json!({
//!     "config": {"width": 300, "height": 100},
//!     "columns": [{"key": "name", "width": 120}, {"key": "size", "width": 400}],
//!     "data": [{"key": 1}, {"key": 2}],
//! }))?;
//! let mut grid = VirtualGrid::from_input(input)?;
//! grid.set_scroll_left(150.0);
//! assert_eq!(grid.frame().horizontal.left_index, 1);
//! # Ok::<(), vgrid::error::GridError>(())
//! ```

pub mod error;
pub mod layout;
pub mod render;
pub mod span;
pub mod types;
pub mod viewer;

use wasm_bindgen::prelude::*;

// Re-export the main grid struct
pub use viewer::{GridConfig, GridInput, ScrollControl, ScrollNotice, VirtualGrid};

#[cfg(target_arch = "wasm32")]
pub use viewer::GridView;

pub use render::Frame;
pub use types::*;

/// Compute the frame for a JSON grid description scrolled to
/// (`scroll_x`, `scroll_y`) and return it as JSON.
///
/// # Errors
/// Returns an error if the input is not a valid grid description.
pub fn frame_json(input: &str, scroll_x: f32, scroll_y: f32) -> error::Result<String> {
    let mut grid = VirtualGrid::from_input(GridInput::from_json(input)?)?;
    grid.scroll_to(&layout::ScrollConfig {
        left: Some(scroll_x),
        top: Some(scroll_y),
        ..layout::ScrollConfig::default()
    });
    Ok(serde_json::to_string(grid.frame())?)
}

/// Get the library version
#[must_use]
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
