//! Render description of the grid.
//!
//! This module provides:
//! - Row composition (cell order, flow positions, visibility, sticky insets)
//! - The per-pass [`Frame`] handed to the embedding surface

mod compose;
mod frame;

pub use compose::{compose_cells, compose_row, CellRender, ComposeContext, ExpandedRow, RowRender, RowRole};
pub use frame::{ContentTransform, Frame};
