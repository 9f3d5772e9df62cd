//! Span reconciliation tests
//!
//! Tests for multi-row cells whose anchor row scrolls out of the vertical
//! window, and for span data that runs past the sequence.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

mod common;

use common::{flat_records, grid, records_with_row_span, spanning_columns};
use serde_json::json;
use vgrid::layout::{RecordTree, ScrollConfig};
use vgrid::{RowKey, ScrollControl};

#[test]
fn test_anchor_scrolled_out_gets_patch() {
    let mut grid = grid(spanning_columns(), records_with_row_span(20, 5, 3));
    grid.resize(300.0, 80.0);
    grid.scroll_to(&ScrollConfig::top(120.0));

    let frame = grid.frame();
    assert_eq!(frame.vertical.start_index, 6);
    assert_eq!(frame.vertical.end_index, 10);
    let windowed: Vec<usize> = frame.rows.iter().map(|r| r.sequence_index).collect();
    assert_eq!(windowed, vec![6, 7, 8, 9, 10]);

    assert_eq!(frame.patches.len(), 1);
    let patch = &frame.patches[0];
    assert_eq!(patch.row_key, RowKey::Number(5));
    assert_eq!(patch.height, 60.0);
    // Anchor top (100) relative to the first windowed row (120)
    assert_eq!(patch.top, -20.0);
    assert!(patch.overlay);

    let b = patch.cells.iter().find(|c| c.column_key == "B").unwrap();
    assert!(!b.hidden);
    assert_eq!(b.row_span, 3);
    assert_eq!(b.height, Some(60.0));
    assert!(patch.cells.iter().filter(|c| c.column_key != "B").all(|c| c.hidden));

    // Covered cells in the windowed rows draw nothing.
    for key in [6, 7] {
        let row = frame.row(&RowKey::Number(key)).unwrap();
        assert!(row.cells.iter().find(|c| c.column_key == "B").unwrap().hidden);
    }
    let row = frame.row(&RowKey::Number(8)).unwrap();
    assert!(!row.cells.iter().find(|c| c.column_key == "B").unwrap().hidden);
}

#[test]
fn test_anchor_inside_window_is_drawn_by_patch() {
    let grid = grid(spanning_columns(), records_with_row_span(20, 2, 2));
    let frame = grid.frame();
    let anchor = frame.row(&RowKey::Number(2)).unwrap();
    assert!(anchor.cells.iter().find(|c| c.column_key == "B").unwrap().hidden);

    let patch = frame.patch(&RowKey::Number(2)).unwrap();
    assert_eq!(patch.top, 40.0);
    assert_eq!(patch.height, 40.0);
}

#[test]
fn test_span_never_clipped_while_visible() {
    let mut grid = grid(spanning_columns(), records_with_row_span(30, 5, 3));
    for step in 0..=40 {
        let top = step as f32 * 10.0;
        grid.scroll_to(&ScrollConfig::top(top));
        let frame = grid.frame();
        let touches = (5..=7).any(|i| frame.vertical.contains(i));
        match frame.patch(&RowKey::Number(5)) {
            Some(patch) => {
                assert!(touches, "patch without a visible spanned row at {top}");
                assert_eq!(patch.height, 60.0, "at {top}");
            }
            None => assert!(!touches, "span clipped at {top}"),
        }
    }
}

#[test]
fn test_measured_rows_change_patch_height() {
    let mut grid = grid(spanning_columns(), records_with_row_span(20, 5, 3));
    grid.measure_row(&RowKey::Number(6), 50.0);
    grid.scroll_to(&ScrollConfig::top(130.0));
    let patch = grid.frame().patch(&RowKey::Number(5)).unwrap();
    assert_eq!(patch.height, 20.0 + 50.0 + 20.0);
}

#[test]
fn test_span_past_end_is_clamped() {
    let mut grid = grid(spanning_columns(), records_with_row_span(10, 8, 5));
    grid.scroll_to(&ScrollConfig::top(1000.0));
    let frame = grid.frame();
    assert_eq!(frame.vertical.end_index, 9);
    let patch = frame.patch(&RowKey::Number(8)).unwrap();
    assert_eq!(patch.height, 40.0);
}

#[test]
fn test_col_and_row_span_together() {
    let mut records = flat_records(10);
    records[1] = json!({"key": 1, "rs": 2, "cs": 2});
    records[2] = json!({"key": 2, "rs": 0, "cs": 0});
    let grid = grid(spanning_columns(), records);
    let patch = grid.frame().patch(&RowKey::Number(1)).unwrap();
    let b = patch.cells.iter().find(|c| c.column_key == "B").unwrap();
    assert_eq!(b.width, 300.0);
    assert_eq!(b.height, Some(40.0));
}

#[test]
fn test_no_span_data_no_patches() {
    let mut grid = grid(spanning_columns(), flat_records(50));
    for top in [0.0, 200.0, 600.0] {
        grid.scroll_to(&ScrollConfig::top(top));
        assert!(grid.frame().patches.is_empty());
    }
}

#[test]
fn test_patches_follow_data_swap() {
    let mut grid = grid(spanning_columns(), records_with_row_span(20, 2, 3));
    assert!(grid.frame().patch(&RowKey::Number(2)).is_some());
    grid.set_data(RecordTree::from_flat(flat_records(3))).unwrap();
    assert!(grid.frame().patches.is_empty());
    assert_eq!(grid.frame().rows.len(), 3);
}

#[test]
fn test_patch_dropped_when_spanning_column_scrolls_out() {
    let mut grid = grid(spanning_columns(), records_with_row_span(20, 5, 3));
    grid.resize(300.0, 80.0);
    grid.scroll_to(&ScrollConfig::top(120.0));
    assert!(grid.frame().patch(&RowKey::Number(5)).is_some());

    // B is outside the column window now, so there is nothing to draw.
    grid.set_scroll_left(260.0);
    assert!(grid.frame().patch(&RowKey::Number(5)).is_none());

    grid.set_scroll_left(0.0);
    assert!(grid.frame().patch(&RowKey::Number(5)).is_some());
}

#[test]
fn test_back_to_back_spans_stay_near_window() {
    let records: Vec<_> = (0..10_000_i64)
        .map(|key| json!({"key": key, "rs": if key % 2 == 0 { 2 } else { 0 }}))
        .collect();
    let grid = grid(spanning_columns(), records);
    let frame = grid.frame();
    assert_eq!(frame.vertical.start_index, 0);
    assert_eq!(frame.vertical.end_index, 5);

    let anchors: Vec<usize> = frame.patches.iter().map(|p| p.sequence_index).collect();
    assert_eq!(anchors, vec![0, 2, 4]);
    assert!(frame.patches.iter().all(|p| p.height == 40.0));
}
