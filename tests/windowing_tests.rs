//! Horizontal windowing and row composition tests
//!
//! Tests for the column window, fixed-column placement, column-span edge
//! correction, and the content transform.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

mod common;

use common::{flat_records, grid, scenario_columns, wide_columns};
use serde_json::{json, Value};
use test_case::test_case;
use vgrid::layout::ColumnGeometry;
use vgrid::render::RowRender;
use vgrid::{Column, FixedSide, RowKey, ScrollControl};

fn column_indices(row: &RowRender) -> Vec<usize> {
    row.cells.iter().map(|c| c.column_index).collect()
}

#[test]
fn test_scenario_offset_80() {
    let mut grid = grid(scenario_columns(), flat_records(10));
    grid.set_scroll_left(80.0);
    let frame = grid.frame();
    assert_eq!(frame.horizontal.left_index, 0);
    assert_eq!(frame.horizontal.right_index, 2);
    for row in &frame.rows {
        assert_eq!(column_indices(row), vec![0, 1, 2, 4]);
    }
    let keys: Vec<&str> = frame.rows[0].cells.iter().map(|c| c.column_key.as_str()).collect();
    assert_eq!(keys, vec!["A", "B", "C", "E"]);
    assert_eq!(frame.transform.translate_x, -80.0);
}

#[test]
fn test_fixed_left_prepended_once_scrolled_past() {
    let mut grid = grid(scenario_columns(), flat_records(10));
    grid.set_scroll_left(260.0);
    let frame = grid.frame();
    let row = &frame.rows[0];
    assert_eq!(column_indices(row), vec![0, 2, 3, 4]);

    let xs: Vec<f32> = row.cells.iter().map(|c| c.x).collect();
    assert_eq!(xs, vec![0.0, 100.0, 250.0, 400.0]);
    assert_eq!(frame.horizontal.total_fixed_width_before_left, 100.0);
    assert_eq!(frame.transform.translate_x, 250.0 - 260.0 - 100.0);

    // Column C lands at its true scrolled position.
    let c = &row.cells[1];
    assert_eq!(c.x + frame.transform.translate_x, 250.0 - 260.0);
}

#[test_case(0.0 ; "origin")]
#[test_case(99.0 ; "inside fixed column")]
#[test_case(250.0 ; "on an edge")]
#[test_case(333.3 ; "fractional")]
#[test_case(400.0 ; "max offset")]
fn test_fixed_columns_appear_exactly_once(offset: f32) {
    let mut grid = grid(scenario_columns(), flat_records(3));
    grid.set_scroll_left(offset);
    for row in &grid.frame().rows {
        let indices = column_indices(row);
        assert_eq!(indices.iter().filter(|&&i| i == 0).count(), 1, "{indices:?}");
        assert_eq!(indices.iter().filter(|&&i| i == 4).count(), 1, "{indices:?}");
        let mut sorted = indices.clone();
        sorted.dedup();
        assert_eq!(sorted.len(), indices.len(), "no duplicates: {indices:?}");
    }
}

#[test]
fn test_left_fixed_declared_after_scrolling_columns_leads() {
    let columns = vec![
        Column::new("a", 100.0),
        Column::new("b", 100.0),
        Column::new("c", 100.0),
        Column::new("pinned", 100.0).fixed(FixedSide::Left),
    ];
    let mut grid = grid(columns, flat_records(2));
    grid.resize(150.0, 100.0);
    let frame = grid.frame();
    assert_eq!(column_indices(&frame.rows[0]), vec![3, 0, 1]);
    let a = &frame.rows[0].cells[1];
    assert_eq!(a.x + frame.transform.translate_x, 0.0);

    grid.set_scroll_left(250.0);
    let frame = grid.frame();
    assert_eq!(column_indices(&frame.rows[0]), vec![3, 2]);
    let c = &frame.rows[0].cells[1];
    assert_eq!(c.x + frame.transform.translate_x, 200.0 - 250.0);
}

#[test]
fn test_sticky_insets_for_several_fixed_columns() {
    let columns = vec![
        Column::new("l1", 50.0).fixed(FixedSide::Left),
        Column::new("l2", 60.0).fixed(FixedSide::Left),
        Column::new("m", 400.0),
        Column::new("r1", 70.0).fixed(FixedSide::Right),
        Column::new("r2", 80.0).fixed(FixedSide::Right),
    ];
    let grid = grid(columns, flat_records(1));
    let cells = &grid.frame().rows[0].cells;
    let sticky: Vec<Option<f32>> = cells.iter().map(|c| c.sticky).collect();
    assert_eq!(sticky, vec![Some(0.0), Some(50.0), None, Some(80.0), Some(0.0)]);
}

#[test]
fn test_col_span_pulls_window_back_to_anchor() {
    let mut records = flat_records(4);
    records[1] = json!({"key": 1, "wide": true});
    let mut grid = grid(wide_columns(), records);
    grid.set_scroll_left(420.0);
    assert_eq!(grid.scroll_left(), 400.0);

    let frame = grid.frame();
    assert_eq!(frame.horizontal.left_index, 1);
    assert_eq!(frame.horizontal.right_index, 4);

    let wide = frame.row(&RowKey::Number(1)).unwrap();
    let b = wide.cells.iter().find(|c| c.column_key == "B").unwrap();
    assert_eq!(b.col_span, 3);
    assert_eq!(b.width, 450.0);
    assert!(!b.hidden);
    for key in ["C", "D"] {
        let covered = wide.cells.iter().find(|c| c.column_key == key).unwrap();
        assert!(covered.hidden, "{key} is covered by B");
        assert_eq!(covered.width, 150.0);
    }
}

#[test]
fn test_correction_ignores_rows_outside_window() {
    // The wide row is far below the viewport, so it cannot widen the window.
    let mut records = flat_records(50);
    records[40] = json!({"key": 40, "wide": true});
    let mut grid = grid(wide_columns(), records);
    grid.set_scroll_left(400.0);
    assert_eq!(grid.frame().horizontal.left_index, 2);
}

#[test]
fn test_viewport_wider_than_content() {
    let mut grid = grid(scenario_columns(), flat_records(3));
    grid.resize(2000.0, 100.0);
    grid.set_scroll_left(50.0);
    let frame = grid.frame();
    assert_eq!(grid.scroll_left(), 0.0);
    assert_eq!(frame.horizontal.left_index, 0);
    assert_eq!(frame.horizontal.right_index, 4);
    assert_eq!(column_indices(&frame.rows[0]), vec![0, 1, 2, 3, 4]);
}

#[test]
fn test_no_columns_renders_empty_rows() {
    let grid = grid(Vec::<Column<Value>>::new(), flat_records(3));
    let frame = grid.frame();
    assert!(!frame.horizontal.has_columns);
    assert_eq!(frame.rows.len(), 3);
    assert!(frame.rows.iter().all(|r| r.cells.is_empty()));
    assert_eq!(frame.scroll_width, 0.0);
}

#[test]
fn test_expanded_sibling_spans_all_columns_without_fixed() {
    let columns = vec![Column::new("a", 200.0), Column::new("b", 250.0)];
    let mut grid = grid(columns, vec![json!({"key": 1, "detail": "x"})]);
    grid.set_row_expandable(|r: &Value| r.get("detail").is_some());
    grid.toggle_expanded(&RowKey::Number(1)).unwrap();
    let expanded = grid.frame().rows[0].expanded.unwrap();
    assert_eq!(expanded.width, 450.0);
    assert_eq!(expanded.indent, 1);
}

#[test]
fn test_geometry_lookups() {
    let geometry = ColumnGeometry::new(&scenario_columns()).unwrap();
    assert_eq!(geometry.right_edges(), &[100.0, 250.0, 400.0, 550.0, 700.0]);
    assert_eq!(geometry.column_at(0.0), Some(0));
    assert_eq!(geometry.column_at(250.0), Some(2));
    assert_eq!(geometry.column_at(700.0), None);
    assert_eq!(geometry.span_width(3, 5), 300.0);
    assert_eq!(geometry.fixed_left(), &[0]);
    assert_eq!(geometry.fixed_right(), &[4]);
    assert_eq!(geometry.scrollable(), &[1, 2, 3]);
}
