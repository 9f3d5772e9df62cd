//! Property tests for flattening, geometry, windowing, and spans.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]

mod common;

use common::{flat_records, key_fn, records_with_row_span, small_config};
use proptest::prelude::*;
use proptest::sample::Index;
use serde_json::{json, Value};
use std::collections::HashSet;
use vgrid::layout::{flatten, ColumnGeometry, HorizontalWindow, RecordTree, ScrollConfig};
use vgrid::span::SpanMemo;
use vgrid::{Column, FixedSide, RowKey, ScrollControl, VirtualGrid};

/// Random forest: record `i` is a root or a child of some record before it.
fn forest(parents: &[Option<Index>]) -> (RecordTree<Value>, Vec<Option<usize>>) {
    let len = parents.len();
    let parent: Vec<Option<usize>> = parents
        .iter()
        .enumerate()
        .map(|(i, p)| if i == 0 { None } else { p.as_ref().map(|p| p.index(i)) })
        .collect();
    let mut children = vec![Vec::new(); len];
    let mut roots = Vec::new();
    for (i, p) in parent.iter().enumerate() {
        match p {
            Some(p) => children[*p].push(i),
            None => roots.push(i),
        }
    }
    let records = (0..len).map(|i| json!({"key": i})).collect();
    (RecordTree::from_links(records, roots, children).unwrap(), parent)
}

fn visible_descendants(tree: &RecordTree<Value>, id: usize, expanded: &HashSet<RowKey>) -> usize {
    if !expanded.contains(&RowKey::Number(id as i64)) {
        return 0;
    }
    tree.children(id)
        .iter()
        .map(|&child| 1 + visible_descendants(tree, child, expanded))
        .sum()
}

fn is_ancestor(parent: &[Option<usize>], ancestor: usize, mut id: usize) -> bool {
    while let Some(p) = parent[id] {
        if p == ancestor {
            return true;
        }
        id = p;
    }
    false
}

fn side(code: u8) -> FixedSide {
    match code {
        0 => FixedSide::Left,
        1 => FixedSide::Right,
        _ => FixedSide::None,
    }
}

fn columns(widths: &[f32], sides: &[u8]) -> Vec<Column<Value>> {
    widths
        .iter()
        .enumerate()
        .map(|(i, &w)| Column::new(format!("c{i}"), w).fixed(side(sides.get(i).copied().unwrap_or(9))))
        .collect()
}

fn grid_with(columns: Vec<Column<Value>>, records: Vec<Value>, width: f32) -> VirtualGrid<Value> {
    let config = vgrid::GridConfig {
        width,
        ..small_config()
    };
    VirtualGrid::new(RecordTree::from_flat(records), columns, key_fn(), &config).unwrap()
}

proptest! {
    #[test]
    fn flattening_is_contiguous(
        parents in proptest::collection::vec(proptest::option::weighted(0.7, any::<Index>()), 1..60),
        open in proptest::collection::vec(any::<bool>(), 60)
    ) {
        let (tree, parent) = forest(&parents);
        let expanded: HashSet<RowKey> = (0..parents.len())
            .filter(|&i| open[i])
            .map(|i| RowKey::Number(i as i64))
            .collect();
        let rows = flatten(&tree, &expanded, key_fn()).unwrap();

        let unique: HashSet<&RowKey> = rows.iter().map(|r| &r.row_key).collect();
        prop_assert_eq!(unique.len(), rows.len());

        for (s, row) in rows.iter().enumerate() {
            prop_assert_eq!(row.sequence_index, s);
            let block = visible_descendants(&tree, row.record, &expanded);
            for follower in &rows[s + 1..s + 1 + block] {
                prop_assert!(is_ancestor(&parent, row.record, follower.record));
                prop_assert!(follower.indent > row.indent);
            }
            if let Some(next) = rows.get(s + 1 + block) {
                prop_assert!(!is_ancestor(&parent, row.record, next.record));
            }
        }
    }

    #[test]
    fn geometry_is_monotonic(widths in proptest::collection::vec(0.5_f32..500.0, 1..50)) {
        let geometry = ColumnGeometry::new(&columns(&widths, &[])).unwrap();
        let edges = geometry.right_edges();
        prop_assert!(edges.windows(2).all(|w| w[0] < w[1]));
        let sum = widths.iter().fold(0.0_f32, |acc, w| acc + w);
        prop_assert_eq!(geometry.total_width(), sum);
    }

    #[test]
    fn window_covers_viewport(
        widths in proptest::collection::vec(10.0_f32..300.0, 1..40),
        viewport in 50.0_f32..1000.0,
        position in 0.0_f32..=1.0
    ) {
        let mut grid = grid_with(columns(&widths, &[]), flat_records(5), viewport);
        let total = grid.geometry().total_width();
        let max_offset = (total - viewport).max(0.0);
        grid.set_scroll_left(position * max_offset);
        let offset = grid.scroll_left();

        let geometry = grid.geometry();
        let window = grid.frame().horizontal;
        prop_assert!(geometry.left_edge(window.left_index) <= offset);
        prop_assert!(geometry.right_edge(window.right_index) >= (offset + viewport).min(total));
        let rendered = window.render_columns(geometry);
        let expected: Vec<usize> = (window.left_index..=window.right_index).collect();
        prop_assert_eq!(rendered, expected);
    }

    #[test]
    fn fixed_columns_render_once(
        widths in proptest::collection::vec(10.0_f32..300.0, 1..25),
        sides in proptest::collection::vec(0_u8..6, 25),
        viewport in 50.0_f32..800.0,
        position in 0.0_f32..=1.0
    ) {
        let mut grid = grid_with(columns(&widths, &sides), flat_records(3), viewport);
        let max_offset = (grid.geometry().total_width() - viewport).max(0.0);
        grid.set_scroll_left(position * max_offset);

        let geometry = grid.geometry();
        let fixed: Vec<usize> = geometry.fixed_left().iter().chain(geometry.fixed_right()).copied().collect();
        for row in &grid.frame().rows {
            for &index in &fixed {
                let count = row.cells.iter().filter(|c| c.column_index == index).count();
                prop_assert_eq!(count, 1, "column {} in {:?}", index, row.cells);
            }
            let indices: HashSet<usize> = row.cells.iter().map(|c| c.column_index).collect();
            prop_assert_eq!(indices.len(), row.cells.len());
        }
    }

    #[test]
    fn spans_are_never_clipped(
        rows in 2_i64..60,
        anchor in any::<Index>(),
        span in 2_i64..8,
        position in 0.0_f32..=1.0
    ) {
        let anchor = anchor.index(rows as usize) as i64;
        let columns = vec![
            Column::new("a", 100.0),
            Column::new("b", 100.0).with_span(vgrid::FieldSpan {
                row_span_field: Some("rs".into()),
                col_span_field: None,
            }),
        ];
        let mut grid = grid_with(columns, records_with_row_span(rows, anchor, span), 300.0);
        let max_top = (grid.frame().total_height - 100.0).max(0.0);
        grid.scroll_to(&ScrollConfig::top(position * max_top));

        let frame = grid.frame();
        let last = rows - 1;
        let end = (anchor + span - 1).min(last);
        let touches = (anchor..=end).any(|i| frame.vertical.contains(i as usize));
        let patch = frame.patch(&RowKey::Number(anchor));
        prop_assert_eq!(patch.is_some(), touches);
        if let Some(patch) = patch {
            prop_assert_eq!(patch.height, (end - anchor + 1) as f32 * 20.0);
        }
    }

    #[test]
    fn horizontal_window_is_idempotent(
        widths in proptest::collection::vec(10.0_f32..300.0, 1..30),
        sides in proptest::collection::vec(0_u8..6, 30),
        viewport in 50.0_f32..800.0,
        offset in 0.0_f32..5000.0
    ) {
        let columns = columns(&widths, &sides);
        let geometry = ColumnGeometry::new(&columns).unwrap();
        let tree = RecordTree::from_flat(flat_records(8));
        let rows = flatten(&tree, &HashSet::new(), key_fn()).unwrap();
        let window = vgrid::VerticalWindow { start_index: 0, end_index: 7, offset_y: 0.0, has_rows: true };

        let first = HorizontalWindow::compute(offset, viewport, &geometry, &window, &mut SpanMemo::new(&tree, &rows, &columns));
        let second = HorizontalWindow::compute(offset, viewport, &geometry, &window, &mut SpanMemo::new(&tree, &rows, &columns));
        prop_assert_eq!(first, second);
        prop_assert!(first.left_index <= first.right_index);
    }
}
