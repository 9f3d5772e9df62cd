//! Horizontal window calculation.

use serde::Serialize;

use super::ColumnGeometry;
use crate::span::SpanMemo;
use crate::types::VerticalWindow;

/// Column range materialized for the current horizontal scroll offset.
///
/// `left_index` and `right_index` are inclusive, true column indices.
/// Fixed columns are rendered on their own side by the row compositor
/// whether or not they fall in the range.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HorizontalWindow {
    pub left_index: usize,
    pub right_index: usize,
    /// Width of left-fixed columns declared before `left_index`
    pub total_fixed_width_before_left: f32,
    /// Horizontal scroll offset this window was computed for
    pub offset_x: f32,
    /// False when there are no columns
    pub has_columns: bool,
}

impl HorizontalWindow {
    /// Compute the window for `offset_x` over the rows of `rows`.
    ///
    /// Only the rows in `rows` are scanned, so the cost is bounded by the
    /// visible row count plus the column count.
    pub fn compute<R>(
        offset_x: f32,
        viewport_width: f32,
        geometry: &ColumnGeometry,
        rows: &VerticalWindow,
        spans: &mut SpanMemo<'_, R>,
    ) -> Self {
        let Some(last) = geometry.len().checked_sub(1) else {
            return Self {
                offset_x,
                ..Self::default()
            };
        };

        let right_index = geometry
            .first_reaching(offset_x + viewport_width)
            .unwrap_or(last);

        // Never retract past the last page when the viewport is wider than
        // the remaining content.
        let max_offset_x = (geometry.total_width() - viewport_width).max(0.0);
        let clamped = offset_x.min(max_offset_x).max(0.0);
        let mut left_index = geometry.first_reaching(clamped).unwrap_or(0);

        // Pull the left edge back to the anchor of any column span that
        // covers it on a visible row.
        let first_index = left_index;
        for row in rows.indices() {
            let mut index = first_index;
            while index > 0 && spans.span(row, index).col_span == 0 {
                index -= 1;
            }
            left_index = left_index.min(index);
        }
        let left_index = left_index.min(right_index);

        let total_fixed_width_before_left = geometry
            .fixed_left()
            .iter()
            .filter(|&&i| i < left_index)
            .map(|&i| geometry.width(i))
            .sum();

        Self {
            left_index,
            right_index,
            total_fixed_width_before_left,
            offset_x,
            has_columns: true,
        }
    }

    /// Window covering every column, as used before the first scroll event.
    pub fn full(geometry: &ColumnGeometry) -> Self {
        match geometry.len().checked_sub(1) {
            Some(last) => Self {
                left_index: 0,
                right_index: last,
                total_fixed_width_before_left: 0.0,
                offset_x: 0.0,
                has_columns: true,
            },
            None => Self::default(),
        }
    }

    pub fn contains(&self, index: usize) -> bool {
        self.has_columns && (self.left_index..=self.right_index).contains(&index)
    }

    /// Horizontal translation of the row content so that the first
    /// scrolling column of the window lands at its true scrolled position.
    ///
    /// Fixed columns are rendered out of the scroll flow, ahead of (left)
    /// or after (right) the window, so the whole left-fixed width is
    /// subtracted.
    pub fn translate_x(&self, geometry: &ColumnGeometry) -> f32 {
        if !self.has_columns {
            return -self.offset_x;
        }
        let first_scrolling = (self.left_index..=self.right_index)
            .find(|&i| !geometry.side(i).is_fixed())
            .unwrap_or(self.left_index);
        let pinned_left: f32 = geometry.fixed_left().iter().map(|&i| geometry.width(i)).sum();
        geometry.left_edge(first_scrolling) - self.offset_x - pinned_left
    }

    /// True column indices to render for a row, in render order: every
    /// left-fixed column, the scrolling columns of the window, then every
    /// right-fixed column. Each fixed column appears exactly once, on its
    /// own side, wherever it is declared.
    pub fn render_columns(&self, geometry: &ColumnGeometry) -> Vec<usize> {
        let Some(last) = geometry.len().checked_sub(1).filter(|_| self.has_columns) else {
            return Vec::new();
        };
        let mut columns = geometry.fixed_left().to_vec();
        columns.extend(
            (self.left_index..=self.right_index.min(last)).filter(|&i| !geometry.side(i).is_fixed()),
        );
        columns.extend_from_slice(geometry.fixed_right());
        columns
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp
)]
mod tests {
    use super::*;
    use crate::layout::{flatten, RecordTree};
    use crate::types::{json_key_field, CellSpan, Column, FixedSide};
    use serde_json::{json, Value};
    use std::collections::HashSet;
    use test_case::test_case;

    fn scenario_columns() -> Vec<Column<Value>> {
        vec![
            Column::new("A", 100.0).fixed(FixedSide::Left),
            Column::new("B", 150.0),
            Column::new("C", 150.0),
            Column::new("D", 150.0),
            Column::new("E", 150.0).fixed(FixedSide::Right),
        ]
    }

    fn window(rows: usize) -> VerticalWindow {
        VerticalWindow {
            start_index: 0,
            end_index: rows.saturating_sub(1),
            offset_y: 0.0,
            has_rows: rows > 0,
        }
    }

    fn compute(columns: &[Column<Value>], data: Vec<Value>, offset_x: f32, width: f32) -> HorizontalWindow {
        let tree = RecordTree::from_flat(data);
        let rows = flatten(&tree, &HashSet::new(), json_key_field("key")).unwrap();
        let geometry = ColumnGeometry::new(columns).unwrap();
        let mut memo = crate::span::SpanMemo::new(&tree, &rows, columns);
        HorizontalWindow::compute(offset_x, width, &geometry, &window(rows.len()), &mut memo)
    }

    #[test]
    fn test_scenario_offset_80() {
        let columns = scenario_columns();
        let hw = compute(&columns, vec![json!({"key": 0})], 80.0, 300.0);
        assert_eq!(hw.left_index, 0);
        assert_eq!(hw.right_index, 2);
        assert_eq!(hw.total_fixed_width_before_left, 0.0);

        let geometry = ColumnGeometry::new(&columns).unwrap();
        assert_eq!(hw.render_columns(&geometry), vec![0, 1, 2, 4]);
    }

    #[test]
    fn test_fixed_left_prepended_after_scroll() {
        let columns = scenario_columns();
        let hw = compute(&columns, vec![json!({"key": 0})], 260.0, 300.0);
        assert_eq!(hw.left_index, 2);
        assert_eq!(hw.right_index, 4);
        assert_eq!(hw.total_fixed_width_before_left, 100.0);
        let geometry = ColumnGeometry::new(&columns).unwrap();
        assert_eq!(hw.render_columns(&geometry), vec![0, 2, 3, 4]);
        // Column C's left edge (250) lands at 250 - 260 on screen, after the
        // 100px of prepended fixed content.
        assert_eq!(hw.translate_x(&geometry), 250.0 - 260.0 - 100.0);
    }

    #[test_case(0.0 => 0 ; "at origin")]
    #[test_case(399.0 => 2 ; "inside C")]
    #[test_case(400.0 => 2 ; "on C right edge")]
    #[test_case(1000.0 => 2 ; "past max offset clamps to last page")]
    fn test_left_index(offset_x: f32) -> usize {
        compute(&scenario_columns(), vec![json!({"key": 0})], offset_x, 300.0).left_index
    }

    #[test]
    fn test_col_span_pulls_left_edge_back() {
        // Row 1 has B spanning B..D, so C and D report colSpan 0 there.
        let columns: Vec<Column<Value>> = scenario_columns()
            .into_iter()
            .enumerate()
            .map(|(i, c)| {
                c.with_span(move |record: &Value, _: usize| {
                    let spanned = record["span"].as_bool().unwrap_or(false);
                    match (spanned, i) {
                        (true, 1) => CellSpan::new(1, 3),
                        (true, 2) | (true, 3) => CellSpan::new(1, 0),
                        _ => CellSpan::SINGLE,
                    }
                })
            })
            .collect();
        let data = vec![json!({"key": 0}), json!({"key": 1, "span": true})];
        let hw = compute(&columns, data, 420.0, 200.0);
        assert_eq!(hw.left_index, 1);
        // Fixed A sits before B, so it is prepended.
        assert_eq!(hw.total_fixed_width_before_left, 100.0);
    }

    #[test]
    fn test_correction_stops_at_zero() {
        let columns: Vec<Column<Value>> = vec![
            Column::new("a", 100.0).with_span(|_: &Value, _: usize| CellSpan::new(1, 0)),
            Column::new("b", 100.0).with_span(|_: &Value, _: usize| CellSpan::new(1, 0)),
        ];
        let hw = compute(&columns, vec![json!({"key": 0})], 150.0, 50.0);
        assert_eq!(hw.left_index, 0);
    }

    #[test]
    fn test_left_fixed_declared_last_renders_first() {
        let columns: Vec<Column<Value>> = vec![
            Column::new("a", 100.0),
            Column::new("b", 100.0),
            Column::new("c", 100.0),
            Column::new("pinned", 100.0).fixed(FixedSide::Left),
        ];
        let geometry = ColumnGeometry::new(&columns).unwrap();

        let hw = compute(&columns, vec![json!({"key": 0})], 0.0, 150.0);
        assert_eq!(hw.render_columns(&geometry), vec![3, 0, 1]);
        // Column a flows after the pinned 100px and must still sit at x = 0.
        assert_eq!(hw.translate_x(&geometry), -100.0);

        // Scrolled to the end the pinned column is inside the window and
        // still leads the row.
        let hw = compute(&columns, vec![json!({"key": 0})], 250.0, 150.0);
        assert_eq!(hw.right_index, 3);
        assert_eq!(hw.render_columns(&geometry), vec![3, 2]);
        assert_eq!(hw.translate_x(&geometry), 200.0 - 250.0 - 100.0);
    }

    #[test]
    fn test_right_fixed_declared_first_renders_last() {
        let columns: Vec<Column<Value>> = vec![
            Column::new("pinned", 80.0).fixed(FixedSide::Right),
            Column::new("a", 100.0),
            Column::new("b", 100.0),
        ];
        let geometry = ColumnGeometry::new(&columns).unwrap();
        let hw = compute(&columns, vec![json!({"key": 0})], 0.0, 400.0);
        assert_eq!(hw.render_columns(&geometry), vec![1, 2, 0]);
    }

    #[test]
    fn test_idempotent() {
        let columns = scenario_columns();
        let a = compute(&columns, vec![json!({"key": 0})], 123.0, 300.0);
        let b = compute(&columns, vec![json!({"key": 0})], 123.0, 300.0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_no_columns() {
        let hw = compute(&[], vec![json!({"key": 0})], 10.0, 300.0);
        assert!(!hw.has_columns);
        assert!(hw.render_columns(&ColumnGeometry::from_parts([]).unwrap()).is_empty());
    }
}
