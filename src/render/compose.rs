//! Row composition: turn one flattened row plus the current horizontal
//! window into an ordered list of cell descriptions.

use serde::Serialize;

use crate::layout::{ColumnGeometry, HorizontalWindow};
use crate::span::SpanMemo;
use crate::types::{FixedSide, FlattenedRow, RowKey};

/// Inputs shared by every row composed in one pass
#[derive(Debug, Clone, Copy)]
pub struct ComposeContext<'a> {
    pub geometry: &'a ColumnGeometry,
    pub window: &'a HorizontalWindow,
    pub viewport_width: f32,
    /// Vertical offset of the first materialized row
    pub offset_y: f32,
}

/// What the row is being composed for
#[derive(Clone, Copy)]
pub enum RowRole<'h> {
    /// A normally windowed row; multi-row cells are left to the patch layer
    Normal,
    /// An overlay patch; only multi-row cells are shown. The callback maps a
    /// row span to its pixel height starting at this row.
    Patch(&'h dyn Fn(u32) -> f32),
}

/// One rendered cell
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellRender {
    /// True column index (stable while the horizontal window slides)
    pub column_index: usize,
    pub column_key: String,
    pub fixed: FixedSide,
    pub row_span: u32,
    pub col_span: u32,
    /// Flow position within the row
    pub x: f32,
    /// Visual width, covering every spanned column
    pub width: f32,
    /// Explicit height for multi-row cells drawn by a patch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    /// Inset from the pinned edge for fixed columns
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sticky: Option<f32>,
    /// Hidden cells keep their layout width but draw nothing
    pub hidden: bool,
}

/// Full-width sibling carrying a row's expanded content
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpandedRow {
    pub indent: usize,
    pub width: f32,
}

/// One rendered row
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowRender {
    pub row_key: RowKey,
    pub sequence_index: usize,
    /// Arena id of the record
    pub record: usize,
    pub indent: usize,
    /// Top relative to the translated content container
    pub top: f32,
    pub height: f32,
    pub cells: Vec<CellRender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expanded: Option<ExpandedRow>,
}

/// Compose the visible cells of `row`.
pub fn compose_cells<R>(
    row: &FlattenedRow,
    spans: &mut SpanMemo<'_, R>,
    ctx: &ComposeContext<'_>,
    role: RowRole<'_>,
) -> Vec<CellRender> {
    let geometry = ctx.geometry;
    let columns = ctx.window.render_columns(geometry);
    let mut cells = Vec::with_capacity(columns.len());
    let mut x: f32 = 0.0;

    for index in columns {
        let span = spans.span(row.sequence_index, index);
        let fixed = geometry.side(index);
        let (hidden, height) = match role {
            RowRole::Normal => (span.is_covered() || span.is_row_anchor(), None),
            RowRole::Patch(height_of) => {
                if span.is_row_anchor() {
                    (false, Some(height_of(span.row_span)))
                } else {
                    (true, None)
                }
            }
        };
        let own_width = geometry.width(index);
        cells.push(CellRender {
            column_index: index,
            column_key: geometry.key(index).unwrap_or_default().to_string(),
            fixed,
            row_span: span.row_span,
            col_span: span.col_span,
            x,
            width: geometry.span_width(index, span.col_span),
            height,
            sticky: fixed.is_fixed().then(|| geometry.sticky_inset(index)),
            hidden,
        });
        x += own_width;
    }
    cells
}

/// Compose a normally windowed row.
///
/// `top`/`height` are the row's pixel extent in content coordinates;
/// `expanded` is true when the row supports expansion and is currently
/// expanded, in which case a full-width sibling is attached.
pub fn compose_row<R>(
    row: &FlattenedRow,
    spans: &mut SpanMemo<'_, R>,
    ctx: &ComposeContext<'_>,
    top: f32,
    height: f32,
    expanded: bool,
) -> RowRender {
    let cells = compose_cells(row, spans, ctx, RowRole::Normal);
    let expanded = expanded.then(|| ExpandedRow {
        indent: row.indent + 1,
        width: if ctx.geometry.has_fixed() {
            ctx.viewport_width
        } else {
            ctx.geometry.total_width()
        },
    });
    RowRender {
        row_key: row.row_key.clone(),
        sequence_index: row.sequence_index,
        record: row.record,
        indent: row.indent,
        top: top - ctx.offset_y,
        height,
        cells,
        expanded,
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
    use crate::types::{json_key_field, CellSpan, Column};
    use serde_json::{json, Value};
    use std::collections::HashSet;

    fn columns() -> Vec<Column<Value>> {
        vec![
            Column::new("A", 100.0).fixed(FixedSide::Left),
            Column::new("B", 150.0).with_span(|r: &Value, _: usize| {
                CellSpan::new(1, u32::try_from(r["bSpan"].as_u64().unwrap_or(1)).unwrap())
            }),
            Column::new("C", 150.0).with_span(|r: &Value, _: usize| {
                CellSpan::new(u32::try_from(r["cRows"].as_u64().unwrap_or(1)).unwrap(), 1)
            }),
            Column::new("D", 150.0),
            Column::new("E", 150.0).fixed(FixedSide::Right),
        ]
    }

    fn window(left: usize, right: usize, geometry: &ColumnGeometry) -> HorizontalWindow {
        HorizontalWindow {
            left_index: left,
            right_index: right,
            total_fixed_width_before_left: geometry
                .fixed_left()
                .iter()
                .filter(|&&i| i < left)
                .map(|&i| geometry.width(i))
                .sum(),
            offset_x: 0.0,
            has_columns: true,
        }
    }

    #[test]
    fn test_true_column_indices_and_fixed_once() {
        let columns = columns();
        let geometry = ColumnGeometry::new(&columns).unwrap();
        let tree = RecordTree::from_flat(vec![json!({"key": 0})]);
        let rows = flatten(&tree, &HashSet::new(), json_key_field("key")).unwrap();
        let mut memo = SpanMemo::new(&tree, &rows, &columns);

        for (left, right) in [(0, 2), (1, 3), (2, 4), (3, 3)] {
            let hw = window(left, right, &geometry);
            let ctx = ComposeContext {
                geometry: &geometry,
                window: &hw,
                viewport_width: 300.0,
                offset_y: 0.0,
            };
            let row = compose_row(&rows[0], &mut memo, &ctx, 0.0, 24.0, false);
            let indices: Vec<usize> = row.cells.iter().map(|c| c.column_index).collect();
            assert_eq!(indices.iter().filter(|&&i| i == 0).count(), 1, "{indices:?}");
            assert_eq!(indices.iter().filter(|&&i| i == 4).count(), 1, "{indices:?}");
            assert_eq!(indices.first(), Some(&0));
            assert_eq!(indices.last(), Some(&4));
            for cell in &row.cells {
                assert_eq!(Some(cell.column_key.as_str()), geometry.key(cell.column_index));
            }
        }
    }

    #[test]
    fn test_flow_positions_and_sticky() {
        let columns = columns();
        let geometry = ColumnGeometry::new(&columns).unwrap();
        let tree = RecordTree::from_flat(vec![json!({"key": 0})]);
        let rows = flatten(&tree, &HashSet::new(), json_key_field("key")).unwrap();
        let mut memo = SpanMemo::new(&tree, &rows, &columns);
        let hw = window(2, 3, &geometry);
        let ctx = ComposeContext {
            geometry: &geometry,
            window: &hw,
            viewport_width: 300.0,
            offset_y: 0.0,
        };
        let cells = compose_cells(&rows[0], &mut memo, &ctx, RowRole::Normal);
        let xs: Vec<f32> = cells.iter().map(|c| c.x).collect();
        assert_eq!(xs, vec![0.0, 100.0, 250.0, 400.0]);
        assert_eq!(cells[0].sticky, Some(0.0));
        assert_eq!(cells[1].sticky, None);
        assert_eq!(cells[3].sticky, Some(0.0));
    }

    #[test]
    fn test_normal_row_hides_spanned_cells() {
        let columns = columns();
        let geometry = ColumnGeometry::new(&columns).unwrap();
        let tree = RecordTree::from_flat(vec![
            json!({"key": 0, "bSpan": 2, "cRows": 3}),
            json!({"key": 1, "bSpan": 1, "cRows": 0}),
        ]);
        let rows = flatten(&tree, &HashSet::new(), json_key_field("key")).unwrap();
        let mut memo = SpanMemo::new(&tree, &rows, &columns);
        let hw = HorizontalWindow::full(&geometry);
        let ctx = ComposeContext {
            geometry: &geometry,
            window: &hw,
            viewport_width: 700.0,
            offset_y: 0.0,
        };

        let first = compose_cells(&rows[0], &mut memo, &ctx, RowRole::Normal);
        assert!(!first[1].hidden);
        assert_eq!(first[1].width, 300.0);
        assert!(first[2].hidden, "row-spanning cell is left to the patch");

        let second = compose_cells(&rows[1], &mut memo, &ctx, RowRole::Normal);
        assert!(second[2].hidden, "covered cell");
        assert!(!second[3].hidden);
    }

    #[test]
    fn test_patch_row_shows_only_row_anchors() {
        let columns = columns();
        let geometry = ColumnGeometry::new(&columns).unwrap();
        let tree = RecordTree::from_flat(vec![json!({"key": 0, "cRows": 3})]);
        let rows = flatten(&tree, &HashSet::new(), json_key_field("key")).unwrap();
        let mut memo = SpanMemo::new(&tree, &rows, &columns);
        let hw = HorizontalWindow::full(&geometry);
        let ctx = ComposeContext {
            geometry: &geometry,
            window: &hw,
            viewport_width: 700.0,
            offset_y: 0.0,
        };
        let height_of = |span: u32| 24.0 * span as f32;
        let cells = compose_cells(&rows[0], &mut memo, &ctx, RowRole::Patch(&height_of));
        let shown: Vec<usize> = cells.iter().filter(|c| !c.hidden).map(|c| c.column_index).collect();
        assert_eq!(shown, vec![2]);
        assert_eq!(cells[2].height, Some(72.0));
    }

    #[test]
    fn test_expanded_sibling_width() {
        let columns = columns();
        let geometry = ColumnGeometry::new(&columns).unwrap();
        let tree = RecordTree::from_flat(vec![json!({"key": 0})]);
        let rows = flatten(&tree, &HashSet::new(), json_key_field("key")).unwrap();
        let mut memo = SpanMemo::new(&tree, &rows, &columns);
        let hw = HorizontalWindow::full(&geometry);
        let ctx = ComposeContext {
            geometry: &geometry,
            window: &hw,
            viewport_width: 320.0,
            offset_y: 0.0,
        };
        let row = compose_row(&rows[0], &mut memo, &ctx, 0.0, 24.0, true);
        assert_eq!(
            row.expanded,
            Some(ExpandedRow {
                indent: 1,
                width: 320.0
            })
        );
        assert!(compose_row(&rows[0], &mut memo, &ctx, 0.0, 24.0, false).expanded.is_none());
    }
}
