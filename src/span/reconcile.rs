//! Span reconciliation.
//!
//! Normal windowing culls a row as soon as it scrolls out of the vertical
//! window, which would also cull a row-spanning cell anchored there while
//! its lower part is still on screen. The reconciler finds every anchor
//! whose span touches the window and emits an overlay patch for it.

use serde::Serialize;

use super::SpanMemo;
use crate::layout::VerticalWindowProvider;
use crate::render::{compose_cells, CellRender, ComposeContext, RowRole};
use crate::types::{RowKey, VerticalWindow};

/// Out-of-band row restoring cells with `row_span > 1`.
///
/// Patches are absolutely positioned and never interactive; they exist only
/// to keep spanning cells visually whole.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpanPatch {
    pub row_key: RowKey,
    pub sequence_index: usize,
    /// Top relative to the translated content container (`anchor top - offset_y`)
    pub top: f32,
    /// Height of the tallest span anchored on this row
    pub height: f32,
    /// Always true: pointer events pass through
    pub overlay: bool,
    pub cells: Vec<CellRender>,
}

/// Inclusive row range whose anchors may affect the window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileRange {
    pub start_index: usize,
    pub end_index: usize,
}

/// Extend `window` backward to the anchors of cells covering its first
/// row, and forward to the end of the multi-row cells open at its last row.
///
/// The forward scan only follows spans already open at the last row, so
/// its reach is bounded by their span length. A span that claims rows past
/// either end of the sequence is clamped to it.
pub fn reconcile_range<R>(spans: &mut SpanMemo<'_, R>, window: &VerticalWindow) -> Option<ReconcileRange> {
    if window.is_empty() || spans.row_count() == 0 {
        return None;
    }
    let last_row = spans.row_count() - 1;
    let window_start = window.start_index.min(last_row);
    let window_end = window.end_index.min(last_row);
    let span_columns = spans.span_columns().to_vec();

    // Backward: columns covered at the first row need their anchor.
    let mut open: Vec<usize> = span_columns
        .iter()
        .copied()
        .filter(|&c| spans.span(window_start, c).row_span == 0)
        .collect();
    let mut start_index = window_start;
    while !open.is_empty() {
        let Some(probe) = start_index.checked_sub(1) else {
            tracing::warn!(
                columns = ?open,
                "covered cells have no anchor before row 0; clamping"
            );
            break;
        };
        start_index = probe;
        open.retain(|&c| spans.span(probe, c).row_span == 0);
    }

    // Forward: each span open at the last row covers a bounded run below
    // it. An anchor ends `row_span - 1` rows down; a covered cell ends
    // where its run of zero spans does.
    let mut end_index = window_end;
    for &column in &span_columns {
        let covered_to = match spans.span(window_end, column).row_span {
            0 => {
                let mut row = window_end;
                while row < last_row && spans.span(row + 1, column).row_span == 0 {
                    row += 1;
                }
                row
            }
            1 => window_end,
            row_span => window_end.saturating_add(usize::try_from(row_span - 1).unwrap_or(usize::MAX)),
        };
        end_index = end_index.max(covered_to);
    }
    if end_index > last_row {
        tracing::warn!(end_index, last_row, "row span runs past the sequence end; clamping");
        end_index = last_row;
    }

    Some(ReconcileRange {
        start_index,
        end_index,
    })
}

/// Pixel height of a span of `row_span` rows anchored at `anchor`.
///
/// The end row is clamped to the sequence; if the provider cannot size the
/// full range the last row it can size is used, and failing that an
/// estimate from the default item height.
pub fn span_height<R, P>(spans: &SpanMemo<'_, R>, provider: &P, anchor: usize, row_span: u32) -> f32
where
    P: VerticalWindowProvider + ?Sized,
{
    let span = usize::try_from(row_span.max(1)).unwrap_or(usize::MAX);
    let wanted = anchor.saturating_add(span - 1);
    let last_row = spans.row_count().saturating_sub(1);
    if wanted > last_row {
        tracing::warn!(anchor, row_span, last_row, "row span runs past the sequence end; clamping");
    }
    let end = wanted.min(last_row);

    let Some(anchor_key) = spans.row(anchor).map(|r| &r.row_key) else {
        return provider.default_item_height() * row_span.max(1) as f32;
    };
    (anchor..=end)
        .rev()
        .find_map(|i| {
            let end_key = spans.row(i).map(|r| &r.row_key)?;
            provider.size(anchor_key, Some(end_key))
        })
        .map_or_else(
            || provider.default_item_height() * row_span.max(1) as f32,
            |extent| extent.height(),
        )
}

/// Build span patches for the current windows.
///
/// Every row in the reconcile range that anchors a multi-row cell reaching
/// into the window yields a patch, rendered with the same column set as
/// normal rows. Patches whose spanning cells all fall outside the column
/// window are dropped.
pub fn reconcile_spans<R, P>(
    spans: &mut SpanMemo<'_, R>,
    window: &VerticalWindow,
    provider: &P,
    ctx: &ComposeContext<'_>,
) -> Vec<SpanPatch>
where
    P: VerticalWindowProvider + ?Sized,
{
    if spans.span_columns().is_empty() {
        return Vec::new();
    }
    let Some(range) = reconcile_range(spans, window) else {
        return Vec::new();
    };
    let _span = tracing::debug_span!(
        "span.reconcile",
        start = range.start_index,
        end = range.end_index,
        window_start = window.start_index,
        window_end = window.end_index
    )
    .entered();

    let mut patches = Vec::new();
    for index in range.start_index..=range.end_index {
        if !spans.row_has_anchor(index) {
            continue;
        }
        let Some(row) = spans.row(index) else {
            continue;
        };
        let Some(anchor) = provider.size(&row.row_key, None) else {
            // Stale key; the next pass after the provider catches up redraws it.
            tracing::debug!(row = index, "anchor row not sized by provider; skipping patch");
            continue;
        };

        let mut span_heights: Vec<(u32, f32)> = Vec::new();
        for i in 0..spans.span_columns().len() {
            let Some(&column) = spans.span_columns().get(i) else {
                continue;
            };
            let span = spans.span(index, column);
            if span.is_row_anchor() && !span_heights.iter().any(|(s, _)| *s == span.row_span) {
                span_heights.push((span.row_span, 0.0));
            }
        }
        // Anchors picked up by the range scans may end above the window.
        let reach = span_heights.iter().map(|(s, _)| *s).max().unwrap_or(1);
        let last_covered = index.saturating_add(usize::try_from(reach - 1).unwrap_or(usize::MAX));
        if index > window.end_index || last_covered < window.start_index {
            continue;
        }
        for entry in &mut span_heights {
            entry.1 = span_height(spans, provider, index, entry.0);
        }
        let tallest = span_heights.iter().map(|(_, h)| *h).fold(0.0, f32::max);
        let height_of = |row_span: u32| {
            span_heights
                .iter()
                .find(|(s, _)| *s == row_span)
                .map_or(anchor.height(), |(_, h)| *h)
        };

        let cells = compose_cells(row, spans, ctx, RowRole::Patch(&height_of));
        if cells.iter().all(|c| c.hidden) {
            // Every spanning cell is outside the column window.
            continue;
        }
        patches.push(SpanPatch {
            row_key: row.row_key.clone(),
            sequence_index: index,
            top: anchor.top - ctx.offset_y,
            height: tallest,
            overlay: true,
            cells,
        });
    }

    tracing::debug!(patches = patches.len(), "reconciled spans");
    patches
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
    use crate::layout::{flatten, ColumnGeometry, HorizontalWindow, MeasuredList, RecordTree};
    use crate::types::{json_key_field, CellSpan, Column, FieldSpan, FlattenedRow, RowKey};
    use serde_json::{json, Value};
    use std::collections::HashSet;

    /// `rows` records keyed 0.., with `rs` overrides for the spanning column
    fn records(rows: i64, spans: &[(i64, u32)]) -> Vec<Value> {
        (0..rows)
            .map(|key| {
                let rs = spans.iter().find(|(k, _)| *k == key).map_or(1, |(_, rs)| *rs);
                json!({"key": key, "rs": rs})
            })
            .collect()
    }

    fn columns(with_span: bool) -> Vec<Column<Value>> {
        let spanning = Column::new("b", 100.0);
        let spanning = if with_span {
            spanning.with_span(FieldSpan {
                row_span_field: Some("rs".into()),
                col_span_field: None,
            })
        } else {
            spanning
        };
        vec![Column::new("a", 100.0), spanning, Column::new("c", 100.0)]
    }

    fn provider(rows: &[FlattenedRow]) -> MeasuredList {
        let mut list = MeasuredList::new(300.0, 100.0, 20.0).with_overscan(0);
        list.set_keys(rows.iter().map(|r| r.row_key.clone()).collect());
        list
    }

    fn window(start: usize, end: usize, offset_y: f32) -> VerticalWindow {
        VerticalWindow {
            start_index: start,
            end_index: end,
            offset_y,
            has_rows: true,
        }
    }

    #[test]
    fn test_anchor_above_window_is_patched() {
        let tree = RecordTree::from_flat(records(20, &[(5, 3), (6, 0), (7, 0)]));
        let rows = flatten(&tree, &HashSet::new(), json_key_field("key")).unwrap();
        let columns = columns(true);
        let geometry = ColumnGeometry::new(&columns).unwrap();
        let list = provider(&rows);
        let mut memo = SpanMemo::new(&tree, &rows, &columns);
        let vertical = window(6, 10, 120.0);
        let hw = HorizontalWindow::full(&geometry);
        let ctx = ComposeContext {
            geometry: &geometry,
            window: &hw,
            viewport_width: 300.0,
            offset_y: vertical.offset_y,
        };

        let range = reconcile_range(&mut memo, &vertical).unwrap();
        assert_eq!(range.start_index, 5);
        assert_eq!(range.end_index, 10);

        let patches = reconcile_spans(&mut memo, &vertical, &list, &ctx);
        assert_eq!(patches.len(), 1);
        let patch = &patches[0];
        assert_eq!(patch.sequence_index, 5);
        assert_eq!(patch.row_key, RowKey::Number(5));
        assert_eq!(patch.top, 100.0 - 120.0);
        assert_eq!(patch.height, 60.0);
        assert!(patch.overlay);

        let shown: Vec<&CellRender> = patch.cells.iter().filter(|c| !c.hidden).collect();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].column_key, "b");
        assert_eq!(shown[0].height, Some(60.0));
    }

    #[test]
    fn test_forward_scan_covers_open_spans() {
        let tree = RecordTree::from_flat(records(10, &[(2, 3), (3, 0), (4, 0)]));
        let rows = flatten(&tree, &HashSet::new(), json_key_field("key")).unwrap();
        let columns = columns(true);
        let mut memo = SpanMemo::new(&tree, &rows, &columns);
        let range = reconcile_range(&mut memo, &window(0, 2, 0.0)).unwrap();
        assert_eq!(range.start_index, 0);
        assert_eq!(range.end_index, 4);
    }

    #[test]
    fn test_forward_scan_stops_at_open_spans() {
        let data: Vec<Value> = (0..10_000_i64)
            .map(|key| json!({"key": key, "rs": if key % 2 == 0 { 2 } else { 0 }}))
            .collect();
        let tree = RecordTree::from_flat(data);
        let rows = flatten(&tree, &HashSet::new(), json_key_field("key")).unwrap();
        let columns = columns(true);
        let geometry = ColumnGeometry::new(&columns).unwrap();
        let list = provider(&rows);
        let hw = HorizontalWindow::full(&geometry);
        let ctx = ComposeContext {
            geometry: &geometry,
            window: &hw,
            viewport_width: 300.0,
            offset_y: 0.0,
        };

        // Last row is covered: the run of zero spans ends right there.
        let mut memo = SpanMemo::new(&tree, &rows, &columns);
        let range = reconcile_range(&mut memo, &window(0, 5, 0.0)).unwrap();
        assert_eq!((range.start_index, range.end_index), (0, 5));

        // Last row anchors a span: extend by exactly its length.
        let mut memo = SpanMemo::new(&tree, &rows, &columns);
        let range = reconcile_range(&mut memo, &window(0, 4, 0.0)).unwrap();
        assert_eq!((range.start_index, range.end_index), (0, 5));

        let patches = reconcile_spans(&mut memo, &window(0, 4, 0.0), &list, &ctx);
        let anchors: Vec<usize> = patches.iter().map(|p| p.sequence_index).collect();
        assert_eq!(anchors, vec![0, 2, 4]);
        assert!(memo.resolver_calls() <= 8, "{} resolver calls", memo.resolver_calls());
    }

    #[test]
    fn test_anchor_ending_above_window_is_skipped() {
        // Row 3 anchors a two-row span that ends at row 4; the window starts
        // at 5, reached backward through the longer span anchored at 2.
        let tree = RecordTree::from_flat(records(10, &[]));
        let rows = flatten(&tree, &HashSet::new(), json_key_field("key")).unwrap();
        let columns: Vec<Column<Value>> = vec![
            Column::new("a", 100.0).with_span(|_: &Value, i: usize| match i {
                2 => CellSpan::new(4, 1),
                3..=5 => CellSpan::new(0, 1),
                _ => CellSpan::SINGLE,
            }),
            Column::new("b", 100.0).with_span(|_: &Value, i: usize| match i {
                3 => CellSpan::new(2, 1),
                4 => CellSpan::new(0, 1),
                _ => CellSpan::SINGLE,
            }),
        ];
        let geometry = ColumnGeometry::new(&columns).unwrap();
        let list = provider(&rows);
        let hw = HorizontalWindow::full(&geometry);
        let ctx = ComposeContext {
            geometry: &geometry,
            window: &hw,
            viewport_width: 300.0,
            offset_y: 100.0,
        };
        let mut memo = SpanMemo::new(&tree, &rows, &columns);
        let vertical = window(5, 8, 100.0);
        assert_eq!(reconcile_range(&mut memo, &vertical).unwrap().start_index, 2);

        let patches = reconcile_spans(&mut memo, &vertical, &list, &ctx);
        let anchors: Vec<usize> = patches.iter().map(|p| p.sequence_index).collect();
        assert_eq!(anchors, vec![2]);
        assert_eq!(patches[0].height, 80.0);
    }

    #[test]
    fn test_span_past_sequence_end_is_clamped() {
        let tree = RecordTree::from_flat(records(5, &[(3, 5), (4, 0)]));
        let rows = flatten(&tree, &HashSet::new(), json_key_field("key")).unwrap();
        let columns = columns(true);
        let list = provider(&rows);
        let mut memo = SpanMemo::new(&tree, &rows, &columns);

        assert_eq!(span_height(&memo, &list, 3, 5), 40.0);
        let range = reconcile_range(&mut memo, &window(3, 4, 60.0)).unwrap();
        assert_eq!(range.end_index, 4);
    }

    #[test]
    fn test_unsized_range_falls_back_to_default_height() {
        let tree = RecordTree::from_flat(records(5, &[(1, 3)]));
        let rows = flatten(&tree, &HashSet::new(), json_key_field("key")).unwrap();
        let columns = columns(true);
        // Provider that has never seen these keys
        let list = MeasuredList::new(300.0, 100.0, 20.0);
        let memo = SpanMemo::new(&tree, &rows, &columns);
        assert_eq!(span_height(&memo, &list, 1, 3), 60.0);
    }

    #[test]
    fn test_no_resolvers_no_patches() {
        let tree = RecordTree::from_flat(records(20, &[(5, 3), (6, 0), (7, 0)]));
        let rows = flatten(&tree, &HashSet::new(), json_key_field("key")).unwrap();
        let columns = columns(false);
        let geometry = ColumnGeometry::new(&columns).unwrap();
        let list = provider(&rows);
        let mut memo = SpanMemo::new(&tree, &rows, &columns);
        let hw = HorizontalWindow::full(&geometry);
        let ctx = ComposeContext {
            geometry: &geometry,
            window: &hw,
            viewport_width: 300.0,
            offset_y: 0.0,
        };
        assert!(reconcile_spans(&mut memo, &window(6, 10, 120.0), &list, &ctx).is_empty());
        assert_eq!(memo.resolver_calls(), 0);
    }

    #[test]
    fn test_empty_window() {
        let tree = RecordTree::from_flat(records(3, &[]));
        let rows = flatten(&tree, &HashSet::new(), json_key_field("key")).unwrap();
        let columns = columns(true);
        let mut memo = SpanMemo::new(&tree, &rows, &columns);
        assert!(reconcile_range(&mut memo, &VerticalWindow::empty()).is_none());
    }
}
