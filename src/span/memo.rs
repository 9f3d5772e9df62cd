//! Per-pass memo of cell spans.
//!
//! Span resolvers are user callbacks; the left-edge correction and both
//! reconciliation scans probe the same cells, so each (row, column) pair is
//! resolved at most once per recomputation pass. A memo borrows the
//! flattened sequence and column list for its whole lifetime, which keeps
//! them read-only for the pass.

use std::collections::HashMap;

use crate::layout::RecordTree;
use crate::types::{CellSpan, Column, FlattenedRow};

/// Memoized span lookups over one snapshot of rows and columns
pub struct SpanMemo<'a, R> {
    tree: &'a RecordTree<R>,
    rows: &'a [FlattenedRow],
    columns: &'a [Column<R>],
    /// Columns that carry a span resolver; all others are always 1×1
    span_columns: Vec<usize>,
    entries: HashMap<(usize, usize), CellSpan>,
    resolver_calls: usize,
}

impl<'a, R> SpanMemo<'a, R> {
    pub fn new(tree: &'a RecordTree<R>, rows: &'a [FlattenedRow], columns: &'a [Column<R>]) -> Self {
        let span_columns = columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.has_span_resolver())
            .map(|(i, _)| i)
            .collect();
        Self {
            tree,
            rows,
            columns,
            span_columns,
            entries: HashMap::new(),
            resolver_calls: 0,
        }
    }

    /// Span of the cell at (`row`, `column`).
    ///
    /// A row or column that is not in the snapshot (a stale index after a
    /// data swap) resolves to an ordinary 1×1 cell.
    pub fn span(&mut self, row: usize, column: usize) -> CellSpan {
        if let Some(span) = self.entries.get(&(row, column)) {
            return *span;
        }
        let span = match (self.columns.get(column), self.rows.get(row)) {
            (Some(col), Some(flat)) if col.has_span_resolver() => {
                match self.tree.get(flat.record) {
                    Some(record) => {
                        self.resolver_calls += 1;
                        col.span(record, flat.sequence_index)
                    }
                    None => CellSpan::SINGLE,
                }
            }
            _ => CellSpan::SINGLE,
        };
        self.entries.insert((row, column), span);
        span
    }

    /// True if any column at `row` anchors a multi-row span.
    pub fn row_has_anchor(&mut self, row: usize) -> bool {
        for i in 0..self.span_columns.len() {
            let Some(&column) = self.span_columns.get(i) else {
                break;
            };
            if self.span(row, column).is_row_anchor() {
                return true;
            }
        }
        false
    }

    /// Indices of columns with a span resolver.
    pub fn span_columns(&self) -> &[usize] {
        &self.span_columns
    }

    pub fn row(&self, index: usize) -> Option<&'a FlattenedRow> {
        self.rows.get(index)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of times a resolver was actually invoked.
    pub fn resolver_calls(&self) -> usize {
        self.resolver_calls
    }
}
