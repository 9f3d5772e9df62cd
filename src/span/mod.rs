//! Cell spans: per-pass memoization and reconciliation of multi-row cells
//! whose anchor row has left the vertical window.

mod memo;
mod reconcile;

pub use memo::SpanMemo;
pub use reconcile::{reconcile_range, reconcile_spans, span_height, ReconcileRange, SpanPatch};
