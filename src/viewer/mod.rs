//! Grid orchestrator: the primary entry point.
//!
//! [`VirtualGrid`] owns the record tree, the column list, and a vertical
//! window provider. It handles:
//! - Re-flattening when data or the expanded-key set changes
//! - Recomputing column geometry when the column list changes
//! - One synchronous recomputation pass per scroll, resize, or measure event
//!
//! Every pass reads the provider's window once and feeds that same window
//! to the horizontal window calculator, the span reconciler, and the row
//! compositor, so spans are never computed against a stale row range.

mod config;
mod scroll;
#[cfg(target_arch = "wasm32")]
mod wasm;

use std::collections::HashSet;
use std::fmt;

pub use config::{GridConfig, GridInput};
pub use scroll::{ScrollControl, ScrollNotice};
#[cfg(target_arch = "wasm32")]
pub use wasm::GridView;

use crate::error::{GridError, Result};
use crate::layout::{flatten, ColumnGeometry, HorizontalWindow, MeasuredList, RecordTree, VerticalWindowProvider};
use crate::render::{compose_row, ComposeContext, ContentTransform, Frame};
use crate::span::{reconcile_spans, SpanMemo};
use crate::types::{Column, FlattenedRow, RowKey};

type RowKeyFn<R> = Box<dyn Fn(&R, usize) -> Option<RowKey>>;
type RowPredicate<R> = Box<dyn Fn(&R) -> bool>;
type ScrollListener = Box<dyn FnMut(&ScrollNotice)>;

/// Virtualized, tree-aware table.
pub struct VirtualGrid<R, P = MeasuredList> {
    tree: RecordTree<R>,
    columns: Vec<Column<R>>,
    geometry: ColumnGeometry,
    rows: Vec<FlattenedRow>,
    expanded: HashSet<RowKey>,
    row_key: RowKeyFn<R>,
    row_expandable: Option<RowPredicate<R>>,
    provider: P,
    frame: Frame,
    on_scroll: Option<ScrollListener>,
}

impl<R> VirtualGrid<R, MeasuredList> {
    /// Create a grid backed by a [`MeasuredList`] sized from `config`.
    ///
    /// # Errors
    /// Fails on invalid columns or on missing or duplicate row keys.
    pub fn new<K>(tree: RecordTree<R>, columns: Vec<Column<R>>, row_key: K, config: &GridConfig) -> Result<Self>
    where
        K: Fn(&R, usize) -> Option<RowKey> + 'static,
    {
        Self::with_provider(tree, columns, row_key, config.provider())
    }
}

impl<R, P: VerticalWindowProvider> VirtualGrid<R, P> {
    /// Create a grid over an arbitrary vertical window provider.
    ///
    /// # Errors
    /// Fails on invalid columns or on missing or duplicate row keys.
    pub fn with_provider<K>(tree: RecordTree<R>, columns: Vec<Column<R>>, row_key: K, provider: P) -> Result<Self>
    where
        K: Fn(&R, usize) -> Option<RowKey> + 'static,
    {
        let geometry = ColumnGeometry::new(&columns)?;
        let rows = flatten(&tree, &HashSet::new(), &row_key)?;
        let mut grid = Self {
            tree,
            columns,
            geometry,
            rows,
            expanded: HashSet::new(),
            row_key: Box::new(row_key),
            row_expandable: None,
            provider,
            frame: Frame::default(),
            on_scroll: None,
        };
        grid.sync_provider();
        grid.recompute();
        Ok(grid)
    }

    /// Replace the record tree. Expanded keys are kept.
    ///
    /// # Errors
    /// On a missing or duplicate row key the previous data stays in place.
    pub fn set_data(&mut self, tree: RecordTree<R>) -> Result<()> {
        let rows = flatten(&tree, &self.expanded, &self.row_key)?;
        self.tree = tree;
        self.rows = rows;
        self.sync_provider();
        self.recompute();
        Ok(())
    }

    /// Replace the column list.
    ///
    /// # Errors
    /// On an invalid width or duplicate key the previous columns stay in place.
    pub fn set_columns(&mut self, columns: Vec<Column<R>>) -> Result<()> {
        let geometry = ColumnGeometry::new(&columns)?;
        if geometry.identity() != self.geometry.identity() {
            tracing::debug!(columns = geometry.len(), width = geometry.total_width(), "column geometry changed");
            self.geometry = geometry;
            self.provider.set_scroll_width(self.geometry.total_width());
        }
        // Resolvers may differ even when the geometry does not.
        self.columns = columns;
        self.recompute();
        Ok(())
    }

    /// Replace the expanded-key set and re-flatten.
    ///
    /// # Errors
    /// On a missing or duplicate row key the previous set stays in place.
    pub fn set_expanded_keys(&mut self, keys: HashSet<RowKey>) -> Result<()> {
        let rows = flatten(&self.tree, &keys, &self.row_key)?;
        self.expanded = keys;
        self.rows = rows;
        self.sync_provider();
        self.recompute();
        Ok(())
    }

    /// Expand or collapse one row. Returns whether it is now expanded.
    ///
    /// # Errors
    /// Returns [`GridError::UnknownRowKey`] if no visible row has `key`.
    pub fn toggle_expanded(&mut self, key: &RowKey) -> Result<bool> {
        if !self.rows.iter().any(|r| &r.row_key == key) {
            return Err(GridError::UnknownRowKey(key.clone()));
        }
        let mut keys = self.expanded.clone();
        let expanded = if keys.remove(key) {
            false
        } else {
            keys.insert(key.clone());
            true
        };
        self.set_expanded_keys(keys)?;
        Ok(expanded)
    }

    /// Mark which records carry expandable content.
    pub fn set_row_expandable<F>(&mut self, predicate: F)
    where
        F: Fn(&R) -> bool + 'static,
    {
        self.row_expandable = Some(Box::new(predicate));
        self.recompute();
    }

    /// Report a rendered row's measured height.
    pub fn measure_row(&mut self, key: &RowKey, height: f32) {
        if self.provider.measure(key, height) {
            self.recompute();
        }
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        let before = self.provider.scroll_info();
        self.provider.resize(width, height);
        self.recompute();
        self.notify_if_moved(before);
    }

    /// Register the scroll listener, replacing any previous one.
    pub fn on_scroll<F>(&mut self, listener: F)
    where
        F: FnMut(&ScrollNotice) + 'static,
    {
        self.on_scroll = Some(Box::new(listener));
    }

    /// Frame computed by the latest pass.
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Current flattened sequence.
    pub fn rows(&self) -> &[FlattenedRow] {
        &self.rows
    }

    pub fn geometry(&self) -> &ColumnGeometry {
        &self.geometry
    }

    pub fn columns(&self) -> &[Column<R>] {
        &self.columns
    }

    pub fn tree(&self) -> &RecordTree<R> {
        &self.tree
    }

    pub fn expanded_keys(&self) -> &HashSet<RowKey> {
        &self.expanded
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    fn sync_provider(&mut self) {
        self.provider.set_keys(self.rows.iter().map(|r| r.row_key.clone()).collect());
        self.provider.set_scroll_width(self.geometry.total_width());
    }

    fn row_expanded(&self, row: &FlattenedRow) -> bool {
        let Some(predicate) = &self.row_expandable else {
            return false;
        };
        self.expanded.contains(&row.row_key) && self.tree.get(row.record).is_some_and(|r| predicate(r))
    }

    /// Run one recomputation pass and replace the cached frame.
    fn recompute(&mut self) {
        let vertical = self.provider.window();
        let scroll = self.provider.scroll_info();
        let viewport_width = self.provider.viewport_width();
        let _span = tracing::debug_span!(
            "grid.pass",
            start = vertical.start_index,
            end = vertical.end_index,
            offset_x = scroll.x,
            offset_y = scroll.y
        )
        .entered();

        let mut spans = SpanMemo::new(&self.tree, &self.rows, &self.columns);
        let horizontal = HorizontalWindow::compute(scroll.x, viewport_width, &self.geometry, &vertical, &mut spans);
        let ctx = ComposeContext {
            geometry: &self.geometry,
            window: &horizontal,
            viewport_width,
            offset_y: vertical.offset_y,
        };

        let mut rows = Vec::with_capacity(vertical.len());
        for index in vertical.indices() {
            let Some(row) = spans.row(index) else {
                continue;
            };
            let Some(extent) = self.provider.size(&row.row_key, None) else {
                continue;
            };
            let expanded = self.row_expanded(row);
            rows.push(compose_row(row, &mut spans, &ctx, extent.top, extent.height(), expanded));
        }
        let patches = reconcile_spans(&mut spans, &vertical, &self.provider, &ctx);

        tracing::debug!(
            left = horizontal.left_index,
            right = horizontal.right_index,
            rows = rows.len(),
            patches = patches.len(),
            resolver_calls = spans.resolver_calls(),
            "recomputed frame"
        );

        self.frame = Frame {
            vertical,
            horizontal,
            rows,
            patches,
            transform: ContentTransform::new(&self.geometry, &horizontal, &vertical),
            total_height: self.provider.total_height(),
            scroll_width: self.geometry.total_width(),
        };
    }
}

impl<R, P: fmt::Debug> fmt::Debug for VirtualGrid<R, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualGrid")
            .field("records", &self.tree.len())
            .field("rows", &self.rows.len())
            .field("columns", &self.columns)
            .field("expanded", &self.expanded)
            .field("provider", &self.provider)
            .finish_non_exhaustive()
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
    use crate::types::{json_key_field, FieldSpan, FixedSide};
    use serde_json::{json, Value};

    fn config() -> GridConfig {
        GridConfig {
            width: 300.0,
            height: 100.0,
            item_height: 20.0,
            overscan: 0,
            ..GridConfig::default()
        }
    }

    fn grid(data: Vec<Value>) -> VirtualGrid<Value> {
        let columns = vec![
            Column::new("A", 100.0).fixed(FixedSide::Left),
            Column::new("B", 150.0).with_span(FieldSpan {
                row_span_field: Some("rs".into()),
                col_span_field: None,
            }),
            Column::new("C", 150.0),
            Column::new("D", 150.0),
            Column::new("E", 150.0).fixed(FixedSide::Right),
        ];
        let tree = RecordTree::from_roots(data, "children");
        VirtualGrid::new(tree, columns, json_key_field_owned(), &config()).unwrap()
    }

    fn json_key_field_owned() -> impl Fn(&Value, usize) -> Option<RowKey> {
        |record, index| json_key_field("key")(record, index)
    }

    fn flat(rows: i64) -> Vec<Value> {
        (0..rows).map(|k| json!({"key": k})).collect()
    }

    #[test]
    fn test_initial_frame() {
        let grid = grid(flat(50));
        let frame = grid.frame();
        assert_eq!(frame.vertical.start_index, 0);
        assert_eq!(frame.vertical.end_index, 5);
        assert_eq!(frame.rows.len(), 6);
        assert_eq!(frame.total_height, 1000.0);
        assert_eq!(frame.scroll_width, 700.0);
        assert!(frame.patches.is_empty());
    }

    #[test]
    fn test_expansion_refreshes_sequence() {
        let mut grid = grid(vec![
            json!({"key": "k1"}),
            json!({"key": "k3", "children": [{"key": "c1"}, {"key": "c2"}]}),
            json!({"key": "k4"}),
        ]);
        assert_eq!(grid.rows().len(), 3);
        assert!(grid.toggle_expanded(&RowKey::from("k3")).unwrap());
        assert_eq!(grid.rows().len(), 5);
        assert_eq!(grid.rows()[4].row_key, RowKey::from("k4"));
        assert_eq!(grid.frame().rows.len(), 5);
        assert!(!grid.toggle_expanded(&RowKey::from("k3")).unwrap());
        assert_eq!(grid.rows().len(), 3);
    }

    #[test]
    fn test_toggle_unknown_key() {
        let mut grid = grid(flat(3));
        assert!(matches!(
            grid.toggle_expanded(&RowKey::from("nope")),
            Err(GridError::UnknownRowKey(_))
        ));
    }

    #[test]
    fn test_duplicate_keys_keep_previous_data() {
        let mut grid = grid(flat(3));
        let err = grid.set_data(RecordTree::from_flat(vec![json!({"key": 1}), json!({"key": 1})]));
        assert!(matches!(err, Err(GridError::DuplicateRowKey { .. })));
        assert_eq!(grid.rows().len(), 3);
    }

    #[test]
    fn test_invalid_columns_keep_previous_geometry() {
        let mut grid = grid(flat(3));
        let err = grid.set_columns(vec![Column::new("x", -1.0)]);
        assert!(matches!(err, Err(GridError::InvalidColumnWidth { .. })));
        assert_eq!(grid.geometry().len(), 5);
    }

    #[test]
    fn test_measure_row_moves_following_rows() {
        let mut grid = grid(flat(10));
        grid.measure_row(&RowKey::Number(1), 50.0);
        let frame = grid.frame();
        assert_eq!(frame.row(&RowKey::Number(2)).unwrap().top, 70.0);
        assert_eq!(frame.total_height, 230.0);
    }

    #[test]
    fn test_expanded_sibling_needs_predicate() {
        let mut grid = grid(vec![json!({"key": 1, "detail": true}), json!({"key": 2})]);
        grid.set_expanded_keys([RowKey::Number(1), RowKey::Number(2)].into_iter().collect())
            .unwrap();
        assert!(grid.frame().rows.iter().all(|r| r.expanded.is_none()));

        grid.set_row_expandable(|r: &Value| r.get("detail").is_some());
        let frame = grid.frame();
        assert!(frame.row(&RowKey::Number(1)).unwrap().expanded.is_some());
        assert!(frame.row(&RowKey::Number(2)).unwrap().expanded.is_none());
    }

    #[test]
    fn test_same_geometry_new_resolvers() {
        let mut grid = grid(vec![json!({"key": 0, "rs": 2}), json!({"key": 1, "rs": 0})]);
        let identity = grid.geometry().identity();
        assert_eq!(grid.frame().patches.len(), 1);
        grid.set_columns(vec![
            Column::new("A", 100.0).fixed(FixedSide::Left),
            Column::new("B", 150.0),
            Column::new("C", 150.0),
            Column::new("D", 150.0),
            Column::new("E", 150.0).fixed(FixedSide::Right),
        ])
        .unwrap();
        assert_eq!(grid.geometry().identity(), identity);
        assert!(grid.frame().patches.is_empty());
    }
}
