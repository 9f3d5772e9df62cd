//! Vertical windowing: the provider interface and a measured-height list.
//!
//! The grid only consumes [`VerticalWindowProvider`]. [`MeasuredList`] is
//! the reference implementation: per-row heights keyed by row key, prefix
//! sums for O(log n) offset lookups, and scroll clamping on both axes.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::{RowExtent, RowKey, VerticalWindow};

/// Default row height in pixels
pub const DEFAULT_ITEM_HEIGHT: f32 = 24.0;

/// Rows materialized beyond each edge of the viewport
pub const DEFAULT_OVERSCAN: usize = 2;

/// Where a scrolled-to row should land in the viewport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Top,
    Bottom,
    /// Scroll the minimum distance that brings the row fully into view
    #[default]
    Auto,
}

/// Imperative scroll request. Any combination of fields may be set; a row
/// target (`index` or `key`) wins over `top`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<RowKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<Align>,
}

impl ScrollConfig {
    pub fn left(left: f32) -> Self {
        Self {
            left: Some(left),
            ..Self::default()
        }
    }

    pub fn top(top: f32) -> Self {
        Self {
            top: Some(top),
            ..Self::default()
        }
    }

    pub fn index(index: usize, align: Align) -> Self {
        Self {
            index: Some(index),
            align: Some(align),
            ..Self::default()
        }
    }

    pub fn key(key: RowKey, align: Align) -> Self {
        Self {
            key: Some(key),
            align: Some(align),
            ..Self::default()
        }
    }
}

/// Current scroll offsets
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ScrollInfo {
    pub x: f32,
    pub y: f32,
}

/// Single-axis list virtualization as seen by the grid.
pub trait VerticalWindowProvider {
    /// Replace the item sequence. Measured heights survive for keys that
    /// are still present.
    fn set_keys(&mut self, keys: Vec<RowKey>);

    /// Currently materialized row range.
    fn window(&self) -> VerticalWindow;

    fn scroll_info(&self) -> ScrollInfo;

    fn scroll_to(&mut self, config: &ScrollConfig);

    fn scroll_by(&mut self, delta_x: f32, delta_y: f32) {
        let info = self.scroll_info();
        self.scroll_to(&ScrollConfig {
            top: Some(info.y + delta_y),
            left: Some(info.x + delta_x),
            ..ScrollConfig::default()
        });
    }

    /// Pixel extent of the row `start`, or of the range `start..=end`.
    ///
    /// Returns `None` if a key is not in the current sequence.
    fn size(&self, start: &RowKey, end: Option<&RowKey>) -> Option<RowExtent>;

    /// Record a measured row height. Returns true if the layout changed.
    fn measure(&mut self, key: &RowKey, height: f32) -> bool;

    fn resize(&mut self, width: f32, height: f32);

    /// Width of the horizontally scrollable content.
    fn set_scroll_width(&mut self, width: f32);

    fn viewport_width(&self) -> f32;

    fn viewport_height(&self) -> f32;

    fn total_height(&self) -> f32;

    fn default_item_height(&self) -> f32;
}

/// Measured-height list virtualizer
#[derive(Debug, Clone)]
pub struct MeasuredList {
    keys: Vec<RowKey>,
    index_of: HashMap<RowKey, usize>,
    measured: HashMap<RowKey, f32>,
    /// Cumulative row tops (`tops[i]` = y of row i's top edge), plus the final edge
    tops: Vec<f32>,
    item_height: f32,
    overscan: usize,
    /// Horizontal scroll position
    pub scroll_x: f32,
    /// Vertical scroll position
    pub scroll_y: f32,
    /// Viewport width in pixels
    pub width: f32,
    /// Viewport height in pixels
    pub height: f32,
    scroll_width: f32,
}

impl Default for MeasuredList {
    fn default() -> Self {
        Self::new(800.0, 600.0, DEFAULT_ITEM_HEIGHT)
    }
}

impl MeasuredList {
    pub fn new(width: f32, height: f32, item_height: f32) -> Self {
        Self {
            keys: Vec::new(),
            index_of: HashMap::new(),
            measured: HashMap::new(),
            tops: vec![0.0],
            item_height: if item_height > 0.0 {
                item_height
            } else {
                DEFAULT_ITEM_HEIGHT
            },
            overscan: DEFAULT_OVERSCAN,
            scroll_x: 0.0,
            scroll_y: 0.0,
            width,
            height,
            scroll_width: width,
        }
    }

    pub fn with_overscan(mut self, overscan: usize) -> Self {
        self.overscan = overscan;
        self
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    fn rebuild_tops(&mut self) {
        self.tops.clear();
        self.tops.reserve(self.keys.len() + 1);
        let mut y: f32 = 0.0;
        for key in &self.keys {
            self.tops.push(y);
            y += self.measured.get(key).copied().unwrap_or(self.item_height);
        }
        self.tops.push(y); // Final edge
    }

    pub fn row_top(&self, index: usize) -> f32 {
        self.tops.get(index).copied().unwrap_or_else(|| self.total_height())
    }

    pub fn row_bottom(&self, index: usize) -> f32 {
        self.row_top(index.saturating_add(1))
    }

    /// Find row at y position (binary search)
    pub fn row_at_y(&self, y: f32) -> Option<usize> {
        let last = self.keys.len().checked_sub(1)?;
        // Row tops are non-decreasing; rows of zero height collapse onto the next.
        let index = self.tops.partition_point(|&top| top <= y).saturating_sub(1);
        Some(index.min(last))
    }

    /// Clamp scroll position to valid range.
    pub fn clamp_scroll(&mut self) {
        let max_x = (self.scroll_width - self.width).max(0.0);
        let max_y = (self.total_height() - self.height).max(0.0);
        self.scroll_x = self.scroll_x.clamp(0.0, max_x);
        self.scroll_y = self.scroll_y.clamp(0.0, max_y);
    }

    fn align_to(&mut self, index: usize, align: Align) {
        let top = self.row_top(index);
        let bottom = self.row_bottom(index);
        self.scroll_y = match align {
            Align::Top => top,
            Align::Bottom => bottom - self.height,
            Align::Auto if top < self.scroll_y => top,
            Align::Auto if bottom > self.scroll_y + self.height => bottom - self.height,
            Align::Auto => self.scroll_y,
        };
    }
}

impl VerticalWindowProvider for MeasuredList {
    fn set_keys(&mut self, keys: Vec<RowKey>) {
        self.index_of = keys.iter().cloned().enumerate().map(|(i, k)| (k, i)).collect();
        let index_of = &self.index_of;
        self.measured.retain(|key, _| index_of.contains_key(key));
        self.keys = keys;
        self.rebuild_tops();
        self.clamp_scroll();
    }

    fn window(&self) -> VerticalWindow {
        let (Some(first), Some(last)) = (self.row_at_y(self.scroll_y), self.keys.len().checked_sub(1))
        else {
            return VerticalWindow::empty();
        };
        let bottom = self.row_at_y(self.scroll_y + self.height).unwrap_or(last);
        let start_index = first.saturating_sub(self.overscan);
        let end_index = bottom.saturating_add(self.overscan).min(last);
        VerticalWindow {
            start_index,
            end_index,
            offset_y: self.row_top(start_index),
            has_rows: true,
        }
    }

    fn scroll_info(&self) -> ScrollInfo {
        ScrollInfo {
            x: self.scroll_x,
            y: self.scroll_y,
        }
    }

    fn scroll_to(&mut self, config: &ScrollConfig) {
        if let Some(left) = config.left {
            self.scroll_x = left;
        }
        let target = config
            .index
            .or_else(|| config.key.as_ref().and_then(|k| self.index_of.get(k).copied()));
        match (target, config.top) {
            (Some(index), _) if index < self.keys.len() => {
                self.align_to(index, config.align.unwrap_or_default());
            }
            (_, Some(top)) => self.scroll_y = top,
            _ => {}
        }
        self.clamp_scroll();
    }

    fn size(&self, start: &RowKey, end: Option<&RowKey>) -> Option<RowExtent> {
        let first = *self.index_of.get(start)?;
        let last = match end {
            Some(key) => *self.index_of.get(key)?,
            None => first,
        };
        let (first, last) = (first.min(last), first.max(last));
        Some(RowExtent {
            top: self.row_top(first),
            bottom: self.row_bottom(last),
        })
    }

    fn measure(&mut self, key: &RowKey, height: f32) -> bool {
        if !height.is_finite() || height < 0.0 || !self.index_of.contains_key(key) {
            return false;
        }
        let previous = self.measured.insert(key.clone(), height);
        let changed = previous.map_or(true, |h| (h - height).abs() > f32::EPSILON);
        if changed {
            self.rebuild_tops();
            self.clamp_scroll();
        }
        changed
    }

    fn resize(&mut self, width: f32, height: f32) {
        self.width = width.max(0.0);
        self.height = height.max(0.0);
        self.clamp_scroll();
    }

    fn set_scroll_width(&mut self, width: f32) {
        self.scroll_width = width.max(0.0);
        self.clamp_scroll();
    }

    fn viewport_width(&self) -> f32 {
        self.width
    }

    fn viewport_height(&self) -> f32 {
        self.height
    }

    fn total_height(&self) -> f32 {
        self.tops.last().copied().unwrap_or(0.0)
    }

    fn default_item_height(&self) -> f32 {
        self.item_height
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

    fn list(rows: i64) -> MeasuredList {
        let mut list = MeasuredList::new(300.0, 100.0, 20.0).with_overscan(0);
        list.set_keys((0..rows).map(RowKey::Number).collect());
        list
    }

    #[test]
    fn test_initial_window() {
        let list = list(100);
        let window = list.window();
        assert_eq!(window.start_index, 0);
        assert_eq!(window.end_index, 5);
        assert_eq!(window.offset_y, 0.0);
        assert_eq!(list.total_height(), 2000.0);
    }

    #[test]
    fn test_row_at_y() {
        let list = list(10);
        assert_eq!(list.row_at_y(0.0), Some(0));
        assert_eq!(list.row_at_y(19.9), Some(0));
        assert_eq!(list.row_at_y(20.0), Some(1));
        assert_eq!(list.row_at_y(10_000.0), Some(9));
        assert_eq!(MeasuredList::default().row_at_y(0.0), None);
    }

    #[test]
    fn test_scroll_clamps() {
        let mut list = list(10);
        list.scroll_to(&ScrollConfig::top(5000.0));
        assert_eq!(list.scroll_info().y, 100.0);
        list.scroll_by(0.0, -500.0);
        assert_eq!(list.scroll_info().y, 0.0);
        list.set_scroll_width(1000.0);
        list.scroll_to(&ScrollConfig::left(900.0));
        assert_eq!(list.scroll_info().x, 700.0);
    }

    #[test]
    fn test_scroll_to_key_alignment() {
        let mut list = list(100);
        list.scroll_to(&ScrollConfig::key(RowKey::Number(50), Align::Top));
        assert_eq!(list.scroll_y, 1000.0);
        list.scroll_to(&ScrollConfig::index(60, Align::Bottom));
        assert_eq!(list.scroll_y, 1220.0 - 100.0);
        // Already visible: auto does not move.
        list.scroll_to(&ScrollConfig::index(58, Align::Auto));
        assert_eq!(list.scroll_y, 1120.0);
    }

    #[test]
    fn test_measure_shifts_following_rows() {
        let mut list = list(10);
        assert!(list.measure(&RowKey::Number(2), 50.0));
        assert!(!list.measure(&RowKey::Number(2), 50.0));
        assert_eq!(list.row_top(3), 90.0);
        let extent = list.size(&RowKey::Number(1), Some(&RowKey::Number(3))).unwrap();
        assert_eq!(extent.top, 20.0);
        assert_eq!(extent.bottom, 110.0);
        assert!(list.size(&RowKey::Number(99), None).is_none());
    }

    #[test]
    fn test_measured_heights_survive_reorder() {
        let mut list = list(5);
        list.measure(&RowKey::Number(4), 60.0);
        list.set_keys(vec![RowKey::Number(4), RowKey::Number(0)]);
        assert_eq!(list.row_bottom(0), 60.0);
        assert_eq!(list.total_height(), 80.0);
    }

    #[test]
    fn test_overscan_pads_window() {
        let mut list = MeasuredList::new(300.0, 100.0, 20.0).with_overscan(2);
        list.set_keys((0..100).map(RowKey::Number).collect());
        list.scroll_to(&ScrollConfig::top(400.0));
        let window = list.window();
        assert_eq!(window.start_index, 18);
        assert_eq!(window.end_index, 27);
        assert_eq!(window.offset_y, 360.0);
    }

    #[test]
    fn test_empty_list_window() {
        let list = MeasuredList::default();
        assert!(list.window().is_empty());
    }
}
