//! Pre-computed horizontal layout for a column list.
//!
//! Computed once per column-list identity; offset lookups are O(log n)
//! binary searches over the cumulative right edges.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};

use crate::error::{GridError, Result};
use crate::types::{Column, FixedSide};

/// Cumulative offsets and fixed/scrollable partitions of a column list
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnGeometry {
    /// Column keys in display order
    keys: Vec<String>,
    /// Column widths
    widths: Vec<f32>,
    /// Cumulative right edges (`right_edges[i]` = x of column i's right edge)
    right_edges: Vec<f32>,
    sides: Vec<FixedSide>,
    /// Original indices of left-fixed columns, in order
    fixed_left: Vec<usize>,
    /// Original indices of right-fixed columns, in order
    fixed_right: Vec<usize>,
    /// Original indices of scrolling columns, in order
    scrollable: Vec<usize>,
    /// Sticky inset of each fixed column from its pinned edge (0 for scrolling columns)
    sticky: Vec<f32>,
    identity: u64,
}

impl ColumnGeometry {
    /// Build geometry for `columns`.
    ///
    /// # Errors
    /// Returns [`GridError::InvalidColumnWidth`] for a zero, negative or
    /// non-finite width and [`GridError::DuplicateColumnKey`] for a repeated key.
    pub fn new<R>(columns: &[Column<R>]) -> Result<Self> {
        Self::from_parts(columns.iter().map(|c| (c.key.as_str(), c.width, c.fixed)))
    }

    /// Build geometry from `(key, width, fixed side)` triples.
    ///
    /// # Errors
    /// Same as [`ColumnGeometry::new`].
    pub fn from_parts<'a>(parts: impl IntoIterator<Item = (&'a str, f32, FixedSide)>) -> Result<Self> {
        let mut keys = Vec::new();
        let mut widths = Vec::new();
        let mut right_edges = Vec::new();
        let mut sides = Vec::new();
        let mut seen = HashSet::new();
        let mut hasher = DefaultHasher::new();
        let mut x: f32 = 0.0;

        for (key, width, side) in parts {
            if !width.is_finite() || width <= 0.0 {
                return Err(GridError::InvalidColumnWidth {
                    key: key.to_string(),
                    width,
                });
            }
            if !seen.insert(key) {
                return Err(GridError::DuplicateColumnKey(key.to_string()));
            }
            key.hash(&mut hasher);
            width.to_bits().hash(&mut hasher);
            side.hash(&mut hasher);

            x += width;
            keys.push(key.to_string());
            widths.push(width);
            right_edges.push(x);
            sides.push(side);
        }

        let mut fixed_left = Vec::new();
        let mut fixed_right = Vec::new();
        let mut scrollable = Vec::new();
        for (i, side) in sides.iter().enumerate() {
            match side {
                FixedSide::Left => fixed_left.push(i),
                FixedSide::Right => fixed_right.push(i),
                FixedSide::None => scrollable.push(i),
            }
        }

        let mut sticky = vec![0.0; keys.len()];
        let mut inset = 0.0;
        for &i in &fixed_left {
            if let Some(s) = sticky.get_mut(i) {
                *s = inset;
            }
            inset += widths.get(i).copied().unwrap_or(0.0);
        }
        let mut inset = 0.0;
        for &i in fixed_right.iter().rev() {
            if let Some(s) = sticky.get_mut(i) {
                *s = inset;
            }
            inset += widths.get(i).copied().unwrap_or(0.0);
        }

        Ok(Self {
            keys,
            widths,
            right_edges,
            sides,
            fixed_left,
            fixed_right,
            scrollable,
            sticky,
            identity: hasher.finish(),
        })
    }

    pub fn len(&self) -> usize {
        self.widths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widths.is_empty()
    }

    /// Content hash over keys, widths and fixed sides.
    ///
    /// Two column lists with the same identity produce the same geometry.
    pub fn identity(&self) -> u64 {
        self.identity
    }

    pub fn key(&self, index: usize) -> Option<&str> {
        self.keys.get(index).map(String::as_str)
    }

    pub fn side(&self, index: usize) -> FixedSide {
        self.sides.get(index).copied().unwrap_or_default()
    }

    /// Cumulative right edges, one per column
    pub fn right_edges(&self) -> &[f32] {
        &self.right_edges
    }

    pub fn width(&self, index: usize) -> f32 {
        self.widths.get(index).copied().unwrap_or(0.0)
    }

    pub fn left_edge(&self, index: usize) -> f32 {
        match index.checked_sub(1) {
            Some(prev) => self.right_edge(prev),
            None => 0.0,
        }
    }

    pub fn right_edge(&self, index: usize) -> f32 {
        self.right_edges
            .get(index)
            .copied()
            .unwrap_or_else(|| self.total_width())
    }

    /// Visual width of a cell at `index` spanning `col_span` columns.
    ///
    /// A span of 0 (covered cell) keeps its own column width; spans running
    /// past the last column are clamped.
    pub fn span_width(&self, index: usize, col_span: u32) -> f32 {
        let extra = usize::try_from(col_span.max(1) - 1).unwrap_or(usize::MAX);
        let last = index.saturating_add(extra).min(self.len().saturating_sub(1));
        (self.right_edge(last) - self.left_edge(index)).max(0.0)
    }

    pub fn total_width(&self) -> f32 {
        self.right_edges.last().copied().unwrap_or(0.0)
    }

    /// First column whose right edge reaches `x` (binary search).
    ///
    /// Returns `None` when `x` lies beyond the last column.
    pub fn first_reaching(&self, x: f32) -> Option<usize> {
        let index = self.right_edges.partition_point(|&edge| edge < x);
        (index < self.right_edges.len()).then_some(index)
    }

    /// Column under horizontal position `x` (binary search).
    pub fn column_at(&self, x: f32) -> Option<usize> {
        if x < 0.0 {
            return None;
        }
        let index = self.right_edges.partition_point(|&edge| edge <= x);
        (index < self.right_edges.len()).then_some(index)
    }

    pub fn fixed_left(&self) -> &[usize] {
        &self.fixed_left
    }

    pub fn fixed_right(&self) -> &[usize] {
        &self.fixed_right
    }

    pub fn scrollable(&self) -> &[usize] {
        &self.scrollable
    }

    pub fn has_fixed(&self) -> bool {
        !self.fixed_left.is_empty() || !self.fixed_right.is_empty()
    }

    /// Sticky inset from the pinned edge: for a left-fixed column the width
    /// of the left-fixed columns before it, for a right-fixed column the
    /// width of the right-fixed columns after it.
    pub fn sticky_inset(&self, index: usize) -> f32 {
        self.sticky.get(index).copied().unwrap_or(0.0)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;

    fn scenario() -> ColumnGeometry {
        ColumnGeometry::from_parts([
            ("A", 100.0, FixedSide::Left),
            ("B", 150.0, FixedSide::None),
            ("C", 150.0, FixedSide::None),
            ("D", 150.0, FixedSide::None),
            ("E", 150.0, FixedSide::Right),
        ])
        .unwrap()
    }

    #[test]
    fn test_cumulative_offsets() {
        let geometry = scenario();
        assert_eq!(geometry.right_edges(), &[100.0, 250.0, 400.0, 550.0, 700.0]);
        assert_eq!(geometry.total_width(), 700.0);
        assert_eq!(geometry.left_edge(0), 0.0);
        assert_eq!(geometry.left_edge(3), 400.0);
    }

    #[test]
    fn test_partitions() {
        let geometry = scenario();
        assert_eq!(geometry.fixed_left(), &[0]);
        assert_eq!(geometry.fixed_right(), &[4]);
        assert_eq!(geometry.scrollable(), &[1, 2, 3]);
        assert!(geometry.has_fixed());
    }

    #[test]
    fn test_first_reaching() {
        let geometry = scenario();
        assert_eq!(geometry.first_reaching(0.0), Some(0));
        assert_eq!(geometry.first_reaching(100.0), Some(0));
        assert_eq!(geometry.first_reaching(100.5), Some(1));
        assert_eq!(geometry.first_reaching(380.0), Some(2));
        assert_eq!(geometry.first_reaching(701.0), None);
    }

    #[test]
    fn test_column_at() {
        let geometry = scenario();
        assert_eq!(geometry.column_at(0.0), Some(0));
        assert_eq!(geometry.column_at(99.0), Some(0));
        assert_eq!(geometry.column_at(100.0), Some(1));
        assert_eq!(geometry.column_at(699.0), Some(4));
        assert_eq!(geometry.column_at(700.0), None);
        assert_eq!(geometry.column_at(-1.0), None);
    }

    #[test]
    fn test_span_width_clamps() {
        let geometry = scenario();
        assert_eq!(geometry.span_width(1, 1), 150.0);
        assert_eq!(geometry.span_width(1, 2), 300.0);
        assert_eq!(geometry.span_width(1, 0), 150.0);
        // Runs past the last column.
        assert_eq!(geometry.span_width(3, 10), 300.0);
    }

    #[test]
    fn test_sticky_insets() {
        let geometry = ColumnGeometry::from_parts([
            ("a", 40.0, FixedSide::Left),
            ("b", 60.0, FixedSide::Left),
            ("c", 100.0, FixedSide::None),
            ("d", 30.0, FixedSide::Right),
            ("e", 20.0, FixedSide::Right),
        ])
        .unwrap();
        assert_eq!(geometry.sticky_inset(0), 0.0);
        assert_eq!(geometry.sticky_inset(1), 40.0);
        assert_eq!(geometry.sticky_inset(2), 0.0);
        assert_eq!(geometry.sticky_inset(3), 20.0);
        assert_eq!(geometry.sticky_inset(4), 0.0);
    }

    #[test]
    fn test_rejects_bad_widths() {
        for width in [0.0, -5.0, f32::NAN, f32::INFINITY] {
            let err = ColumnGeometry::from_parts([("a", width, FixedSide::None)]).unwrap_err();
            assert!(matches!(err, GridError::InvalidColumnWidth { .. }));
        }
    }

    #[test]
    fn test_rejects_duplicate_keys() {
        let err = ColumnGeometry::from_parts([
            ("a", 10.0, FixedSide::None),
            ("a", 10.0, FixedSide::None),
        ])
        .unwrap_err();
        assert!(matches!(err, GridError::DuplicateColumnKey(k) if k == "a"));
    }

    #[test]
    fn test_identity_tracks_content() {
        let a = scenario();
        let b = scenario();
        assert_eq!(a.identity(), b.identity());
        let c = ColumnGeometry::from_parts([("A", 101.0, FixedSide::Left)]).unwrap();
        assert_ne!(a.identity(), c.identity());
    }

    #[test]
    fn test_empty_geometry() {
        let geometry = ColumnGeometry::from_parts([]).unwrap();
        assert!(geometry.is_empty());
        assert_eq!(geometry.total_width(), 0.0);
        assert_eq!(geometry.first_reaching(0.0), None);
    }
}
