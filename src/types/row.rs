use super::RowKey;
use serde::Serialize;

/// One entry of the flattened sequence.
///
/// `record` is the record's id in the [`RecordTree`](crate::layout::RecordTree)
/// arena; `sequence_index` is the coordinate used by all windowing math.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlattenedRow {
    pub record: usize,
    pub row_key: RowKey,
    pub sequence_index: usize,
    /// Depth in the tree (0 for roots)
    pub indent: usize,
    /// Position among the record's siblings
    pub sibling_index: usize,
}

/// Inclusive row range currently materialized by the vertical window
/// provider, plus the pixel offset of its first row.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerticalWindow {
    pub start_index: usize,
    pub end_index: usize,
    pub offset_y: f32,
    /// False when the sequence is empty and no row is materialized
    pub has_rows: bool,
}

impl VerticalWindow {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Iterate the materialized row indices.
    pub fn indices(&self) -> impl Iterator<Item = usize> {
        let end = if self.has_rows {
            self.end_index.saturating_add(1)
        } else {
            self.start_index
        };
        self.start_index..end
    }

    pub fn len(&self) -> usize {
        if self.has_rows {
            self.end_index.saturating_sub(self.start_index) + 1
        } else {
            0
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.has_rows
    }

    pub fn contains(&self, index: usize) -> bool {
        self.has_rows && (self.start_index..=self.end_index).contains(&index)
    }
}

/// Pixel extent of a row or contiguous row range
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct RowExtent {
    pub top: f32,
    pub bottom: f32,
}

impl RowExtent {
    pub fn height(&self) -> f32 {
        (self.bottom - self.top).max(0.0)
    }
}
