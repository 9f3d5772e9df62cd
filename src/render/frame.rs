//! Output of one recomputation pass.

use serde::Serialize;

use super::RowRender;
use crate::layout::{ColumnGeometry, HorizontalWindow};
use crate::span::SpanPatch;
use crate::types::{RowKey, VerticalWindow};

/// Translation applied to the row content container
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentTransform {
    pub translate_x: f32,
    pub translate_y: f32,
}

impl ContentTransform {
    pub fn new(geometry: &ColumnGeometry, horizontal: &HorizontalWindow, vertical: &VerticalWindow) -> Self {
        Self {
            translate_x: horizontal.translate_x(geometry),
            translate_y: vertical.offset_y,
        }
    }
}

/// Everything the embedding surface needs to draw the current viewport
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub vertical: VerticalWindow,
    pub horizontal: HorizontalWindow,
    pub rows: Vec<RowRender>,
    pub patches: Vec<SpanPatch>,
    pub transform: ContentTransform,
    /// Height of the whole sequence, for the scroll surface
    pub total_height: f32,
    /// Width of all columns, for the scroll surface
    pub scroll_width: f32,
}

impl Frame {
    pub fn row(&self, key: &RowKey) -> Option<&RowRender> {
        self.rows.iter().find(|r| &r.row_key == key)
    }

    pub fn patch(&self, key: &RowKey) -> Option<&SpanPatch> {
        self.patches.iter().find(|p| &p.row_key == key)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::types::FixedSide;

    #[test]
    fn test_transform_uses_window_offsets() {
        let geometry = ColumnGeometry::from_parts([
            ("a", 100.0, FixedSide::Left),
            ("b", 150.0, FixedSide::None),
            ("c", 150.0, FixedSide::None),
        ])
        .unwrap();
        let horizontal = HorizontalWindow {
            left_index: 2,
            right_index: 2,
            total_fixed_width_before_left: 100.0,
            offset_x: 260.0,
            has_columns: true,
        };
        let vertical = VerticalWindow {
            start_index: 3,
            end_index: 9,
            offset_y: 72.0,
            has_rows: true,
        };
        let transform = ContentTransform::new(&geometry, &horizontal, &vertical);
        assert_eq!(transform.translate_x, 250.0 - 260.0 - 100.0);
        assert_eq!(transform.translate_y, 72.0);
    }

    #[test]
    fn test_frame_serializes_camel_case() {
        let json = serde_json::to_value(Frame::default()).unwrap();
        assert!(json.get("totalHeight").is_some());
        assert!(json.get("scrollWidth").is_some());
        assert!(json["transform"].get("translateX").is_some());
    }
}
