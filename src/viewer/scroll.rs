//! Scroll-related logic for `VirtualGrid`.
//!
//! Includes the scroll-control handle exposed to the embedding application
//! and change notification for the `on_scroll` listener.

use serde::Serialize;

use super::VirtualGrid;
use crate::layout::{ScrollConfig, ScrollInfo, VerticalWindowProvider};

/// Payload of the scroll listener, mirroring a native scroll event
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollNotice {
    pub scroll_left: f32,
    pub scroll_top: f32,
}

/// Imperative scroll handle.
pub trait ScrollControl {
    /// Current horizontal offset.
    fn scroll_left(&self) -> f32;

    fn set_scroll_left(&mut self, left: f32);

    fn scroll_to(&mut self, config: &ScrollConfig);
}

impl<R, P: VerticalWindowProvider> VirtualGrid<R, P> {
    /// Scroll by delta amounts.
    pub fn scroll_by(&mut self, delta_x: f32, delta_y: f32) {
        let before = self.provider.scroll_info();
        self.provider.scroll_by(delta_x, delta_y);
        self.after_scroll(before);
    }

    pub fn scroll_info(&self) -> ScrollInfo {
        self.provider.scroll_info()
    }

    /// Recompute if either offset moved, then notify.
    fn after_scroll(&mut self, before: ScrollInfo) {
        let after = self.provider.scroll_info();
        if moved(before, after) {
            self.recompute();
            self.notify(after);
        } else if self.provider.window() != self.frame.vertical {
            // Scroll request that only changed the materialized range
            self.recompute();
        }
    }

    pub(super) fn notify_if_moved(&mut self, before: ScrollInfo) {
        let after = self.provider.scroll_info();
        if moved(before, after) {
            self.notify(after);
        }
    }

    fn notify(&mut self, info: ScrollInfo) {
        tracing::trace!(x = info.x, y = info.y, "scroll");
        if let Some(listener) = self.on_scroll.as_mut() {
            listener(&ScrollNotice {
                scroll_left: info.x,
                scroll_top: info.y,
            });
        }
    }
}

fn moved(before: ScrollInfo, after: ScrollInfo) -> bool {
    (after.x - before.x).abs() > f32::EPSILON || (after.y - before.y).abs() > f32::EPSILON
}

impl<R, P: VerticalWindowProvider> ScrollControl for VirtualGrid<R, P> {
    fn scroll_left(&self) -> f32 {
        self.provider.scroll_info().x
    }

    fn set_scroll_left(&mut self, left: f32) {
        let before = self.provider.scroll_info();
        self.provider.scroll_to(&ScrollConfig::left(left));
        self.after_scroll(before);
    }

    fn scroll_to(&mut self, config: &ScrollConfig) {
        let before = self.provider.scroll_info();
        self.provider.scroll_to(config);
        self.after_scroll(before);
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
    use crate::layout::{Align, RecordTree};
    use crate::types::{json_key_field, Column, FixedSide, RowKey};
    use crate::viewer::GridConfig;
    use serde_json::{json, Value};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn grid(rows: i64) -> VirtualGrid<Value> {
        let columns = vec![
            Column::new("A", 100.0).fixed(FixedSide::Left),
            Column::new("B", 150.0),
            Column::new("C", 150.0),
            Column::new("D", 150.0),
            Column::new("E", 150.0).fixed(FixedSide::Right),
        ];
        let config = GridConfig {
            width: 300.0,
            height: 100.0,
            item_height: 20.0,
            overscan: 0,
            ..GridConfig::default()
        };
        let tree = RecordTree::from_flat((0..rows).map(|k| json!({"key": k})).collect());
        VirtualGrid::new(tree, columns, |r: &Value, i| json_key_field("key")(r, i), &config).unwrap()
    }

    #[test]
    fn test_set_scroll_left_recomputes_horizontal_window() {
        let mut grid = grid(10);
        assert_eq!(grid.frame().horizontal.left_index, 0);
        grid.set_scroll_left(260.0);
        assert_eq!(grid.scroll_left(), 260.0);
        assert_eq!(grid.frame().horizontal.left_index, 2);
        assert_eq!(grid.frame().transform.translate_x, 250.0 - 260.0 - 100.0);
    }

    #[test]
    fn test_scroll_left_clamps_to_content() {
        let mut grid = grid(10);
        grid.set_scroll_left(5000.0);
        assert_eq!(grid.scroll_left(), 400.0);
        grid.set_scroll_left(-20.0);
        assert_eq!(grid.scroll_left(), 0.0);
    }

    #[test]
    fn test_listener_fires_only_on_movement() {
        let mut grid = grid(100);
        let notices: Rc<RefCell<Vec<ScrollNotice>>> = Rc::default();
        let sink = Rc::clone(&notices);
        grid.on_scroll(move |n| sink.borrow_mut().push(*n));

        grid.scroll_by(0.0, 40.0);
        grid.scroll_by(0.0, 0.0);
        grid.scroll_by(-10.0, 0.0);
        grid.set_scroll_left(30.0);

        let notices = notices.borrow();
        assert_eq!(
            *notices,
            vec![
                ScrollNotice {
                    scroll_left: 0.0,
                    scroll_top: 40.0
                },
                ScrollNotice {
                    scroll_left: 30.0,
                    scroll_top: 40.0
                },
            ]
        );
    }

    #[test]
    fn test_scroll_to_key_moves_vertical_window() {
        let mut grid = grid(100);
        grid.scroll_to(&ScrollConfig::key(RowKey::Number(50), Align::Top));
        let frame = grid.frame();
        assert_eq!(frame.vertical.start_index, 50);
        assert_eq!(frame.transform.translate_y, 1000.0);
        assert_eq!(frame.rows[0].top, 0.0);
        assert_eq!(frame.rows[1].top, 20.0);
    }
}
