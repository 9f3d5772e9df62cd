//! Browser embedding of [`VirtualGrid`] over JSON records.
//!
//! The scroll container is the native surface: its `scroll` events drive
//! the grid, and the host draws from `frame()` inside its render callback.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use js_sys::{Function, Object, Reflect};
use serde_json::Value;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::HtmlElement;

use super::{GridInput, ScrollControl, ScrollNotice, VirtualGrid};
use crate::layout::{RecordTree, ScrollConfig};
use crate::types::RowKey;

fn read_f64(element: &HtmlElement, property: &str) -> f64 {
    Reflect::get(element.as_ref(), &JsValue::from_str(property))
        .ok()
        .and_then(|value| value.as_f64())
        .unwrap_or(0.0)
}

fn write_f64(element: &HtmlElement, property: &str, value: f64) {
    let _ = Reflect::set(element.as_ref(), &JsValue::from_str(property), &JsValue::from_f64(value));
}

struct SharedState {
    grid: VirtualGrid<Value>,
    children_field: String,
    on_scroll: Option<Function>,
    render_callback: Option<Function>,
}

/// JS-facing grid handle.
#[wasm_bindgen]
pub struct GridView {
    state: Rc<RefCell<SharedState>>,
    element: HtmlElement,
    /// Set by the grid's scroll listener, drained once the state borrow is released
    pending: Rc<Cell<Option<ScrollNotice>>>,
    _scroll_listener: Closure<dyn FnMut()>,
}

#[wasm_bindgen]
impl GridView {
    /// Attach a grid to `element`, its scroll container.
    ///
    /// `input` has the shape `{config, columns, data, expandedKeys}`.
    #[wasm_bindgen(constructor)]
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(element: HtmlElement, input: JsValue) -> Result<GridView, JsValue> {
        console_error_panic_hook::set_once();
        let input: GridInput = serde_wasm_bindgen::from_value(input)?;
        let children_field = input.config.children_field.clone();
        let mut grid = VirtualGrid::from_input(input)?;

        let pending: Rc<Cell<Option<ScrollNotice>>> = Rc::default();
        let sink = Rc::clone(&pending);
        grid.on_scroll(move |notice| sink.set(Some(*notice)));

        let state = Rc::new(RefCell::new(SharedState {
            grid,
            children_field,
            on_scroll: None,
            render_callback: None,
        }));

        let listener = {
            let state = Rc::clone(&state);
            let pending = Rc::clone(&pending);
            let target = element.clone();
            Closure::wrap(Box::new(move || {
                let config = ScrollConfig {
                    left: Some(read_f64(&target, "scrollLeft") as f32),
                    top: Some(read_f64(&target, "scrollTop") as f32),
                    ..ScrollConfig::default()
                };
                if let Ok(mut s) = state.try_borrow_mut() {
                    s.grid.scroll_to(&config);
                }
                Self::dispatch(&state, &pending, &target);
            }) as Box<dyn FnMut()>)
        };
        element
            .add_event_listener_with_callback("scroll", listener.as_ref().unchecked_ref())
            .ok();

        Ok(GridView {
            state,
            element,
            pending,
            _scroll_listener: listener,
        })
    }

    /// Current horizontal offset.
    #[wasm_bindgen(getter, js_name = scrollLeft)]
    pub fn scroll_left(&self) -> f32 {
        self.state.borrow().grid.scroll_left()
    }

    #[wasm_bindgen(setter, js_name = scrollLeft)]
    pub fn set_scroll_left(&self, left: f32) {
        self.state.borrow_mut().grid.set_scroll_left(left);
        self.sync_element();
        self.flush();
    }

    /// Scroll to `{index?, key?, top?, left?, align?}`.
    #[wasm_bindgen(js_name = scrollTo)]
    pub fn scroll_to(&self, config: JsValue) -> Result<(), JsValue> {
        let config: ScrollConfig = serde_wasm_bindgen::from_value(config)?;
        self.state.borrow_mut().grid.scroll_to(&config);
        self.sync_element();
        self.flush();
        Ok(())
    }

    /// The native scroll container.
    #[wasm_bindgen(getter, js_name = nativeElement)]
    pub fn native_element(&self) -> HtmlElement {
        self.element.clone()
    }

    #[wasm_bindgen(setter, js_name = onScroll)]
    pub fn set_on_scroll(&self, callback: Option<Function>) {
        self.state.borrow_mut().on_scroll = callback;
    }

    /// Register a JS callback to request a render on the next animation frame.
    #[wasm_bindgen(js_name = setRenderCallback)]
    pub fn set_render_callback(&self, callback: Option<Function>) {
        self.state.borrow_mut().render_callback = callback;
    }

    /// Latest frame as a plain JS object.
    pub fn frame(&self) -> Result<JsValue, JsValue> {
        Ok(serde_wasm_bindgen::to_value(self.state.borrow().grid.frame())?)
    }

    pub fn resize(&self, width: f32, height: f32) {
        self.state.borrow_mut().grid.resize(width, height);
        self.flush();
    }

    #[wasm_bindgen(js_name = measureRow)]
    pub fn measure_row(&self, key: JsValue, height: f32) -> Result<(), JsValue> {
        let key: RowKey = serde_wasm_bindgen::from_value(key)?;
        self.state.borrow_mut().grid.measure_row(&key, height);
        self.flush();
        Ok(())
    }

    /// Returns whether the row is now expanded.
    #[wasm_bindgen(js_name = toggleExpanded)]
    pub fn toggle_expanded(&self, key: JsValue) -> Result<bool, JsValue> {
        let key: RowKey = serde_wasm_bindgen::from_value(key)?;
        let expanded = self.state.borrow_mut().grid.toggle_expanded(&key)?;
        self.flush();
        Ok(expanded)
    }

    #[wasm_bindgen(js_name = setData)]
    pub fn set_data(&self, data: JsValue) -> Result<(), JsValue> {
        let data: Vec<Value> = serde_wasm_bindgen::from_value(data)?;
        {
            let mut s = self.state.borrow_mut();
            let tree = RecordTree::from_roots(data, &s.children_field);
            s.grid.set_data(tree)?;
        }
        self.flush();
        Ok(())
    }

    /// Mirror the grid's clamped offsets onto the container.
    fn sync_element(&self) {
        let info = self.state.borrow().grid.scroll_info();
        write_f64(&self.element, "scrollLeft", f64::from(info.x));
        write_f64(&self.element, "scrollTop", f64::from(info.y));
    }

    fn flush(&self) {
        Self::dispatch(&self.state, &self.pending, &self.element);
    }

    /// Deliver a pending scroll notice and request a render. Callbacks run
    /// with no borrow held so they may call back into the view.
    fn dispatch(state: &Rc<RefCell<SharedState>>, pending: &Cell<Option<ScrollNotice>>, target: &HtmlElement) {
        let (on_scroll, render_callback) = {
            let s = state.borrow();
            (s.on_scroll.clone(), s.render_callback.clone())
        };
        if let (Some(notice), Some(callback)) = (pending.take(), on_scroll) {
            let event = Object::new();
            let _ = Reflect::set(&event, &"currentTarget".into(), target.as_ref());
            let _ = Reflect::set(&event, &"scrollLeft".into(), &JsValue::from_f64(f64::from(notice.scroll_left)));
            let _ = Reflect::set(&event, &"scrollTop".into(), &JsValue::from_f64(f64::from(notice.scroll_top)));
            let _ = callback.call1(&JsValue::NULL, &event);
        }
        if let Some(callback) = render_callback {
            let _ = callback.call0(&JsValue::NULL);
        }
    }
}
