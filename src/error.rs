//! Structured error types for vgrid.
//!
//! Only configuration errors surface here. Span data that claims coverage
//! past the sequence or column bounds is clamped during reconciliation and
//! never becomes an error.

use crate::types::RowKey;

/// All errors that can occur while building or driving a grid.
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    /// A record has no row key.
    #[error("record at sequence index {sequence_index} has no row key")]
    MissingRowKey { sequence_index: usize },

    /// Two records in the flattened sequence share a row key.
    #[error("duplicate row key {key} at sequence indices {first} and {second}")]
    DuplicateRowKey {
        key: RowKey,
        first: usize,
        second: usize,
    },

    /// A record is reachable from itself through child links.
    #[error("record {record} is part of a parent/child cycle")]
    CyclicRecord { record: usize },

    /// A child link points outside the record arena or a record has two parents.
    #[error("invalid record link: {0}")]
    InvalidLink(String),

    /// Column width is zero, negative or not finite.
    #[error("column {key:?} has invalid width {width}")]
    InvalidColumnWidth { key: String, width: f32 },

    /// Two columns share a key.
    #[error("duplicate column key {0:?}")]
    DuplicateColumnKey(String),

    /// A row key referenced by an operation is not in the flattened sequence.
    #[error("unknown row key {0}")]
    UnknownRowKey(RowKey),

    /// JSON (de)serialization error.
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GridError>;

#[cfg(target_arch = "wasm32")]
impl From<GridError> for wasm_bindgen::JsValue {
    fn from(e: GridError) -> Self {
        wasm_bindgen::JsValue::from_str(&e.to_string())
    }
}
