use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Stable, externally supplied row identifier.
///
/// Must be unique across the whole flattened sequence, not just within one
/// level of the tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowKey {
    Number(i64),
    Text(String),
}

impl RowKey {
    /// Read a key out of a JSON value. Numbers without an exact `i64`
    /// representation and non-scalar values yield `None`.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(Self::Number),
            Value::String(s) => Some(Self::Text(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<i64> for RowKey {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for RowKey {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for RowKey {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// A record that may carry nested child records.
///
/// Children are moved out of the record when it is placed in a
/// [`RecordTree`](crate::layout::RecordTree), so the arena owns every
/// record exactly once.
pub trait TreeRecord: Sized {
    /// Remove and return the children stored under `field`.
    ///
    /// Returns `None` when the record has no such field, or the field does
    /// not hold a child collection.
    fn take_children(&mut self, field: &str) -> Option<Vec<Self>>;
}

impl TreeRecord for Value {
    fn take_children(&mut self, field: &str) -> Option<Vec<Self>> {
        let object = self.as_object_mut()?;
        match object.remove(field)? {
            Value::Array(children) => Some(children),
            other => {
                // Not a child list; put it back untouched.
                object.insert(field.to_string(), other);
                None
            }
        }
    }
}

/// Build a row-key accessor that reads `field` from JSON object records.
pub fn json_key_field(field: &str) -> impl Fn(&Value, usize) -> Option<RowKey> + '_ {
    move |record, _| record.get(field).and_then(RowKey::from_json)
}
