use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Which edge a column is pinned to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FixedSide {
    /// Scrolls with the content (default)
    #[default]
    None,
    /// Pinned to the left edge
    Left,
    /// Pinned to the right edge
    Right,
}

impl FixedSide {
    pub fn is_fixed(self) -> bool {
        self != Self::None
    }
}

/// Row and column span of a single cell.
///
/// A span of 0 means the cell is covered by an earlier spanning cell and is
/// not drawn directly. 1 is the default; larger values cover following
/// rows or columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellSpan {
    pub row_span: u32,
    pub col_span: u32,
}

impl Default for CellSpan {
    fn default() -> Self {
        Self::SINGLE
    }
}

impl CellSpan {
    /// An ordinary, unspanned cell.
    pub const SINGLE: Self = Self {
        row_span: 1,
        col_span: 1,
    };

    pub fn new(row_span: u32, col_span: u32) -> Self {
        Self { row_span, col_span }
    }

    /// True if an earlier spanning cell covers this one.
    pub fn is_covered(self) -> bool {
        self.row_span == 0 || self.col_span == 0
    }

    /// True if the cell extends over following rows.
    pub fn is_row_anchor(self) -> bool {
        self.row_span > 1
    }
}

/// Per-column span capability.
///
/// Resolvers receive the record and its sequence index in the flattened
/// sequence.
pub trait SpanResolver<R> {
    fn span(&self, record: &R, index: usize) -> CellSpan;
}

impl<R, F> SpanResolver<R> for F
where
    F: Fn(&R, usize) -> CellSpan,
{
    fn span(&self, record: &R, index: usize) -> CellSpan {
        self(record, index)
    }
}

/// Resolves spans from numeric fields of JSON object records.
///
/// A missing or non-numeric field falls back to 1.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSpan {
    pub row_span_field: Option<String>,
    pub col_span_field: Option<String>,
}

impl FieldSpan {
    fn read(record: &Value, field: Option<&str>) -> u32 {
        field
            .and_then(|f| record.get(f))
            .and_then(Value::as_u64)
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(1)
    }
}

impl SpanResolver<Value> for FieldSpan {
    fn span(&self, record: &Value, _index: usize) -> CellSpan {
        CellSpan {
            row_span: Self::read(record, self.row_span_field.as_deref()),
            col_span: Self::read(record, self.col_span_field.as_deref()),
        }
    }
}

/// A column definition
pub struct Column<R> {
    pub key: String,
    /// Width in pixels (must be positive and finite)
    pub width: f32,
    pub fixed: FixedSide,
    span: Option<Box<dyn SpanResolver<R>>>,
}

impl<R> Column<R> {
    pub fn new(key: impl Into<String>, width: f32) -> Self {
        Self {
            key: key.into(),
            width,
            fixed: FixedSide::None,
            span: None,
        }
    }

    pub fn fixed(mut self, side: FixedSide) -> Self {
        self.fixed = side;
        self
    }

    pub fn with_span(mut self, resolver: impl SpanResolver<R> + 'static) -> Self {
        self.span = Some(Box::new(resolver));
        self
    }

    /// Span of this column's cell for `record` at sequence index `index`.
    pub fn span(&self, record: &R, index: usize) -> CellSpan {
        self.span
            .as_ref()
            .map_or(CellSpan::SINGLE, |resolver| resolver.span(record, index))
    }

    pub fn has_span_resolver(&self) -> bool {
        self.span.is_some()
    }
}

impl<R> fmt::Debug for Column<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("key", &self.key)
            .field("width", &self.width)
            .field("fixed", &self.fixed)
            .field("span", &self.span.is_some())
            .finish()
    }
}

/// Serializable column configuration for JSON-backed grids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSpec {
    pub key: String,
    pub width: f32,
    #[serde(default)]
    pub fixed: FixedSide,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_span_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub col_span_field: Option<String>,
}

impl ColumnSpec {
    pub fn into_column(self) -> Column<Value> {
        let column = Column::new(self.key, self.width).fixed(self.fixed);
        if self.row_span_field.is_none() && self.col_span_field.is_none() {
            return column;
        }
        column.with_span(FieldSpan {
            row_span_field: self.row_span_field,
            col_span_field: self.col_span_field,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_span_without_resolver() {
        let column: Column<Value> = Column::new("a", 100.0);
        assert_eq!(column.span(&json!({}), 0), CellSpan::SINGLE);
    }

    #[test]
    fn test_closure_resolver() {
        let column: Column<u32> = Column::new("a", 100.0)
            .with_span(|record: &u32, _index: usize| CellSpan::new(*record, 1));
        assert_eq!(column.span(&3, 0).row_span, 3);
        assert!(column.span(&0, 0).is_covered());
    }

    #[test]
    fn test_column_spec_field_spans() {
        let spec: ColumnSpec = serde_json::from_value(json!({
            "key": "name",
            "width": 120,
            "fixed": "left",
            "rowSpanField": "rs"
        }))
        .unwrap();
        assert_eq!(spec.fixed, FixedSide::Left);
        let column = spec.into_column();
        assert!(column.has_span_resolver());
        assert_eq!(column.span(&json!({"rs": 2}), 0), CellSpan::new(2, 1));
        assert_eq!(column.span(&json!({"rs": "x"}), 0), CellSpan::SINGLE);
    }

    #[test]
    fn test_fixed_side_defaults_to_none() {
        let spec: ColumnSpec = serde_json::from_value(json!({"key": "a", "width": 10})).unwrap();
        assert_eq!(spec.fixed, FixedSide::None);
        assert!(!spec.into_column().has_span_resolver());
    }
}
