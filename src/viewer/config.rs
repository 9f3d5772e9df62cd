//! Grid configuration and the JSON input document.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

use super::VirtualGrid;
use crate::error::Result;
use crate::layout::{expand_all_keys, MeasuredList, RecordTree, DEFAULT_ITEM_HEIGHT, DEFAULT_OVERSCAN};
use crate::types::{json_key_field, Column, ColumnSpec, RowKey};

/// Viewport and data-shape settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GridConfig {
    /// Viewport width in pixels
    pub width: f32,
    /// Viewport height in pixels
    pub height: f32,
    /// Height assumed for rows that have not been measured
    pub item_height: f32,
    /// Rows materialized beyond each edge of the viewport
    pub overscan: usize,
    /// Field holding a record's child records
    pub children_field: String,
    /// Field holding a record's row key
    pub row_key_field: String,
    /// Field that marks a record as having expandable content; unset means
    /// no row renders an expanded sibling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expandable_field: Option<String>,
    /// Start with every parent record expanded
    pub default_expand_all: bool,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            item_height: DEFAULT_ITEM_HEIGHT,
            overscan: DEFAULT_OVERSCAN,
            children_field: "children".to_string(),
            row_key_field: "key".to_string(),
            expandable_field: None,
            default_expand_all: false,
        }
    }
}

impl GridConfig {
    /// Vertical window provider sized for this configuration.
    pub fn provider(&self) -> MeasuredList {
        MeasuredList::new(self.width, self.height, self.item_height).with_overscan(self.overscan)
    }
}

/// Complete grid description as loaded from JSON:
/// `{config, columns, data, expandedKeys}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GridInput {
    pub config: GridConfig,
    pub columns: Vec<ColumnSpec>,
    pub data: Vec<Value>,
    pub expanded_keys: Vec<RowKey>,
}

impl GridInput {
    /// Parse from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl VirtualGrid<Value> {
    /// Build a grid over JSON records.
    ///
    /// # Errors
    /// Fails on invalid columns or on missing or duplicate row keys.
    pub fn from_input(input: GridInput) -> Result<Self> {
        let GridInput {
            config,
            columns,
            data,
            expanded_keys,
        } = input;
        let tree = RecordTree::from_roots(data, &config.children_field);
        let columns: Vec<Column<Value>> = columns.into_iter().map(ColumnSpec::into_column).collect();

        let key_field = config.row_key_field.clone();
        let row_key = move |record: &Value, index: usize| json_key_field(&key_field)(record, index);

        let mut expanded: HashSet<RowKey> = expanded_keys.into_iter().collect();
        if config.default_expand_all {
            expanded.extend(expand_all_keys(&tree, &row_key)?);
        }

        let mut grid = Self::with_provider(tree, columns, row_key, config.provider())?;
        if let Some(field) = config.expandable_field {
            grid.set_row_expandable(move |record: &Value| {
                record.get(&field).is_some_and(|v| !v.is_null() && v != &Value::Bool(false))
            });
        }
        grid.set_expanded_keys(expanded)?;
        Ok(grid)
    }
}
