//! Common test utilities: record and column builders shared by the
//! integration tests.
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

use serde_json::{json, Value};
use vgrid::layout::RecordTree;
use vgrid::{json_key_field, CellSpan, Column, FieldSpan, FixedSide, GridConfig, RowKey, VirtualGrid};

/// Row key read from the `key` field.
pub fn key_fn() -> impl Fn(&Value, usize) -> Option<RowKey> + Copy {
    |record: &Value, index: usize| json_key_field("key")(record, index)
}

/// 300×100 viewport, 20px rows, no overscan.
pub fn small_config() -> GridConfig {
    GridConfig {
        width: 300.0,
        height: 100.0,
        item_height: 20.0,
        overscan: 0,
        ..GridConfig::default()
    }
}

/// `A:100 (fixed left), B..D:150, E:150 (fixed right)`
pub fn scenario_columns() -> Vec<Column<Value>> {
    vec![
        Column::new("A", 100.0).fixed(FixedSide::Left),
        Column::new("B", 150.0),
        Column::new("C", 150.0),
        Column::new("D", 150.0),
        Column::new("E", 150.0).fixed(FixedSide::Right),
    ]
}

/// Scenario columns with B reading `rs`/`cs` span fields from each record.
pub fn spanning_columns() -> Vec<Column<Value>> {
    let mut columns = scenario_columns();
    columns[1] = Column::new("B", 150.0).with_span(FieldSpan {
        row_span_field: Some("rs".into()),
        col_span_field: Some("cs".into()),
    });
    columns
}

/// Scenario columns where B spans B..D on records marked `wide`.
pub fn wide_columns() -> Vec<Column<Value>> {
    scenario_columns()
        .into_iter()
        .enumerate()
        .map(|(i, column)| {
            column.with_span(move |record: &Value, _: usize| {
                let wide = record["wide"].as_bool().unwrap_or(false);
                match (wide, i) {
                    (true, 1) => CellSpan::new(1, 3),
                    (true, 2 | 3) => CellSpan::new(1, 0),
                    _ => CellSpan::SINGLE,
                }
            })
        })
        .collect()
}

/// Flat records keyed `0..rows`.
pub fn flat_records(rows: i64) -> Vec<Value> {
    (0..rows).map(|key| json!({"key": key})).collect()
}

/// Flat records with a row span of `span` anchored at `anchor`.
pub fn records_with_row_span(rows: i64, anchor: i64, span: i64) -> Vec<Value> {
    (0..rows)
        .map(|key| {
            let rs = if key == anchor {
                span
            } else if key > anchor && key < anchor + span {
                0
            } else {
                1
            };
            json!({"key": key, "rs": rs})
        })
        .collect()
}

pub fn grid(columns: Vec<Column<Value>>, records: Vec<Value>) -> VirtualGrid<Value> {
    VirtualGrid::new(
        RecordTree::from_roots(records, "children"),
        columns,
        key_fn(),
        &small_config(),
    )
    .unwrap()
}
