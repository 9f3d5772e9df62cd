//! Benchmarks for per-event recomputation cost.
//!
//! Run with: cargo bench
//!
//! Results are saved to `target/criterion/` with HTML reports.
#![allow(clippy::expect_used, clippy::cast_possible_truncation, clippy::cast_precision_loss)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::{json, Value};
use std::collections::HashSet;
use vgrid::layout::{expand_all_keys, flatten, RecordTree, ScrollConfig};
use vgrid::{json_key_field, Column, FieldSpan, FixedSide, GridConfig, ScrollControl, VirtualGrid};

fn columns(count: usize) -> Vec<Column<Value>> {
    (0..count)
        .map(|i| {
            let column = Column::new(format!("c{i}"), 80.0 + (i % 5) as f32 * 20.0);
            match i {
                0 => column.fixed(FixedSide::Left),
                i if i == count - 1 => column.fixed(FixedSide::Right),
                1 => column.with_span(FieldSpan {
                    row_span_field: Some("rs".into()),
                    col_span_field: None,
                }),
                _ => column,
            }
        })
        .collect()
}

/// Flat records; every tenth anchors a three-row span in column 1.
fn records(count: i64) -> Vec<Value> {
    (0..count)
        .map(|key| {
            let rs = match key % 10 {
                0 => 3,
                1 | 2 => 0,
                _ => 1,
            };
            json!({"key": key, "rs": rs})
        })
        .collect()
}

/// Balanced tree with `fanout` children per node, `depth` levels deep.
fn tree(fanout: usize, depth: usize) -> Vec<Value> {
    fn node(key: &mut i64, fanout: usize, depth: usize) -> Value {
        *key += 1;
        let id = *key;
        if depth == 0 {
            return json!({"key": id});
        }
        let children: Vec<Value> = (0..fanout).map(|_| node(key, fanout, depth - 1)).collect();
        json!({"key": id, "children": children})
    }
    let mut key = 0;
    (0..fanout).map(|_| node(&mut key, fanout, depth)).collect()
}

fn grid(rows: i64, cols: usize) -> VirtualGrid<Value> {
    let config = GridConfig {
        width: 1200.0,
        height: 800.0,
        ..GridConfig::default()
    };
    VirtualGrid::new(
        RecordTree::from_flat(records(rows)),
        columns(cols),
        |r: &Value, i| json_key_field("key")(r, i),
        &config,
    )
    .expect("valid grid")
}

/// Horizontal scroll cost must track the window, not the dataset.
fn bench_scroll_x(c: &mut Criterion) {
    let mut group = c.benchmark_group("scroll_x");
    for rows in [1_000_i64, 100_000] {
        let mut grid = grid(rows, 60);
        let mut offset = 0.0_f32;
        group.bench_with_input(BenchmarkId::from_parameter(rows), &rows, |b, _| {
            b.iter(|| {
                offset = (offset + 37.0) % 4000.0;
                grid.set_scroll_left(black_box(offset));
            })
        });
    }
    group.finish();
}

fn bench_scroll_y(c: &mut Criterion) {
    let mut grid = grid(100_000, 60);
    let mut top = 0.0_f32;
    c.bench_function("scroll_y_100k", |b| {
        b.iter(|| {
            top = (top + 240.0) % 2_000_000.0;
            grid.scroll_to(&ScrollConfig::top(black_box(top)));
        })
    });
}

fn bench_flatten(c: &mut Criterion) {
    let mut group = c.benchmark_group("flatten");
    let key = |r: &Value, i| json_key_field("key")(r, i);
    for depth in [3_usize, 5] {
        let tree = RecordTree::from_roots(tree(6, depth), "children");
        let expanded: HashSet<_> = expand_all_keys(&tree, key).expect("keys");
        group.throughput(Throughput::Elements(tree.len() as u64));
        group.bench_with_input(BenchmarkId::new("expand_all", depth), &depth, |b, _| {
            b.iter(|| flatten(black_box(&tree), &expanded, key).expect("flatten"))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_scroll_x, bench_scroll_y, bench_flatten);
criterion_main!(benches);
