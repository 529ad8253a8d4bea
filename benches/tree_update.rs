//! Benchmarks for snapshot construction and subtree diffing

use confwatch::tree::TreeBuilder;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::{json, Value};

fn wide_document(sections: usize, keys: usize) -> Value {
    let mut root = serde_json::Map::new();
    for s in 0..sections {
        let mut section = serde_json::Map::new();
        for k in 0..keys {
            section.insert(format!("key{}", k), json!(format!("value-{}-{}", s, k)));
        }
        root.insert(format!("section{}", s), Value::Object(section));
    }
    Value::Object(root)
}

fn bench_build(c: &mut Criterion) {
    let document = wide_document(16, 16);
    c.bench_function("build_256_leaves", |b| {
        b.iter(|| TreeBuilder::new().build(black_box(&document)))
    });
}

fn bench_incremental_add(c: &mut Criterion) {
    let base = TreeBuilder::new().build(&wide_document(16, 16));
    c.bench_function("add_single_leaf", |b| {
        b.iter(|| {
            black_box(&base).add(&["section3", "key7"], "updated".to_string())
        })
    });
}

fn bench_subtree_diff(c: &mut Criterion) {
    let base = TreeBuilder::new().build(&wide_document(16, 16));
    let updated = base.add(&["section3", "key7"], "updated".to_string());
    c.bench_function("is_same_per_section", |b| {
        b.iter(|| {
            let mut changed = 0;
            for s in 0..16 {
                let path = [format!("section{}", s)];
                if !updated.is_same(&path, black_box(&base)) {
                    changed += 1;
                }
            }
            changed
        })
    });
}

fn bench_root_equality(c: &mut Criterion) {
    let left = TreeBuilder::new().build(&wide_document(16, 16));
    let right = TreeBuilder::new().build(&wide_document(16, 16));
    c.bench_function("root_hash_equality", |b| {
        b.iter(|| black_box(&left) == black_box(&right))
    });
}

criterion_group!(
    benches,
    bench_build,
    bench_incremental_add,
    bench_subtree_diff,
    bench_root_equality
);
criterion_main!(benches);
