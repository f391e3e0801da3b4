//! Benchmarks for trellis-core
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use trellis_core::reactive::{computed, effect, reactive};
use trellis_core::value::Record;

fn bench_untracked_get(c: &mut Criterion) {
    let state = reactive(Record::object_from([("a", 1)]));
    c.bench_function("get_untracked_context", |b| b.iter(|| black_box(state.get("a"))));
}

fn bench_set_without_subscribers(c: &mut Criterion) {
    let state = reactive(Record::object_from([("a", 0)]));
    c.bench_function("set_no_subscribers", |b| {
        b.iter(|| state.set("a", black_box(1)))
    });
}

fn bench_set_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("set_fan_out");
    for count in [1usize, 10, 100] {
        let state = reactive(Record::object_from([("a", 0)]));
        let _effects: Vec<_> = (0..count)
            .map(|_| {
                let s = state.clone();
                effect(move || {
                    black_box(s.get("a"));
                })
            })
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| state.set("a", black_box(1)))
        });
    }
    group.finish();
}

fn bench_computed_read(c: &mut Criterion) {
    let state = reactive(Record::object_from([("a", 1), ("b", 2)]));
    let s = state.clone();
    let sum = computed(move || {
        s.get("a").as_i64().unwrap_or(0) + s.get("b").as_i64().unwrap_or(0)
    });
    c.bench_function("computed_value", |b| b.iter(|| black_box(sum.value())));
}

fn bench_nested_read(c: &mut Criterion) {
    let state = reactive(Record::object_from([(
        "inner",
        Record::object_from([("x", 1)]),
    )]));
    c.bench_function("nested_get", |b| {
        b.iter(|| {
            let inner = state.get("inner").into_nested();
            black_box(inner.map(|r| r.get("x")))
        })
    });
}

criterion_group!(
    benches,
    bench_untracked_get,
    bench_set_without_subscribers,
    bench_set_fan_out,
    bench_computed_read,
    bench_nested_read,
);
criterion_main!(benches);
