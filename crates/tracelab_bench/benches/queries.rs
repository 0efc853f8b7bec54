//! Read template benchmarks.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::io;
use tracelab_bench::{populated_store, quiet_log};
use tracelab_core::{Context, QueryConfig, Queries};

/// Benchmark each read template over stores of growing size.
fn bench_templates(c: &mut Criterion) {
    let mut group = c.benchmark_group("queries");

    for size in [100, 1000].iter() {
        let store = populated_store(*size);
        let queries = Queries::new(&store, quiet_log(), QueryConfig::default());
        let cx = Context::background();

        group.bench_with_input(BenchmarkId::new("albums", size), size, |b, _| {
            b.iter(|| queries.query_albums(&cx, &mut io::sink()).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("albums_limit", size), size, |b, _| {
            b.iter(|| queries.query_albums_limit(&cx, &mut io::sink()).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("singers_last_name", size), size, |b, _| {
            b.iter(|| queries.query_singers_last_name(&cx, &mut io::sink()).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("join", size), size, |b, _| {
            b.iter(|| queries.join_singer_album(&cx, &mut io::sink()).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_templates);
criterion_main!(benches);
