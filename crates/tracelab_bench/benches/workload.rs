//! Workload generator benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io;
use tracelab_bench::quiet_log;
use tracelab_core::{
    music_store, next_action, random_synthetic_record, Context, QueryConfig, Simulator,
};
use tracelab_store::StoreConfig;

fn bench_generators(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(42);
    c.bench_function("next_action", |b| b.iter(|| black_box(next_action(&mut rng))));

    let mut rng = StdRng::seed_from_u64(42);
    c.bench_function("random_synthetic_record", |b| {
        b.iter(|| black_box(random_synthetic_record(&mut rng)))
    });
}

/// Benchmark a short simulation from an empty store.
fn bench_simulation(c: &mut Criterion) {
    c.bench_function("simulation_100", |b| {
        b.iter(|| {
            let store = music_store(StoreConfig::default());
            let mut sim = Simulator::new(&store, quiet_log(), QueryConfig::default(), 42);
            black_box(sim.run(&Context::background(), 100, &mut io::sink()))
        });
    });
}

criterion_group!(benches, bench_generators, bench_simulation);
criterion_main!(benches);
