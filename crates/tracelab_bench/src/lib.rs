//! Benchmark utilities.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tracelab_core::{
    music_store, random_synthetic_record, AppLog, Context, IdGenerator, LogEntry, LogSink, Strategy,
    SyntheticRecord, UpsertCoordinator,
};
use tracelab_store::{MemoryStore, StoreConfig};

/// Drops every entry.
#[derive(Debug, Default)]
pub struct DiscardSink;

impl LogSink for DiscardSink {
    fn log(&self, _entry: &LogEntry) {}
}

/// A log that formats nothing.
pub fn quiet_log() -> AppLog {
    AppLog::new(Arc::new(DiscardSink), None)
}

/// Generate `count` random records from a fixed seed.
pub fn generate_records(count: usize, seed: u64) -> Vec<SyntheticRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count).map(|_| random_synthetic_record(&mut rng)).collect()
}

/// A store preloaded with `count` records through the atomic strategy.
pub fn populated_store(count: usize) -> MemoryStore {
    let store = music_store(StoreConfig::default());
    {
        let coordinator = UpsertCoordinator::new(&store, IdGenerator::new(1), quiet_log());
        let cx = Context::background();
        for r in generate_records(count, 7) {
            // Duplicate keys short-circuit, so errors are not expected here.
            coordinator
                .add_all(
                    Strategy::Atomic,
                    &cx,
                    &r.first_name,
                    &r.last_name,
                    &r.album_title,
                )
                .expect("preload upsert");
        }
    }
    store
}
