//! Test fixtures.
//!
//! A [`TestLab`] is a fresh music store plus a log that records every entry
//! in memory, so tests can assert on both rows and log lines.

use std::sync::Arc;
use tracelab_core::schema::{ALBUMS, FIRST_NAME, LAST_NAME, SINGERS, SINGER_ID};
use tracelab_core::{
    music_store, AppLog, Context, IdGenerator, MemorySink, QueryConfig, Queries, Simulator,
    UpsertCoordinator,
};
use tracelab_store::{MemoryStore, ReadContext, Statement, StoreConfig, StoreGateway};

/// A music store with a capturing log.
pub struct TestLab {
    /// The store.
    pub store: MemoryStore,
    /// Every log entry written through [`TestLab::log`].
    pub sink: Arc<MemorySink>,
    /// Log writing to `sink`.
    pub log: AppLog,
}

impl TestLab {
    /// Creates a lab with an empty store and no simulated latency.
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Creates a lab whose store uses `config`.
    pub fn with_config(config: StoreConfig) -> Self {
        let sink = Arc::new(MemorySink::new());
        let log = AppLog::new(sink.clone(), Some("test-project".to_string()));
        Self {
            store: music_store(config),
            sink,
            log,
        }
    }

    /// A fresh context with no span.
    pub fn cx(&self) -> Context {
        Context::background()
    }

    /// A coordinator whose ids derive from `seed`.
    pub fn coordinator(&self, seed: u64) -> UpsertCoordinator<'_, MemoryStore> {
        UpsertCoordinator::new(&self.store, IdGenerator::new(seed), self.log.clone())
    }

    /// The read templates with default literals.
    pub fn queries(&self) -> Queries<'_, MemoryStore> {
        Queries::new(&self.store, self.log.clone(), QueryConfig::default())
    }

    /// A simulator seeded with `seed`.
    pub fn simulator(&self, seed: u64) -> Simulator<'_, MemoryStore> {
        Simulator::new(&self.store, self.log.clone(), QueryConfig::default(), seed)
    }

    /// Number of singer rows.
    pub fn singer_count(&self) -> usize {
        self.store.row_count(SINGERS).expect("Singers table exists")
    }

    /// Number of album rows.
    pub fn album_count(&self) -> usize {
        self.store.row_count(ALBUMS).expect("Albums table exists")
    }

    /// Number of singer rows with the natural key `(first, last)`.
    pub fn singers_named(&self, first: &str, last: &str) -> usize {
        let stmt: Statement = Statement::select(SINGERS)
            .columns([SINGER_ID])
            .filter_eq(FIRST_NAME, first)
            .filter_eq(LAST_NAME, last)
            .into();
        self.store
            .single(&Default::default())
            .query(&stmt)
            .expect("singer lookup")
            .count()
    }

    /// Singer ids referenced by albums.
    pub fn album_singer_ids(&self) -> Vec<i64> {
        let stmt: Statement = Statement::select(ALBUMS).columns([SINGER_ID]).into();
        self.store
            .single(&Default::default())
            .query(&stmt)
            .expect("album scan")
            .map(|row| row.and_then(|r| r.get::<i64>(0)).expect("album row"))
            .collect()
    }
}

impl Default for TestLab {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs `f` with a fresh [`TestLab`].
pub fn with_lab<F, R>(f: F) -> R
where
    F: FnOnce(&TestLab) -> R,
{
    let lab = TestLab::new();
    f(&lab)
}
