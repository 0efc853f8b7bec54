//! Store operation counters.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// A point-in-time copy of the store's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Read statements executed.
    pub queries: u64,
    /// Write statements executed.
    pub updates: u64,
    /// Read-write transactions committed.
    pub commits: u64,
    /// Read-write transaction attempts aborted.
    pub aborts: u64,
    /// Commits rejected by conflict validation.
    pub conflicts: u64,
    /// Read-write transaction attempts retried.
    pub retries: u64,
}

#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    pub queries: AtomicU64,
    pub updates: AtomicU64,
    pub commits: AtomicU64,
    pub aborts: AtomicU64,
    pub conflicts: AtomicU64,
    pub retries: AtomicU64,
}

impl StatsCounters {
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StoreStats {
        StoreStats {
            queries: self.queries.load(Ordering::Relaxed),
            updates: self.updates.load(Ordering::Relaxed),
            commits: self.commits.load(Ordering::Relaxed),
            aborts: self.aborts.load(Ordering::Relaxed),
            conflicts: self.conflicts.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
        }
    }
}
