//! Concurrency harnesses.
//!
//! [`race_upserts`] makes several callers resolve-or-create the same natural
//! key at once. The store's commit gate holds the first read-write commit of
//! every caller until all of them have reached it, so each caller's lookup
//! runs before any caller's insert becomes visible.

use std::thread;
use std::time::{Duration, Instant};
use tracelab_core::{CoreResult, Strategy, SyntheticRecord, UpsertCoordinator, UpsertOutcome};
use tracelab_store::MemoryStore;

use crate::fixtures::TestLab;

/// Outcome of a race.
#[derive(Debug)]
pub struct RaceResult {
    /// What each caller got back, in spawn order.
    pub outcomes: Vec<CoreResult<UpsertOutcome>>,
    /// Singer rows with the raced natural key afterwards.
    pub singers: usize,
    /// Album rows afterwards.
    pub albums: usize,
}

/// Runs `parties` concurrent upserts of `record` with `strategy`.
pub fn race_upserts(
    lab: &TestLab,
    coordinator: &UpsertCoordinator<'_, MemoryStore>,
    strategy: Strategy,
    record: &SyntheticRecord,
    parties: usize,
) -> RaceResult {
    lab.store.faults().commit_gate(parties);
    let outcomes = thread::scope(|s| {
        let handles: Vec<_> = (0..parties)
            .map(|_| {
                s.spawn(|| {
                    coordinator.add_all(
                        strategy,
                        &lab.cx(),
                        &record.first_name,
                        &record.last_name,
                        &record.album_title,
                    )
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("upsert thread panicked"))
            .collect()
    });
    lab.store.faults().clear();

    RaceResult {
        outcomes,
        singers: lab.singers_named(&record.first_name, &record.last_name),
        albums: lab.album_count(),
    }
}

/// Result of a stress run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Upserts attempted.
    pub total_ops: usize,
    /// Upserts that returned an outcome.
    pub successful_ops: usize,
    /// Upserts that returned an error.
    pub failed_ops: usize,
    /// Wall-clock duration.
    pub duration: Duration,
}

/// Runs `threads` threads each upserting every record in `records` with
/// `strategy`.
pub fn stress_concurrent_upserts(
    lab: &TestLab,
    coordinator: &UpsertCoordinator<'_, MemoryStore>,
    strategy: Strategy,
    records: &[SyntheticRecord],
    threads: usize,
) -> StressTestResult {
    let start = Instant::now();
    let (successful, failed) = thread::scope(|s| {
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                s.spawn(|| {
                    let cx = lab.cx();
                    let mut ok = 0usize;
                    let mut failed = 0usize;
                    for r in records {
                        match coordinator.add_all(
                            strategy,
                            &cx,
                            &r.first_name,
                            &r.last_name,
                            &r.album_title,
                        ) {
                            Ok(_) => ok += 1,
                            Err(_) => failed += 1,
                        }
                    }
                    (ok, failed)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("stress thread panicked"))
            .fold((0, 0), |(a, b), (c, d)| (a + c, b + d))
    });

    StressTestResult {
        total_ops: successful + failed,
        successful_ops: successful,
        failed_ops: failed,
        duration: start.elapsed(),
    }
}
