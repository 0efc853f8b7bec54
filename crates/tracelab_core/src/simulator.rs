//! Workload simulator.
//!
//! Draws actions uniformly, runs each one against the store, and keeps
//! going when an action fails. Every outcome is logged and tallied in a
//! [`SimulationReport`].

use crate::applog::AppLog;
use crate::config::QueryConfig;
use crate::context::Context;
use crate::coordinator::{IdGenerator, Strategy, UpsertCoordinator};
use crate::error::CoreResult;
use crate::queries::Queries;
use crate::workload::{next_action, random_synthetic_record, Action, SyntheticRecord};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::Path;
use std::time::{Duration, Instant};
use tracelab_store::StoreGateway;

/// Iterations between progress lines.
pub const PROGRESS_EVERY: usize = 10;

/// Outcome tally of one action kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionStats {
    /// Times the action ran.
    pub count: u64,
    /// Times it failed.
    pub errors: u64,
    /// Fastest run in microseconds.
    pub min_us: u64,
    /// Slowest run in microseconds.
    pub max_us: u64,
    /// Mean run time in microseconds.
    pub mean_us: f64,
}

impl ActionStats {
    fn record(&mut self, elapsed: Duration, failed: bool) {
        let us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.count += 1;
        if failed {
            self.errors += 1;
        }
        if self.count == 1 {
            self.min_us = us;
            self.max_us = us;
        } else {
            self.min_us = self.min_us.min(us);
            self.max_us = self.max_us.max(us);
        }
        self.mean_us += (us as f64 - self.mean_us) / self.count as f64;
    }
}

/// Summary of a simulation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    /// Seed the run's random source started from.
    pub seed: u64,
    /// Iterations run.
    pub iterations: usize,
    /// Failed actions.
    pub errors: u64,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
    /// Per-action tallies, keyed by action name.
    pub actions: BTreeMap<String, ActionStats>,
}

impl SimulationReport {
    /// Returns the tally for `action`, if it ran.
    #[must_use]
    pub fn action(&self, action: Action) -> Option<&ActionStats> {
        self.actions.get(action.name())
    }

    /// Total actions run.
    #[must_use]
    pub fn total_actions(&self) -> u64 {
        self.actions.values().map(|s| s.count).sum()
    }

    /// Renders the report as pretty JSON.
    pub fn to_json(&self) -> CoreResult<String> {
        Ok(serde_json::to_string_pretty(self).map_err(io::Error::from)?)
    }

    /// Parses a report from JSON.
    pub fn from_json(json: &str) -> CoreResult<Self> {
        Ok(serde_json::from_str(json).map_err(io::Error::from)?)
    }

    /// Writes the report as JSON to `path`.
    pub fn write_json(&self, path: &Path) -> CoreResult<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// Drives the synthetic workload against a store.
pub struct Simulator<'g, G> {
    coordinator: UpsertCoordinator<'g, G>,
    queries: Queries<'g, G>,
    log: AppLog,
    rng: StdRng,
    seed: u64,
}

impl<'g, G: StoreGateway> Simulator<'g, G> {
    /// Creates a simulator. All randomness, including surrogate ids, derives
    /// from `seed`.
    pub fn new(gateway: &'g G, log: AppLog, queries: QueryConfig, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let ids = IdGenerator::new(rng.gen());
        Self {
            coordinator: UpsertCoordinator::new(gateway, ids, log.clone()),
            queries: Queries::new(gateway, log.clone(), queries),
            log,
            rng,
            seed,
        }
    }

    /// Returns the coordinator the write actions go through.
    pub fn coordinator(&self) -> &UpsertCoordinator<'g, G> {
        &self.coordinator
    }

    /// Returns the read templates.
    pub fn queries(&self) -> &Queries<'g, G> {
        &self.queries
    }

    /// Draws the next synthetic record.
    pub fn next_record(&mut self) -> SyntheticRecord {
        random_synthetic_record(&mut self.rng)
    }

    /// Seeds `count` random records with the atomic strategy.
    ///
    /// Stops at the first failure.
    pub fn preload(&mut self, cx: &Context, count: usize) -> CoreResult<usize> {
        for _ in 0..count {
            let record = self.next_record();
            self.coordinator.add_all(
                Strategy::Atomic,
                cx,
                &record.first_name,
                &record.last_name,
                &record.album_title,
            )?;
        }
        self.log.info(cx, format!("preloaded {count} record(s)"));
        Ok(count)
    }

    /// Runs `iterations` actions. Failures are logged and counted; they
    /// never stop the run.
    pub fn run(&mut self, cx: &Context, iterations: usize, out: &mut dyn Write) -> SimulationReport {
        let started = Instant::now();
        let mut report = SimulationReport {
            seed: self.seed,
            iterations,
            ..SimulationReport::default()
        };

        for i in 0..iterations {
            if i % PROGRESS_EVERY == 0 {
                self.log
                    .info(cx, format!("simulation iteration {i} of {iterations}"));
            }
            let action = next_action(&mut self.rng);
            self.log.info(cx, format!("next user action: {action}"));

            let action_started = Instant::now();
            let result = self.dispatch(cx, action, out);
            let elapsed = action_started.elapsed();

            if let Err(e) = &result {
                report.errors += 1;
                self.log.error(cx, format!("{action} failed: {e}"));
            }
            report
                .actions
                .entry(action.name().to_string())
                .or_default()
                .record(elapsed, result.is_err());
        }

        report.duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.log.info(
            cx,
            format!(
                "simulation finished: {} action(s), {} error(s)",
                report.total_actions(),
                report.errors
            ),
        );
        report
    }

    fn dispatch(&mut self, cx: &Context, action: Action, out: &mut dyn Write) -> CoreResult<()> {
        let strategy = match action {
            Action::QueryAlbums => return self.queries.query_albums(cx, out).map(drop),
            Action::QueryLimit => return self.queries.query_albums_limit(cx, out).map(drop),
            Action::QuerySingersFirstName => {
                return self.queries.query_singers_first_name(cx, out).map(drop)
            }
            Action::QuerySingersLastName => {
                return self.queries.query_singers_last_name(cx, out).map(drop)
            }
            Action::JoinSingerAlbum => return self.queries.join_singer_album(cx, out).map(drop),
            Action::AddAllNoTransaction => Strategy::Independent,
            Action::AddAllSingleTransaction => Strategy::Atomic,
        };
        let record = self.next_record();
        self.coordinator
            .add_all(
                strategy,
                cx,
                &record.first_name,
                &record.last_name,
                &record.album_title,
            )
            .map(drop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::applog::MemorySink;
    use crate::schema::{music_store, SINGERS};
    use std::sync::Arc;
    use tracelab_store::StoreConfig;

    #[test]
    fn stats_track_min_max_mean() {
        let mut stats = ActionStats::default();
        stats.record(Duration::from_micros(10), false);
        stats.record(Duration::from_micros(30), true);
        assert_eq!(stats.count, 2);
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.min_us, 10);
        assert_eq!(stats.max_us, 30);
        assert!((stats.mean_us - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn run_counts_every_iteration() {
        let store = music_store(StoreConfig::default());
        let sink = Arc::new(MemorySink::new());
        let mut simulator = Simulator::new(
            &store,
            AppLog::new(sink.clone(), None),
            QueryConfig::default(),
            9,
        );

        let report = simulator.run(&Context::background(), 25, &mut io::sink());
        assert_eq!(report.iterations, 25);
        assert_eq!(report.total_actions(), 25);
        assert_eq!(report.errors, 0);
        assert_eq!(report.seed, 9);
        assert!(sink.contains("simulation iteration 20 of 25"));
        assert!(sink.contains("next user action:"));
    }

    #[test]
    fn every_action_reaches_the_store() {
        let store = music_store(StoreConfig::default());
        let mut simulator =
            Simulator::new(&store, AppLog::tracing(None), QueryConfig::default(), 3);

        let report = simulator.run(&Context::background(), 60, &mut io::sink());
        let writes: u64 = [Action::AddAllNoTransaction, Action::AddAllSingleTransaction]
            .into_iter()
            .filter_map(|a| report.action(a).map(|s| s.count))
            .sum();

        assert!(writes > 0);
        assert!(store.row_count(SINGERS).unwrap() >= 1);
        // Reads query once, writes at least once for the singer lookup.
        assert!(store.stats().queries >= report.total_actions());
    }

    #[test]
    fn same_seed_same_action_mix() {
        let counts = |seed| {
            let store = music_store(StoreConfig::default());
            let mut simulator =
                Simulator::new(&store, AppLog::tracing(None), QueryConfig::default(), seed);
            let report = simulator.run(&Context::background(), 30, &mut io::sink());
            report
                .actions
                .iter()
                .map(|(name, stats)| (name.clone(), stats.count))
                .collect::<Vec<_>>()
        };
        assert_eq!(counts(4), counts(4));
    }

    #[test]
    fn preload_inserts_records() {
        let store = music_store(StoreConfig::default());
        let mut simulator =
            Simulator::new(&store, AppLog::tracing(None), QueryConfig::default(), 1);
        assert_eq!(simulator.preload(&Context::background(), 5).unwrap(), 5);
        let singers = store.row_count(SINGERS).unwrap();
        assert!((1..=5).contains(&singers));
    }

    #[test]
    fn report_json_round_trip() {
        let mut report = SimulationReport {
            seed: 3,
            iterations: 1,
            ..SimulationReport::default()
        };
        report
            .actions
            .entry(Action::QueryLimit.name().to_string())
            .or_default()
            .record(Duration::from_micros(5), false);

        let parsed = SimulationReport::from_json(&report.to_json().unwrap()).unwrap();
        assert_eq!(parsed, report);
        assert_eq!(parsed.action(Action::QueryLimit).unwrap().count, 1);
    }
}
