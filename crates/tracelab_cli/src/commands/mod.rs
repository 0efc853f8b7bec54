//! CLI command implementations.

pub mod query;
pub mod simulation;
pub mod update;

use tracelab_core::schema::{ALBUMS, ALBUM_ID, SINGERS, SINGER_ID};
use tracelab_core::{music_store, AppLog, Context, CoreError, CoreResult, LabConfig, Simulator};
use tracelab_store::MemoryStore;
use tracing::info;

/// Everything a command runs against.
pub struct Lab {
    /// Validated configuration.
    pub config: LabConfig,
    /// The store.
    pub store: MemoryStore,
    /// Correlated application log.
    pub log: AppLog,
    /// Seed the run's randomness derives from.
    pub seed: u64,
}

impl Lab {
    /// Opens an empty store for `config`.
    pub fn open(config: LabConfig) -> Self {
        let seed = config.effective_seed();
        let log = AppLog::tracing(Some(config.project.clone()));
        info!("Opening {} (seed {})", config.database_path(), seed);
        Self {
            store: music_store(config.store.clone()),
            log,
            seed,
            config,
        }
    }

    /// Context of the whole run: the root span every operation nests under.
    pub fn root_context(&self) -> Context {
        Context::background().child()
    }

    /// Creates the simulator, seeded from the lab seed.
    pub fn simulator(&self) -> Simulator<'_, MemoryStore> {
        Simulator::new(
            &self.store,
            self.log.clone(),
            self.config.queries.clone(),
            self.seed,
        )
    }

    /// Logs the singer and album totals.
    pub fn log_totals(&self, simulator: &Simulator<'_, MemoryStore>, cx: &Context) {
        let coordinator = simulator.coordinator();
        for (label, column, table) in [
            ("singers", SINGER_ID, SINGERS),
            ("albums", ALBUM_ID, ALBUMS),
        ] {
            match coordinator.count_rows(cx, column, table) {
                Ok(n) => self.log.info(cx, format!("Total number of {label} {n}")),
                Err(e) => self.log.error(cx, format!("Error counting {label}: {e}")),
            }
        }
    }
}

/// Seeds `count` records before the command runs.
pub fn preload(
    simulator: &mut Simulator<'_, MemoryStore>,
    cx: &Context,
    count: usize,
) -> CoreResult<()> {
    if count > 0 {
        simulator.preload(cx, count)?;
    }
    Ok(())
}

/// Logs `error` as critical and terminates the process.
pub fn fatal(lab: &Lab, cx: &Context, error: &CoreError) -> ! {
    lab.log.critical(cx, format!("{error}"));
    let code = if error.is_configuration() { 2 } else { 1 };
    std::process::exit(code)
}
