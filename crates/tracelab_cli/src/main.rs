//! tracelab CLI
//!
//! Drives the upsert strategies and the synthetic workload against an
//! in-memory transactional store and logs correlated operation timings.
//!
//! # Commands
//!
//! - `update-big-txn` - Resolve-or-create one random record in a single transaction
//! - `update-small-txns` - Resolve-or-create one random record with independent transactions
//! - `query-test` - Run the full album scan once
//! - `simulation` - Run a random mix of queries and upserts

mod commands;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracelab_core::{LabConfig, QueryConfig};
use tracelab_store::StoreConfig;
use tracing_subscriber::EnvFilter;

/// Entity upsert and workload lab.
#[derive(Parser)]
#[command(name = "tracelab")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Project id that owns the database and its traces
    #[arg(global = true, long, env = "TRACELAB_PROJECT")]
    project: Option<String>,

    /// Database instance
    #[arg(global = true, long, default_value = "test-instance")]
    instance: String,

    /// Database name
    #[arg(global = true, long, default_value = "test")]
    database: String,

    /// Seed for the random source (0 draws one from entropy)
    #[arg(global = true, long, default_value_t = 0)]
    seed: u64,

    /// Simulated latency of every statement, in milliseconds
    #[arg(global = true, long, default_value_t = 0)]
    statement_latency_ms: u64,

    /// Simulated latency of every commit, in milliseconds
    #[arg(global = true, long, default_value_t = 0)]
    commit_latency_ms: u64,

    /// Seed this many random records before running the command
    #[arg(global = true, long, default_value_t = 0)]
    preload: usize,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve-or-create one random record in a single transaction
    UpdateBigTxn,

    /// Resolve-or-create one random record with independent transactions
    UpdateSmallTxns,

    /// Run the full album scan once
    QueryTest,

    /// Run a random mix of queries and upserts
    Simulation {
        /// Number of actions to run
        #[arg(short, long, default_value_t = 100)]
        iterations: usize,

        /// Write the simulation report as JSON to this file
        #[arg(short, long)]
        report: Option<PathBuf>,
    },
}

impl Cli {
    fn lab_config(&self) -> LabConfig {
        let iterations = match &self.command {
            Commands::Simulation { iterations, .. } => *iterations,
            _ => LabConfig::default().iterations,
        };
        LabConfig::new()
            .project(self.project.clone().unwrap_or_default())
            .instance(&self.instance)
            .database(&self.database)
            .iterations(iterations)
            .seed(self.seed)
            .queries(QueryConfig::default())
            .store(
                StoreConfig::new()
                    .statement_latency(Duration::from_millis(self.statement_latency_ms))
                    .commit_latency(Duration::from_millis(self.commit_latency_ms)),
            )
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = cli.lab_config();
    if let Err(e) = config.validate() {
        Cli::command()
            .error(ErrorKind::MissingRequiredArgument, e.to_string())
            .exit();
    }

    let lab = commands::Lab::open(config);
    let cx = lab.root_context();
    let mut simulator = lab.simulator();
    let result = commands::preload(&mut simulator, &cx, cli.preload).and_then(|()| {
        match &cli.command {
            Commands::UpdateBigTxn => commands::update::big_txn(&lab, &mut simulator, &cx),
            Commands::UpdateSmallTxns => commands::update::small_txns(&lab, &mut simulator, &cx),
            Commands::QueryTest => {
                commands::query::run(&simulator, &cx, &mut std::io::stdout().lock())
            }
            Commands::Simulation { report, .. } => {
                commands::simulation::run(&lab, &mut simulator, &cx, report.as_deref())
            }
        }
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => commands::fatal(&lab, &cx, &e),
    }
}
