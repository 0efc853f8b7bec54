//! Simulation command.

use super::Lab;
use std::path::Path;
use tracelab_core::{Action, Context, CoreResult, Simulator};
use tracelab_store::MemoryStore;
use tracing::info;

/// Runs the configured number of iterations and prints a summary.
///
/// Query output is discarded; only counts and timings matter here.
pub fn run(
    lab: &Lab,
    simulator: &mut Simulator<'_, MemoryStore>,
    cx: &Context,
    report_path: Option<&Path>,
) -> CoreResult<()> {
    let iterations = lab.config.iterations;
    println!("Running simulation with {iterations} iterations");

    let report = simulator.run(cx, iterations, &mut std::io::sink());

    println!("Simulation Summary");
    println!("==================");
    println!("  Seed: {}", report.seed);
    println!("  Duration: {} ms", report.duration_ms);
    println!("  Errors: {}", report.errors);
    for action in Action::ALL {
        if let Some(stats) = report.action(action) {
            println!(
                "  {:<24} count={:<5} errors={:<3} min={}us max={}us mean={:.0}us",
                action.name(),
                stats.count,
                stats.errors,
                stats.min_us,
                stats.max_us,
                stats.mean_us
            );
        }
    }
    let store_stats = lab.store.stats();
    println!(
        "  Store: {} commits, {} conflicts, {} retries",
        store_stats.commits, store_stats.conflicts, store_stats.retries
    );

    if let Some(path) = report_path {
        report.write_json(path)?;
        info!("Wrote simulation report to {:?}", path);
    }
    lab.log_totals(simulator, cx);
    Ok(())
}
