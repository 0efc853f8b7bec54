//! Update demo commands.
//!
//! Each demo resolves-or-creates one random record, then logs the singer
//! and album totals. A failed upsert is logged; the demo still completes.

use super::Lab;
use tracelab_core::{Context, CoreResult, Simulator, Strategy};
use tracelab_store::MemoryStore;

/// Runs the single-transaction demo.
pub fn big_txn(
    lab: &Lab,
    simulator: &mut Simulator<'_, MemoryStore>,
    cx: &Context,
) -> CoreResult<()> {
    run(lab, simulator, cx, Strategy::Atomic)
}

/// Runs the independent-transactions demo.
pub fn small_txns(
    lab: &Lab,
    simulator: &mut Simulator<'_, MemoryStore>,
    cx: &Context,
) -> CoreResult<()> {
    run(lab, simulator, cx, Strategy::Independent)
}

fn run(
    lab: &Lab,
    simulator: &mut Simulator<'_, MemoryStore>,
    cx: &Context,
    strategy: Strategy,
) -> CoreResult<()> {
    let record = simulator.next_record();
    let outcome = simulator.coordinator().add_all(
        strategy,
        cx,
        &record.first_name,
        &record.last_name,
        &record.album_title,
    );

    match outcome {
        Ok(outcome) => match outcome.album_id() {
            Some(album) => lab
                .log
                .info(cx, format!("Upsert ({strategy}) album id {album}")),
            None => lab.log.info(
                cx,
                format!(
                    "Upsert ({strategy}) found singer {}, album not checked",
                    outcome.singer.id()
                ),
            ),
        },
        Err(e) => lab
            .log
            .error(cx, format!("Error adding singer ({strategy}): {e}")),
    }

    lab.log_totals(simulator, cx);
    Ok(())
}
