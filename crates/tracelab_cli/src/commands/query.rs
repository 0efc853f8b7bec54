//! Query demo command.

use std::io::Write;
use tracelab_core::{Context, CoreResult, Simulator};
use tracelab_store::MemoryStore;

/// Runs the full album scan once, writing each row to `out`.
///
/// A failed query is logged at error level by the query itself and does
/// not fail the command.
pub fn run(
    simulator: &Simulator<'_, MemoryStore>,
    cx: &Context,
    out: &mut dyn Write,
) -> CoreResult<()> {
    if simulator.queries().query_albums(cx, out).is_err() {
        return Ok(());
    }
    out.flush()?;
    Ok(())
}
