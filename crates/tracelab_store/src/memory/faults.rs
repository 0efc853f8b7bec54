//! Fault injection for exercising error and contention paths.

use crate::error::{StoreError, StoreResult};
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
struct GateState {
    parties: usize,
    arrived: usize,
    generation: u64,
}

/// Injects failures and interleavings into a [`MemoryStore`](crate::MemoryStore).
///
/// Counters are consumed one event at a time; once exhausted the store
/// behaves normally again.
#[derive(Debug, Default)]
pub struct FaultInjector {
    failing_statements: AtomicUsize,
    forced_conflicts: AtomicUsize,
    gate: Mutex<GateState>,
    gate_released: Condvar,
}

fn take_one(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

impl FaultInjector {
    /// Makes the next `n` statements fail with a transport error.
    pub fn fail_next_statements(&self, n: usize) {
        self.failing_statements.store(n, Ordering::SeqCst);
    }

    /// Makes the next `n` read-write commits fail with a transient conflict.
    pub fn force_conflicts(&self, n: usize) {
        self.forced_conflicts.store(n, Ordering::SeqCst);
    }

    /// Holds read-write commits until `parties` of them are waiting, then
    /// releases them all at once. The gate opens a single time.
    pub fn commit_gate(&self, parties: usize) {
        let mut gate = self.gate.lock();
        gate.parties = parties;
        gate.arrived = 0;
    }

    /// Clears every pending fault and opens the gate.
    pub fn clear(&self) {
        self.failing_statements.store(0, Ordering::SeqCst);
        self.forced_conflicts.store(0, Ordering::SeqCst);
        let mut gate = self.gate.lock();
        gate.parties = 0;
        gate.arrived = 0;
        gate.generation += 1;
        self.gate_released.notify_all();
    }

    pub(crate) fn before_statement(&self) -> StoreResult<()> {
        if take_one(&self.failing_statements) {
            return Err(StoreError::transport("injected statement failure"));
        }
        Ok(())
    }

    pub(crate) fn take_forced_conflict(&self) -> bool {
        take_one(&self.forced_conflicts)
    }

    pub(crate) fn wait_at_commit_gate(&self) {
        let mut gate = self.gate.lock();
        if gate.parties == 0 {
            return;
        }
        gate.arrived += 1;
        if gate.arrived >= gate.parties {
            gate.parties = 0;
            gate.arrived = 0;
            gate.generation += 1;
            self.gate_released.notify_all();
            return;
        }
        let generation = gate.generation;
        while gate.generation == generation {
            self.gate_released.wait(&mut gate);
        }
    }
}
