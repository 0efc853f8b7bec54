//! In-memory MVCC store.
//!
//! `MemoryStore` stands in for a remote transactional database:
//! - **Snapshots**: every row carries the sequence number of the commit that
//!   wrote it; readers see rows at or below their snapshot
//! - **Optimistic concurrency**: read-write transactions record what they
//!   read and fail commit with a transient conflict if a later commit wrote
//!   a row they would have seen
//! - **Constraints**: primary keys are unique and foreign keys must point at
//!   existing rows when the transaction commits
//! - **Retry**: the gateway re-runs transaction bodies on transient conflicts
//!   according to [`RetryConfig`](crate::RetryConfig)

mod faults;
mod stats;
mod table;
mod transaction;

pub use faults::FaultInjector;
pub use stats::StoreStats;
pub use transaction::MemoryTransaction;

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::gateway::{
    CallContext, Committed, ReadContext, ReadWriteContext, StoreGateway, TransactionError,
};
use crate::schema::Schema;
use crate::statement::Statement;
use crate::value::RowIterator;
use parking_lot::{Mutex, RwLock};
use stats::StatsCounters;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use table::{execute_read, table_data, Executed, StoredRow, TableData, View};
use tracing::{debug, warn};
use transaction::{render_key, TransactionState};

/// An in-memory transactional store.
pub struct MemoryStore {
    schema: Schema,
    config: StoreConfig,
    tables: RwLock<HashMap<String, TableData>>,
    committed_seq: AtomicU64,
    next_txn_id: AtomicU64,
    commit_lock: Mutex<()>,
    active_snapshots: AtomicUsize,
    stats: StatsCounters,
    faults: FaultInjector,
}

impl MemoryStore {
    /// Creates an empty store serving `schema`.
    pub fn new(schema: Schema, config: StoreConfig) -> Self {
        let tables = schema
            .tables()
            .iter()
            .map(|t| (t.name.clone(), TableData::default()))
            .collect();
        Self {
            schema,
            config,
            tables: RwLock::new(tables),
            committed_seq: AtomicU64::new(0),
            next_txn_id: AtomicU64::new(1),
            commit_lock: Mutex::new(()),
            active_snapshots: AtomicUsize::new(0),
            stats: StatsCounters::default(),
            faults: FaultInjector::default(),
        }
    }

    /// Returns the schema.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Returns the latest committed sequence number.
    #[must_use]
    pub fn committed_seq(&self) -> u64 {
        self.committed_seq.load(Ordering::SeqCst)
    }

    /// Returns the number of read-only transactions currently open.
    #[must_use]
    pub fn active_snapshots(&self) -> usize {
        self.active_snapshots.load(Ordering::SeqCst)
    }

    /// Returns a copy of the operation counters.
    #[must_use]
    pub fn stats(&self) -> StoreStats {
        self.stats.snapshot()
    }

    /// Returns the fault injector.
    #[must_use]
    pub fn faults(&self) -> &FaultInjector {
        &self.faults
    }

    /// Returns the number of committed rows in `table`.
    pub fn row_count(&self, table: &str) -> StoreResult<usize> {
        let tables = self.tables.read();
        Ok(table_data(&tables, table)?.rows.len())
    }

    /// Begins a read-write transaction attempt at the latest snapshot.
    ///
    /// Most callers want [`StoreGateway::read_write_transaction`], which
    /// commits and retries.
    pub fn begin(&self, call: &CallContext) -> MemoryTransaction<'_> {
        let id = self.next_txn_id.fetch_add(1, Ordering::SeqCst);
        let snapshot_seq = self.committed_seq();
        debug!(txn = id, snapshot_seq, "begin read-write transaction");
        MemoryTransaction::new(self, id, snapshot_seq, call.clone())
    }

    /// Validates and publishes a transaction's inserts.
    ///
    /// Returns the commit sequence number. A transaction without inserts
    /// commits at the current sequence without validation, since its reads
    /// came from one consistent snapshot.
    pub fn commit(&self, txn: &mut MemoryTransaction<'_>) -> StoreResult<u64> {
        if txn.state != TransactionState::Active {
            return Err(StoreError::invalid_statement("transaction is not active"));
        }
        txn.call.check()?;
        if txn.pending.is_empty() {
            txn.state = TransactionState::Committed;
            return Ok(self.committed_seq());
        }

        self.faults.wait_at_commit_gate();
        txn.call.sleep(self.config.commit_latency)?;
        if self.faults.take_forced_conflict() {
            StatsCounters::bump(&self.stats.conflicts);
            return Err(StoreError::conflict(txn.pending[0].table.clone()));
        }

        let _commit_guard = self.commit_lock.lock();
        let mut tables = self.tables.write();

        if let Err(e) = self.validate(&tables, txn) {
            if matches!(e, StoreError::Conflict { .. }) {
                StatsCounters::bump(&self.stats.conflicts);
            }
            return Err(e);
        }

        let seq = self.committed_seq() + 1;
        for insert in txn.pending.drain(..) {
            let data = tables.get_mut(&insert.table).ok_or_else(|| {
                StoreError::invalid_statement(format!("no table named {}", insert.table))
            })?;
            data.rows.insert(
                insert.key,
                StoredRow {
                    values: insert.values,
                    seq,
                },
            );
            data.last_commit_seq = seq;
        }
        self.committed_seq.store(seq, Ordering::SeqCst);
        txn.state = TransactionState::Committed;
        StatsCounters::bump(&self.stats.commits);
        debug!(txn = txn.id, seq, "committed read-write transaction");
        Ok(seq)
    }

    /// Discards a transaction's buffered inserts.
    pub fn abort(&self, txn: &mut MemoryTransaction<'_>) {
        if txn.state == TransactionState::Active {
            txn.pending.clear();
            txn.state = TransactionState::Aborted;
            StatsCounters::bump(&self.stats.aborts);
            debug!(txn = txn.id, "aborted read-write transaction");
        }
    }

    fn validate(
        &self,
        tables: &HashMap<String, TableData>,
        txn: &MemoryTransaction<'_>,
    ) -> StoreResult<()> {
        for footprint in &txn.reads {
            let data = table_data(tables, &footprint.table)?;
            if data.last_commit_seq <= txn.snapshot_seq {
                continue;
            }
            let invalidated = data
                .rows
                .values()
                .any(|row| row.seq > txn.snapshot_seq && footprint.matches(&row.values));
            if invalidated {
                return Err(StoreError::conflict(footprint.table.clone()));
            }
        }

        for insert in &txn.pending {
            if table_data(tables, &insert.table)?
                .rows
                .contains_key(&insert.key)
            {
                return Err(StoreError::AlreadyExists {
                    table: insert.table.clone(),
                    key: render_key(&insert.key),
                });
            }
        }

        for insert in &txn.pending {
            let def = self.schema.table(&insert.table)?;
            for fk in &def.foreign_keys {
                let value = &insert.values[def.column_index(&fk.column)?];
                if value.is_null() {
                    continue;
                }
                let parent = self.schema.table(&fk.references_table)?;
                let parent_index = parent.column_index(&fk.references_column)?;
                let committed = table_data(tables, &parent.name)?
                    .rows
                    .values()
                    .any(|row| row.values[parent_index] == *value);
                let buffered = txn.pending.iter().any(|p| {
                    p.table == parent.name && p.values[parent_index] == *value
                });
                if !committed && !buffered {
                    return Err(StoreError::ForeignKeyViolation {
                        table: insert.table.clone(),
                        column: fk.column.clone(),
                        value: value.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    fn before_statement(&self, call: &CallContext) -> StoreResult<()> {
        call.check()?;
        self.faults.before_statement()?;
        call.sleep(self.config.statement_latency)
    }

    /// Runs a read at `view`, or at the latest committed sequence.
    fn execute(&self, stmt: &Statement, view: Option<View<'_>>) -> StoreResult<Executed> {
        let tables = self.tables.read();
        let view = view.unwrap_or(View {
            seq: self.committed_seq(),
            pending: &[],
        });
        execute_read(&self.schema, &tables, stmt, view)
    }

    fn run_read(&self, call: &CallContext, stmt: &Statement, seq: Option<u64>) -> StoreResult<RowIterator> {
        self.before_statement(call)?;
        debug!(statement = %stmt, snapshot_seq = ?seq, "snapshot query");
        let view = seq.map(|seq| View { seq, pending: &[] });
        let executed = self.execute(stmt, view)?;
        StatsCounters::bump(&self.stats.queries);
        Ok(RowIterator::from_rows(executed.rows))
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("committed_seq", &self.committed_seq())
            .field("active_snapshots", &self.active_snapshots())
            .finish_non_exhaustive()
    }
}

/// A single strongly consistent read at the latest committed sequence.
#[derive(Debug)]
pub struct SingleRead<'s> {
    store: &'s MemoryStore,
    call: CallContext,
}

impl ReadContext for SingleRead<'_> {
    fn query(&mut self, stmt: &Statement) -> StoreResult<RowIterator> {
        self.store.run_read(&self.call, stmt, None)
    }
}

/// A read-only transaction pinned to one snapshot.
///
/// The snapshot is released when the value is dropped.
#[derive(Debug)]
pub struct ReadOnlyTransaction<'s> {
    store: &'s MemoryStore,
    call: CallContext,
    snapshot_seq: u64,
}

impl ReadOnlyTransaction<'_> {
    /// Returns the sequence number this transaction reads at.
    #[must_use]
    pub fn snapshot_seq(&self) -> u64 {
        self.snapshot_seq
    }
}

impl ReadContext for ReadOnlyTransaction<'_> {
    fn query(&mut self, stmt: &Statement) -> StoreResult<RowIterator> {
        self.store.run_read(&self.call, stmt, Some(self.snapshot_seq))
    }
}

impl Drop for ReadOnlyTransaction<'_> {
    fn drop(&mut self) {
        self.store.active_snapshots.fetch_sub(1, Ordering::SeqCst);
    }
}

impl StoreGateway for MemoryStore {
    type Single<'a> = SingleRead<'a>;
    type ReadOnly<'a> = ReadOnlyTransaction<'a>;

    fn single(&self, call: &CallContext) -> SingleRead<'_> {
        SingleRead {
            store: self,
            call: call.clone(),
        }
    }

    fn read_only_transaction(&self, call: &CallContext) -> StoreResult<ReadOnlyTransaction<'_>> {
        call.check()?;
        self.active_snapshots.fetch_add(1, Ordering::SeqCst);
        Ok(ReadOnlyTransaction {
            store: self,
            call: call.clone(),
            snapshot_seq: self.committed_seq(),
        })
    }

    fn read_write_transaction<T, E, F>(
        &self,
        call: &CallContext,
        mut body: F,
    ) -> Result<Committed<T>, E>
    where
        F: FnMut(&mut dyn ReadWriteContext) -> Result<T, E>,
        E: TransactionError,
    {
        let retry = &self.config.retry;
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            call.check()?;
            let mut txn = self.begin(call);

            let outcome = match body(&mut txn) {
                Ok(value) => self.commit(&mut txn).map(|seq| (value, seq)).map_err(E::from),
                Err(e) => Err(e),
            };

            let error = match outcome {
                Ok((value, commit_seq)) => {
                    return Ok(Committed {
                        value,
                        commit_seq,
                        attempts: attempt,
                    })
                }
                Err(e) => e,
            };

            self.abort(&mut txn);
            if !error.is_transient() {
                return Err(error);
            }
            if attempt >= retry.max_attempts {
                warn!(attempts = attempt, error = %error, "read-write transaction retries exhausted");
                return Err(E::from(StoreError::RetriesExhausted {
                    attempts: attempt,
                    last: error.to_string(),
                }));
            }

            StatsCounters::bump(&self.stats.retries);
            warn!(attempt, error = %error, "transient error, retrying read-write transaction");
            call.sleep(retry.delay_for_attempt(attempt))?;
        }
    }
}
