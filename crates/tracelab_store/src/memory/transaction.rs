//! Read-write transaction state.

use super::stats::StatsCounters;
use super::table::{PendingInsert, ReadFootprint, View};
use super::MemoryStore;
use crate::error::{StoreError, StoreResult};
use crate::gateway::{CallContext, ReadContext, ReadWriteContext};
use crate::statement::Statement;
use crate::value::RowIterator;
use tracing::debug;

/// State of a read-write transaction attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TransactionState {
    Active,
    Committed,
    Aborted,
}

/// A read-write transaction on a [`MemoryStore`].
///
/// Reads see the snapshot taken at begin plus this transaction's own
/// inserts. Inserts are buffered and published atomically at commit.
#[derive(Debug)]
pub struct MemoryTransaction<'s> {
    pub(crate) store: &'s MemoryStore,
    pub(crate) id: u64,
    pub(crate) snapshot_seq: u64,
    pub(crate) call: CallContext,
    pub(crate) state: TransactionState,
    pub(crate) pending: Vec<PendingInsert>,
    pub(crate) reads: Vec<ReadFootprint>,
}

impl<'s> MemoryTransaction<'s> {
    pub(crate) fn new(store: &'s MemoryStore, id: u64, snapshot_seq: u64, call: CallContext) -> Self {
        Self {
            store,
            id,
            snapshot_seq,
            call,
            state: TransactionState::Active,
            pending: Vec::new(),
            reads: Vec::new(),
        }
    }

    /// Returns the transaction id.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns the sequence number this transaction reads at.
    #[must_use]
    pub fn snapshot_seq(&self) -> u64 {
        self.snapshot_seq
    }

    /// Returns the number of buffered inserts.
    #[must_use]
    pub fn pending_writes(&self) -> usize {
        self.pending.len()
    }

    fn ensure_active(&self) -> StoreResult<()> {
        if self.state != TransactionState::Active {
            return Err(StoreError::invalid_statement("transaction is not active"));
        }
        Ok(())
    }
}

impl ReadContext for MemoryTransaction<'_> {
    fn query(&mut self, stmt: &Statement) -> StoreResult<RowIterator> {
        self.ensure_active()?;
        self.store.before_statement(&self.call)?;
        debug!(txn = self.id, statement = %stmt, "query in read-write transaction");

        let view = View {
            seq: self.snapshot_seq,
            pending: &self.pending,
        };
        let executed = self.store.execute(stmt, Some(view))?;
        self.reads.extend(executed.footprints);
        StatsCounters::bump(&self.store.stats.queries);
        Ok(RowIterator::from_rows(executed.rows))
    }
}

impl ReadWriteContext for MemoryTransaction<'_> {
    fn update(&mut self, stmt: &Statement) -> StoreResult<u64> {
        self.ensure_active()?;
        let Statement::Insert(insert) = stmt else {
            return Err(StoreError::invalid_statement(format!(
                "update only accepts INSERT, got: {stmt}"
            )));
        };
        self.store.before_statement(&self.call)?;
        debug!(txn = self.id, statement = %stmt, "update in read-write transaction");

        let def = self.store.schema().table(&insert.table)?;
        let values = def.build_row(&insert.values)?;
        let key: Vec<_> = def
            .primary_key_indexes()?
            .into_iter()
            .map(|i| values[i].clone())
            .collect();

        if self
            .pending
            .iter()
            .any(|p| p.table == insert.table && p.key == key)
        {
            return Err(StoreError::AlreadyExists {
                table: insert.table.clone(),
                key: render_key(&key),
            });
        }

        self.pending.push(PendingInsert {
            table: insert.table.clone(),
            key,
            values,
        });
        StatsCounters::bump(&self.store.stats.updates);
        Ok(1)
    }
}

pub(crate) fn render_key(key: &[crate::value::Value]) -> String {
    let parts: Vec<String> = key.iter().map(ToString::to_string).collect();
    format!("({})", parts.join(", "))
}
