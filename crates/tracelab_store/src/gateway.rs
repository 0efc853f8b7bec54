//! The store gateway interface.

use crate::error::{StoreError, StoreResult};
use crate::statement::Statement;
use crate::value::RowIterator;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared flag a caller flips to cancel in-flight store calls.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Creates a token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels every call carrying this token.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns true once [`cancel`](Self::cancel) has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Per-call deadline and cancellation, propagated into every store call.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    deadline: Option<Instant>,
    cancellation: CancellationToken,
}

impl CallContext {
    /// Creates a context with no deadline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a deadline `timeout` from now.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Sets an absolute deadline.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Attaches a cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Returns the deadline, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns the cancellation token.
    #[must_use]
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Fails if the call was cancelled or its deadline has passed.
    pub fn check(&self) -> StoreResult<()> {
        if self.cancellation.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(StoreError::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Sleeps for `duration`, cut short by the deadline.
    pub fn sleep(&self, duration: Duration) -> StoreResult<()> {
        if duration.is_zero() {
            return self.check();
        }
        self.check()?;
        match self.deadline {
            Some(deadline) if Instant::now() + duration >= deadline => {
                std::thread::sleep(deadline.saturating_duration_since(Instant::now()));
                Err(StoreError::DeadlineExceeded)
            }
            _ => {
                std::thread::sleep(duration);
                self.check()
            }
        }
    }
}

/// Errors a read-write transaction body may return.
///
/// The gateway converts its own failures into `Self` and retries the body
/// while [`is_transient`](Self::is_transient) holds.
pub trait TransactionError: From<StoreError> + fmt::Display {
    /// Returns true if the whole transaction should be retried.
    fn is_transient(&self) -> bool;
}

impl TransactionError for StoreError {
    fn is_transient(&self) -> bool {
        StoreError::is_transient(self)
    }
}

/// The value a committed read-write transaction body produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Committed<T> {
    /// Value returned by the body on its successful attempt.
    pub value: T,
    /// Sequence number of the commit.
    pub commit_seq: u64,
    /// Number of attempts the gateway made, including the successful one.
    pub attempts: u32,
}

impl<T> Committed<T> {
    /// Returns the body's value.
    pub fn into_value(self) -> T {
        self.value
    }
}

/// Something statements can be read through.
pub trait ReadContext {
    /// Executes a read statement and returns its rows.
    fn query(&mut self, stmt: &Statement) -> StoreResult<RowIterator>;
}

/// A read-write transaction handle.
pub trait ReadWriteContext: ReadContext {
    /// Executes a write statement and returns the number of affected rows.
    fn update(&mut self, stmt: &Statement) -> StoreResult<u64>;
}

/// The transactional store the core talks to.
pub trait StoreGateway: Send + Sync {
    /// A single strongly consistent read outside any transaction.
    type Single<'a>: ReadContext
    where
        Self: 'a;

    /// A read-only transaction pinned to one snapshot; released on drop.
    type ReadOnly<'a>: ReadContext
    where
        Self: 'a;

    /// Returns a context for one strongly consistent read.
    fn single(&self, call: &CallContext) -> Self::Single<'_>;

    /// Opens a read-only snapshot transaction.
    fn read_only_transaction(&self, call: &CallContext) -> StoreResult<Self::ReadOnly<'_>>;

    /// Runs `body` inside a read-write transaction and commits it.
    ///
    /// An error from `body` aborts the attempt. Transient errors, from the
    /// body or from commit, make the gateway run `body` again on a fresh
    /// snapshot, so `body` must be safe to re-execute.
    fn read_write_transaction<T, E, F>(&self, call: &CallContext, body: F) -> Result<Committed<T>, E>
    where
        F: FnMut(&mut dyn ReadWriteContext) -> Result<T, E>,
        E: TransactionError;
}
