//! Error types for tracelab core.

use std::io;
use thiserror::Error;
use tracelab_store::{StoreError, TransactionError};

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in tracelab core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A lookup by natural key returned no rows.
    ///
    /// This drives the create branch of resolve-or-create and is never
    /// reported as a failure.
    #[error("{entity} not found: {key}")]
    NotFound {
        /// Kind of entity looked up.
        entity: &'static str,
        /// Rendered natural key.
        key: String,
    },

    /// The store failed to execute a statement or transaction.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A required startup parameter is missing or invalid.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the problem.
        message: String,
    },

    /// Writing query output or a report failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl CoreError {
    /// Creates a not found error.
    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            key: key.into(),
        }
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Returns true if this is the expected "no such row" outcome.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }
}

impl TransactionError for CoreError {
    fn is_transient(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_transient())
    }
}
