//! Error types for store operations.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while executing statements or transactions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A concurrent commit invalidated something this transaction read.
    ///
    /// Conflicts are transient: the gateway retries the whole transaction body.
    #[error("transaction conflict on table {table}")]
    Conflict {
        /// Table where the conflicting write landed.
        table: String,
    },

    /// A row with the same primary key already exists.
    #[error("row already exists in {table}: key {key}")]
    AlreadyExists {
        /// Table the insert targeted.
        table: String,
        /// Rendered primary key.
        key: String,
    },

    /// An inserted row references a parent row that does not exist.
    #[error("foreign key violation on {table}.{column}: no parent row for {value}")]
    ForeignKeyViolation {
        /// Child table.
        table: String,
        /// Referencing column.
        column: String,
        /// Rendered referencing value.
        value: String,
    },

    /// The statement does not fit the schema or the execution context.
    #[error("invalid statement: {message}")]
    InvalidStatement {
        /// Description of the problem.
        message: String,
    },

    /// A column could not be decoded into the requested type.
    #[error("column error: {message}")]
    Column {
        /// Description of the problem.
        message: String,
    },

    /// The round trip to the store failed.
    #[error("transport error: {message}")]
    Transport {
        /// Description of the failure.
        message: String,
    },

    /// The call was cancelled by its caller.
    #[error("operation cancelled")]
    Cancelled,

    /// The call ran past its deadline.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// The transaction kept conflicting until the retry budget ran out.
    #[error("transaction retries exhausted after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// Number of attempts made.
        attempts: u32,
        /// Rendering of the last transient error.
        last: String,
    },
}

impl StoreError {
    /// Creates a conflict error.
    pub fn conflict(table: impl Into<String>) -> Self {
        Self::Conflict {
            table: table.into(),
        }
    }

    /// Creates an invalid statement error.
    pub fn invalid_statement(message: impl Into<String>) -> Self {
        Self::InvalidStatement {
            message: message.into(),
        }
    }

    /// Creates a column decoding error.
    pub fn column(message: impl Into<String>) -> Self {
        Self::Column {
            message: message.into(),
        }
    }

    /// Creates a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Returns true if retrying the same transaction may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_conflicts_are_transient() {
        assert!(StoreError::conflict("Singers").is_transient());
        assert!(!StoreError::transport("connection reset").is_transient());
        assert!(!StoreError::Cancelled.is_transient());
        assert!(!StoreError::DeadlineExceeded.is_transient());
        assert!(!StoreError::RetriesExhausted {
            attempts: 3,
            last: "conflict".into()
        }
        .is_transient());
    }

    #[test]
    fn error_display() {
        let err = StoreError::ForeignKeyViolation {
            table: "Albums".into(),
            column: "SingerId".into(),
            value: "7".into(),
        };
        assert_eq!(
            err.to_string(),
            "foreign key violation on Albums.SingerId: no parent row for 7"
        );
    }
}
