//! Driver error types.

use thiserror::Error;

/// Result type for driver operations.
pub type DriverResult<T> = Result<T, DriverError>;

/// Errors raised by a driver or while decoding its rows.
#[derive(Debug, Error)]
pub enum DriverError {
    /// Error from SQLite.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A single-row lookup matched nothing.
    #[error("no rows in result set")]
    NoRows,

    /// A row could not be decoded into the requested record type.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// A column value had a different type than requested.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// The requested column is not part of the result set.
    #[error("column not found: {0}")]
    ColumnNotFound(String),

    /// No driver registered under this name.
    #[error("unknown driver: {0}")]
    UnknownDriver(String),

    /// The database ended the open transaction on its own (`OR ROLLBACK`,
    /// `RAISE(ROLLBACK)`, an interrupted write, a full disk). Its work is
    /// gone and statements are refused until the transaction is finalized.
    #[error("transaction aborted by the database: {0}")]
    TransactionAborted(String),

    /// Any other driver failure.
    #[error("{0}")]
    Other(String),
}

impl DriverError {
    /// check if a single-row lookup found nothing
    pub fn is_no_rows(&self) -> bool {
        matches!(self, DriverError::NoRows)
    }

    /// check if the physical transaction was rolled back underneath us
    pub fn is_transaction_aborted(&self) -> bool {
        matches!(self, DriverError::TransactionAborted(_))
    }

    /// check if the statement was cancelled through an interrupt handle
    pub fn is_interrupted(&self) -> bool {
        matches!(
            self,
            DriverError::Sqlite(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::OperationInterrupted
        )
    }
}
