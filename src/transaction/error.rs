//! Transaction error types.
//!
//! A nested begin is not an error: it is reported through
//! [`BeginStatus::Nested`](super::BeginStatus) next to a usable handle.

use std::fmt;

use thiserror::Error;

use crate::driver::DriverError;

/// Result type for transaction operations.
pub type TransactionResult<T> = Result<T, TransactionError>;

/// Failures of the underlying connection itself.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The driver could not open the connection.
    #[error("failed to open {driver} connection to {address}: {source}")]
    Open {
        driver: String,
        address: String,
        #[source]
        source: DriverError,
    },

    /// The driver failed to close the connection.
    #[error("failed to close connection: {0}")]
    Close(#[source] DriverError),

    /// The connection was already closed.
    #[error("connection is closed")]
    Closed,
}

/// Which physical operation a finalize error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalizeOp {
    Commit,
    Rollback,
}

impl fmt::Display for FinalizeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FinalizeOp::Commit => write!(f, "commit"),
            FinalizeOp::Rollback => write!(f, "rollback"),
        }
    }
}

/// Errors that can occur during transaction operations.
#[derive(Debug, Error)]
pub enum TransactionError {
    /// Opening, closing or using a closed connection.
    #[error("connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// The driver failed to open a physical transaction; no handle was issued.
    #[error("failed to begin transaction: {0}")]
    Begin(#[source] DriverError),

    /// A statement failed. The driver error is passed through as is.
    #[error("statement failed: {0}")]
    Statement(#[source] DriverError),

    /// The physical commit or rollback failed.
    #[error("physical {op} failed: {source}")]
    Finalize {
        op: FinalizeOp,
        #[source]
        source: DriverError,
    },
}

/// Coarse classification of a [`TransactionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Connection,
    Begin,
    Statement,
    Finalize,
}

impl TransactionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TransactionError::Connection(_) => ErrorKind::Connection,
            TransactionError::Begin(_) => ErrorKind::Begin,
            TransactionError::Statement(_) => ErrorKind::Statement,
            TransactionError::Finalize { .. } => ErrorKind::Finalize,
        }
    }

    /// Check if the database rolled the physical transaction back on its own.
    ///
    /// The unit of work is lost; only finalizing the handles clears it.
    pub fn is_aborted(&self) -> bool {
        self.driver_error()
            .is_some_and(DriverError::is_transaction_aborted)
    }

    /// Check if a single-row lookup found nothing.
    pub fn is_no_rows(&self) -> bool {
        matches!(self, TransactionError::Statement(e) if e.is_no_rows())
    }

    /// Check if the statement was cancelled through an interrupt handle.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, TransactionError::Statement(e) if e.is_interrupted())
    }

    /// The driver error underneath, if any.
    pub fn driver_error(&self) -> Option<&DriverError> {
        match self {
            TransactionError::Connection(ConnectionError::Open { source, .. }) => Some(source),
            TransactionError::Connection(ConnectionError::Close(source)) => Some(source),
            TransactionError::Connection(ConnectionError::Closed) => None,
            TransactionError::Begin(source)
            | TransactionError::Statement(source)
            | TransactionError::Finalize { source, .. } => Some(source),
        }
    }
}
