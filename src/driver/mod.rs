//! Driver layer: the physical connection the transaction core wraps.
//!
//! The core only needs a handful of capabilities from a database: open a
//! connection, begin/commit/rollback a physical transaction, run statements,
//! and close. Those are captured by the [`Driver`] and [`Connection`] traits.
//! An SQLite implementation backed by `rusqlite` ships with the crate.
//!
//! Statements are passed through as written; placeholder style is the
//! caller's concern (SQLite accepts `?`).

mod error;
mod rows;
pub mod sqlite;
mod value;

use std::fmt;
use std::sync::Arc;

pub use error::{DriverError, DriverResult};
pub use rows::{ExecResult, Row, Rows};
pub use value::{FromValue, Value};

use crate::db::ConnectionConfig;
use crate::transaction::TxOptions;

/// Opens physical connections.
pub trait Driver: Send + Sync {
    /// Name the driver is registered under.
    fn name(&self) -> &'static str;

    /// Open a connection to `config.address`.
    fn open(&self, config: &ConnectionConfig) -> DriverResult<Box<dyn Connection>>;
}

/// A single physical connection.
///
/// At most one physical transaction is open on a connection at a time; the
/// transaction core guarantees `begin` is never called twice without an
/// intervening `commit` or `rollback`.
pub trait Connection: Send {
    /// Open a physical transaction.
    fn begin(&mut self, options: &TxOptions) -> DriverResult<()>;

    /// Commit the open physical transaction.
    fn commit(&mut self) -> DriverResult<()>;

    /// Roll back the open physical transaction.
    fn rollback(&mut self) -> DriverResult<()>;

    /// Run a statement that returns no rows.
    fn execute(&mut self, sql: &str, params: &[Value]) -> DriverResult<ExecResult>;

    /// Run a statement and collect its rows.
    fn query(&mut self, sql: &str, params: &[Value]) -> DriverResult<Rows>;

    /// Handle that can abort a running statement from another thread.
    fn interrupt_handle(&self) -> Option<Arc<dyn Interrupt>> {
        None
    }

    /// Close the connection.
    fn close(self: Box<Self>) -> DriverResult<()>;
}

/// Cancels whatever statement is running on a connection.
pub trait Interrupt: Send + Sync {
    fn interrupt(&self);
}

/// Cloneable, thread-safe statement cancellation handle.
///
/// Interrupted statements fail with an error for which
/// [`DriverError::is_interrupted`] is true.
#[derive(Clone)]
pub struct InterruptHandle(Arc<dyn Interrupt>);

impl InterruptHandle {
    pub(crate) fn new(inner: Arc<dyn Interrupt>) -> Self {
        Self(inner)
    }

    /// Abort the statement currently running on the connection, if any.
    pub fn interrupt(&self) {
        self.0.interrupt();
    }
}

impl fmt::Debug for InterruptHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterruptHandle").finish_non_exhaustive()
    }
}

/// Resolve a driver by name.
pub fn lookup(name: &str) -> DriverResult<Box<dyn Driver>> {
    match name.to_ascii_lowercase().as_str() {
        "sqlite" | "sqlite3" => Ok(Box::new(sqlite::SqliteDriver)),
        _ => Err(DriverError::UnknownDriver(name.to_string())),
    }
}

/// Build a parameter slice for statement execution.
///
/// ```
/// use nestx::{params, Value};
///
/// let args: &[Value] = params!["Alice", 30, None::<String>];
/// assert_eq!(args.len(), 3);
/// ```
#[macro_export]
macro_rules! params {
    () => {
        &[] as &[$crate::driver::Value]
    };
    ($($value:expr),+ $(,)?) => {
        &[$($crate::driver::Value::from($value)),+] as &[$crate::driver::Value]
    };
}
