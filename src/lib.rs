//! nestx - nested transaction flattening over a single SQL connection.
//!
//! Code that opens a transaction does not need to know whether it is already
//! running inside one. Every `begin` on a [`ConnectionHandle`] returns a
//! [`TransactionHandle`]; only the first opens a physical transaction, and
//! only the commit or rollback that brings the nesting depth back to zero
//! touches it.
//!
//! Inner rollbacks are *advisory*: they are recorded (see
//! [`RollbackTracker`]) but do not undo anything. The outermost caller alone
//! decides the fate of the whole unit of work. This is not savepoint
//! semantics.
//!
//! # Example
//!
//! ```no_run
//! use nestx::{params, run_in_transaction, ConnectionHandle, TransactionError};
//!
//! let db = ConnectionHandle::open("sqlite", ":memory:").unwrap();
//! db.execute("CREATE TABLE person (name TEXT)", params![]).unwrap();
//!
//! run_in_transaction(&db, |tx| {
//!     tx.execute("INSERT INTO person (name) VALUES (?)", params!["Alice"])?;
//!
//!     // Nested: joins the transaction above instead of opening a new one.
//!     run_in_transaction(&db, |inner| {
//!         inner.execute("INSERT INTO person (name) VALUES (?)", params!["Bob"])?;
//!         Ok::<_, TransactionError>(())
//!     })
//! })
//! .unwrap();
//! ```

pub mod db;
pub mod driver;
pub mod transaction;

pub use db::{ConnectionConfig, ConnectionHandle};
pub use driver::{ExecResult, Row, Rows, Value};
pub use transaction::{
    run_in_transaction, run_in_transaction_with, BeginStatus, ConnectionError, ErrorKind,
    RollbackTracker, TransactionError, TransactionHandle, TransactionResult, TxBehavior,
    TxOptions, TxStats,
};
