//! Nested transaction flattening.
//!
//! One connection carries at most one physical transaction. Every begin on
//! it hands out a [`TransactionHandle`]; the first one opens the physical
//! transaction and the rest join it. A shared nesting counter decides which
//! commit or rollback actually reaches the database: the one that brings the
//! depth back to zero.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     ConnectionHandle                        │
//! │      (owns the connection, issues transaction handles)      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    TransactionManager                       │
//! │  (physical tx slot, nesting counter, rollback tracker)      │
//! └─────────────────────────────────────────────────────────────┘
//!        │                     │                     │
//!        ▼                     ▼                     ▼
//!  ┌─────────────┐       ┌─────────────┐       ┌─────────────┐
//!  │ Transaction │       │ Transaction │       │ Transaction │
//!  │ Handle (1)  │       │ Handle (2)  │       │ Handle (n)  │
//!  └─────────────┘       └─────────────┘       └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use nestx::{params, BeginStatus, ConnectionHandle};
//!
//! let db = ConnectionHandle::open("sqlite", ":memory:").unwrap();
//! db.execute("CREATE TABLE person (name TEXT)", params![]).unwrap();
//!
//! let (outer, _) = db.begin().unwrap();
//! outer.execute("INSERT INTO person (name) VALUES (?)", params!["R1"]).unwrap();
//!
//! let (inner, status) = db.begin().unwrap();
//! assert_eq!(status, BeginStatus::Nested { depth: 2 });
//! inner.execute("INSERT INTO person (name) VALUES (?)", params!["R2"]).unwrap();
//!
//! inner.commit().unwrap(); // no physical effect
//! outer.commit().unwrap(); // physical commit
//! assert_eq!(db.stats().physical_commits, 1);
//! ```

mod counter;
mod error;
mod handle;
mod manager;
mod options;
mod scope;

pub use counter::{RollbackTracker, TxStats};
pub use error::{ConnectionError, ErrorKind, FinalizeOp, TransactionError, TransactionResult};
pub use handle::TransactionHandle;
pub use manager::BeginStatus;
pub(crate) use manager::TransactionManager;
pub use options::{TxBehavior, TxOptions};
pub use scope::{run_in_transaction, run_in_transaction_with};
