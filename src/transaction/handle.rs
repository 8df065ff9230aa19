//! Logical transaction handles.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;

use crate::db::ConnectionInner;
use crate::driver::{ExecResult, Rows, Value};
use crate::transaction::counter::RollbackTracker;
use crate::transaction::error::{FinalizeOp, TransactionResult};
use crate::transaction::manager::{Finalized, PhysicalTransaction};
use crate::transaction::options::TxOptions;

/// A caller's view onto a (possibly shared) physical transaction.
///
/// Every begin on a [`ConnectionHandle`](crate::ConnectionHandle) returns one
/// of these, whether or not a transaction was already open. Statements run
/// straight on the shared physical transaction, so all handles see each
/// other's uncommitted writes.
///
/// # Finalization
///
/// Each handle must be finalized exactly once, by [`commit`](Self::commit),
/// [`rollback`](Self::rollback) or by being dropped (which rolls back). Only
/// the release that brings the nesting depth to zero reaches the database.
///
/// **Rollback of a nested handle is advisory.** It does not undo any work,
/// not even the work done through that handle. It only records that a
/// rollback was requested (see [`is_rollbacked`](Self::is_rollbacked)); the
/// outermost caller's own commit or rollback decides the fate of everything.
/// This differs from savepoint-based nesting, where an inner rollback
/// discards the inner scope's writes.
#[must_use = "a transaction handle rolls back when dropped"]
pub struct TransactionHandle {
    conn: Arc<ConnectionInner>,
    tx: Arc<PhysicalTransaction>,
    depth: u64,
    finished: bool,
}

impl TransactionHandle {
    pub(crate) fn new(conn: Arc<ConnectionInner>, tx: Arc<PhysicalTransaction>, depth: u64) -> Self {
        Self {
            conn,
            tx,
            depth,
            finished: false,
        }
    }

    /// Id of the physical transaction; equal for all handles sharing it.
    pub fn id(&self) -> &str {
        &self.tx.id
    }

    /// Depth at which this handle was issued; 1 for the handle that opened
    /// the physical transaction.
    pub fn depth(&self) -> u64 {
        self.depth
    }

    /// Check if this handle joined an already open physical transaction.
    pub fn is_nested(&self) -> bool {
        self.depth > 1
    }

    /// Options the physical transaction was opened with.
    pub fn options(&self) -> TxOptions {
        self.tx.options
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.tx.started_at
    }

    /// Advisory rollbacks requested inside this physical transaction.
    pub fn rollbacks(&self) -> &RollbackTracker {
        &self.tx.rollbacks
    }

    /// Check if any nested scope of this unit of work asked to roll back.
    pub fn is_rollbacked(&self) -> bool {
        self.tx.rollbacks.is_rollbacked()
    }

    // ==================== Statements ====================

    /// Execute a statement that returns no rows.
    pub fn execute(&self, sql: &str, params: &[Value]) -> TransactionResult<ExecResult> {
        self.conn.run(|c| c.execute(sql, params))
    }

    /// Execute a statement, panicking on failure.
    pub fn execute_or_panic(&self, sql: &str, params: &[Value]) -> ExecResult {
        match self.execute(sql, params) {
            Ok(res) => res,
            Err(e) => panic!("{sql}: {e}"),
        }
    }

    /// Run a query and collect its rows.
    pub fn query(&self, sql: &str, params: &[Value]) -> TransactionResult<Rows> {
        self.conn.run(|c| c.query(sql, params))
    }

    /// Decode the first row of a query into a record.
    ///
    /// Fails with a no-rows statement error if the query matched nothing.
    pub fn get<T: DeserializeOwned>(&self, sql: &str, params: &[Value]) -> TransactionResult<T> {
        self.conn.run(|c| c.query(sql, params)?.first()?.decode())
    }

    /// Decode every row of a query into records.
    pub fn select<T: DeserializeOwned>(&self, sql: &str, params: &[Value]) -> TransactionResult<Vec<T>> {
        self.conn.run(|c| c.query(sql, params)?.decode_all())
    }

    // ==================== Transaction Control ====================

    /// Commit this handle.
    ///
    /// Returns immediately if other handles are still open; the physical
    /// commit happens on the release that brings the depth to zero.
    pub fn commit(mut self) -> TransactionResult<()> {
        self.finish(FinalizeOp::Commit).map(|_| ())
    }

    /// Roll back this handle.
    ///
    /// If other handles are still open this only records an advisory
    /// rollback; nothing is undone. Otherwise the physical transaction is
    /// rolled back.
    pub fn rollback(mut self) -> TransactionResult<()> {
        self.finish(FinalizeOp::Rollback).map(|_| ())
    }

    fn finish(&mut self, op: FinalizeOp) -> TransactionResult<Finalized> {
        self.finished = true;
        let conn = &self.conn;
        conn.manager().finalize(&self.tx, op, || conn.finalize_physical(op))
    }
}

impl Drop for TransactionHandle {
    fn drop(&mut self) {
        if !self.finished {
            let _ = self.finish(FinalizeOp::Rollback);
        }
    }
}

impl fmt::Debug for TransactionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionHandle")
            .field("id", &self.tx.id)
            .field("depth", &self.depth)
            .field("finished", &self.finished)
            .finish()
    }
}
