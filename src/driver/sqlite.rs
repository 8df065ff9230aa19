//! SQLite driver backed by `rusqlite`.
//!
//! Physical transactions are driven with plain `BEGIN`/`COMMIT`/`ROLLBACK`
//! statements so the connection never has to lend out a borrowed
//! `rusqlite::Transaction`.

use std::sync::Arc;

use rusqlite::{params_from_iter, OpenFlags};
use tracing::{debug, trace, warn};

use super::error::{DriverError, DriverResult};
use super::rows::{ExecResult, Rows};
use super::value::Value;
use super::{Connection, Driver, Interrupt};
use crate::db::ConnectionConfig;
use crate::transaction::TxOptions;

/// In-memory database address.
pub const MEMORY: &str = ":memory:";

/// The SQLite driver, registered as `sqlite` and `sqlite3`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDriver;

impl Driver for SqliteDriver {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn open(&self, config: &ConnectionConfig) -> DriverResult<Box<dyn Connection>> {
        Ok(Box::new(SqliteConnection::open(config)?))
    }
}

/// One `rusqlite` connection.
pub struct SqliteConnection {
    conn: rusqlite::Connection,
    read_only_tx: bool,
    /// A physical transaction was opened with `begin` and not yet finalized.
    tx_open: bool,
    /// Set when SQLite ended `tx_open`'s transaction by itself.
    aborted: Option<String>,
}

impl SqliteConnection {
    /// Open a connection using the given configuration.
    pub fn open(config: &ConnectionConfig) -> DriverResult<Self> {
        let mut flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        if config.create_if_missing || config.address == MEMORY {
            flags |= OpenFlags::SQLITE_OPEN_CREATE;
        }

        let conn = rusqlite::Connection::open_with_flags(&config.address, flags)?;
        conn.busy_timeout(config.busy_timeout)?;
        conn.pragma_update(None, "foreign_keys", config.foreign_keys)?;

        debug!(address = %config.address, "opened sqlite connection");
        Ok(Self {
            conn,
            read_only_tx: false,
            tx_open: false,
            aborted: None,
        })
    }

    /// Check whether a transaction is open at the SQLite level.
    pub fn in_transaction(&self) -> bool {
        !self.conn.is_autocommit()
    }

    fn end_read_only(&mut self) {
        if self.read_only_tx {
            self.read_only_tx = false;
            if let Err(e) = self.conn.pragma_update(None, "query_only", false) {
                warn!(error = %e, "failed to clear query_only");
            }
        }
    }

    /// Forget the physical transaction, returning why it was aborted if
    /// SQLite already rolled it back.
    fn end_transaction(&mut self) -> Option<String> {
        self.tx_open = false;
        self.end_read_only();
        self.aborted.take()
    }

    fn ensure_usable(&self) -> DriverResult<()> {
        match &self.aborted {
            Some(reason) => Err(DriverError::TransactionAborted(reason.clone())),
            None => Ok(()),
        }
    }

    /// Check a failed statement for a transaction SQLite rolled back on its
    /// own. Later statements would run in autocommit, outside the unit of
    /// work, so the connection refuses them until the transaction is
    /// finalized.
    fn settle<T>(&mut self, result: DriverResult<T>) -> DriverResult<T> {
        match result {
            Err(e) if self.tx_open && self.conn.is_autocommit() => {
                let reason = e.to_string();
                warn!(error = %reason, "physical transaction rolled back by sqlite");
                self.aborted = Some(reason.clone());
                Err(DriverError::TransactionAborted(reason))
            }
            other => other,
        }
    }
}

fn execute_on(conn: &rusqlite::Connection, sql: &str, params: &[Value]) -> DriverResult<ExecResult> {
    let mut stmt = conn.prepare_cached(sql)?;
    let changed = stmt.execute(params_from_iter(params.iter()))?;
    Ok(ExecResult {
        rows_affected: changed as u64,
        last_insert_id: conn.last_insert_rowid(),
    })
}

fn query_on(conn: &rusqlite::Connection, sql: &str, params: &[Value]) -> DriverResult<Rows> {
    let mut stmt = conn.prepare_cached(sql)?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let width = columns.len();
    let mut out = Rows::new(columns);

    let mut rows = stmt.query(params_from_iter(params.iter()))?;
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(width);
        for i in 0..width {
            values.push(Value::from(row.get_ref(i)?));
        }
        out.push(values);
    }
    Ok(out)
}

impl Connection for SqliteConnection {
    fn begin(&mut self, options: &TxOptions) -> DriverResult<()> {
        self.conn
            .execute_batch(&format!("BEGIN {}", options.behavior))?;
        if options.read_only {
            if let Err(e) = self.conn.pragma_update(None, "query_only", true) {
                let _ = self.conn.execute_batch("ROLLBACK");
                return Err(e.into());
            }
            self.read_only_tx = true;
        }
        self.tx_open = true;
        debug!(behavior = %options.behavior, read_only = options.read_only, "begin physical transaction");
        Ok(())
    }

    fn commit(&mut self) -> DriverResult<()> {
        if let Some(reason) = self.end_transaction() {
            return Err(DriverError::TransactionAborted(reason));
        }
        let result = self.conn.execute_batch("COMMIT");
        if let Err(ref e) = result {
            // A failed COMMIT can leave the transaction open; release it so
            // the next begin starts clean.
            if self.in_transaction() {
                warn!(error = %e, "commit failed, rolling back");
                let _ = self.conn.execute_batch("ROLLBACK");
            }
        }
        result?;
        debug!("commit physical transaction");
        Ok(())
    }

    fn rollback(&mut self) -> DriverResult<()> {
        if self.end_transaction().is_some() {
            debug!("physical transaction was already rolled back by sqlite");
            return Ok(());
        }
        self.conn.execute_batch("ROLLBACK")?;
        debug!("rollback physical transaction");
        Ok(())
    }

    fn execute(&mut self, sql: &str, params: &[Value]) -> DriverResult<ExecResult> {
        self.ensure_usable()?;
        trace!(sql, params = params.len(), "execute");
        let result = execute_on(&self.conn, sql, params);
        self.settle(result)
    }

    fn query(&mut self, sql: &str, params: &[Value]) -> DriverResult<Rows> {
        self.ensure_usable()?;
        trace!(sql, params = params.len(), "query");
        let result = query_on(&self.conn, sql, params);
        self.settle(result)
    }

    fn interrupt_handle(&self) -> Option<Arc<dyn Interrupt>> {
        Some(Arc::new(SqliteInterrupt(self.conn.get_interrupt_handle())))
    }

    fn close(self: Box<Self>) -> DriverResult<()> {
        self.conn.close().map_err(|(_, e)| DriverError::from(e))?;
        debug!("closed sqlite connection");
        Ok(())
    }
}

struct SqliteInterrupt(rusqlite::InterruptHandle);

impl Interrupt for SqliteInterrupt {
    fn interrupt(&self) {
        self.0.interrupt();
    }
}
