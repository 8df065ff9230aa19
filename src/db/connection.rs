//! Connection handle - the entry point for nested transactions.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;

use super::config::ConnectionConfig;
use crate::driver::{self, Connection, DriverResult, ExecResult, Interrupt, InterruptHandle, Rows, Value};
use crate::transaction::{
    run_in_transaction, run_in_transaction_with, BeginStatus, ConnectionError, FinalizeOp,
    RollbackTracker, TransactionError, TransactionHandle, TransactionManager, TransactionResult,
    TxOptions, TxStats,
};

/// Owns one physical connection and issues transaction handles on it.
///
/// Thread-safe: can be shared across threads via Clone (uses Arc internally).
/// Every clone refers to the same connection and the same nesting state.
///
/// Statements run directly on the handle (`execute`, `query`, ...) use the
/// same connection as the transactions, so while a transaction is open they
/// run inside it.
#[derive(Clone)]
pub struct ConnectionHandle {
    inner: Arc<ConnectionInner>,
}

pub(crate) struct ConnectionInner {
    driver: String,
    config: ConnectionConfig,
    conn: Mutex<Option<Box<dyn Connection>>>,
    interrupt: Option<Arc<dyn Interrupt>>,
    manager: TransactionManager,
}

impl ConnectionInner {
    pub(crate) fn manager(&self) -> &TransactionManager {
        &self.manager
    }

    /// Run a statement on the connection.
    pub(crate) fn run<T>(
        &self,
        f: impl FnOnce(&mut dyn Connection) -> DriverResult<T>,
    ) -> TransactionResult<T> {
        let mut guard = self.conn.lock();
        let conn = guard.as_deref_mut().ok_or(ConnectionError::Closed)?;
        f(conn).map_err(TransactionError::Statement)
    }

    fn begin_physical(&self, options: &TxOptions) -> TransactionResult<()> {
        let mut guard = self.conn.lock();
        let conn = guard.as_deref_mut().ok_or(ConnectionError::Closed)?;
        conn.begin(options).map_err(TransactionError::Begin)
    }

    pub(crate) fn finalize_physical(&self, op: FinalizeOp) -> TransactionResult<()> {
        let mut guard = self.conn.lock();
        let conn = guard.as_deref_mut().ok_or(ConnectionError::Closed)?;
        let result = match op {
            FinalizeOp::Commit => conn.commit(),
            FinalizeOp::Rollback => conn.rollback(),
        };
        result.map_err(|source| TransactionError::Finalize { op, source })
    }
}

impl ConnectionHandle {
    /// Open a connection with the named driver.
    pub fn open(driver: &str, address: &str) -> TransactionResult<Self> {
        Self::open_with_config(ConnectionConfig::new(address).driver(driver))
    }

    /// Open a connection, panicking on failure.
    pub fn open_or_panic(driver: &str, address: &str) -> Self {
        match Self::open(driver, address) {
            Ok(conn) => conn,
            Err(e) => panic!("{e}"),
        }
    }

    /// Open a connection with custom configuration.
    pub fn open_with_config(config: ConnectionConfig) -> TransactionResult<Self> {
        let open_error = |source| ConnectionError::Open {
            driver: config.driver.clone(),
            address: config.address.clone(),
            source,
        };

        let driver = driver::lookup(&config.driver).map_err(open_error)?;
        let conn = driver.open(&config).map_err(open_error)?;
        Ok(Self::from_parts(driver.name().to_string(), conn, config))
    }

    /// Wrap a connection opened by a driver outside the registry.
    pub fn from_connection(driver: impl Into<String>, conn: Box<dyn Connection>) -> Self {
        let driver = driver.into();
        let config = ConnectionConfig::default().driver(driver.clone());
        Self::from_parts(driver, conn, config)
    }

    fn from_parts(driver: String, conn: Box<dyn Connection>, config: ConnectionConfig) -> Self {
        let interrupt = conn.interrupt_handle();
        Self {
            inner: Arc::new(ConnectionInner {
                driver,
                config,
                conn: Mutex::new(Some(conn)),
                interrupt,
                manager: TransactionManager::new(),
            }),
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &ConnectionConfig {
        &self.inner.config
    }

    pub fn driver_name(&self) -> &str {
        &self.inner.driver
    }

    // ==================== Transactions ====================

    /// Begin a transaction with the default options.
    ///
    /// Opens a physical transaction if none is pending; otherwise joins the
    /// pending one without a driver round-trip and reports
    /// [`BeginStatus::Nested`]. On failure no handle is issued and the
    /// nesting depth is unchanged.
    pub fn begin(&self) -> TransactionResult<(TransactionHandle, BeginStatus)> {
        self.begin_with(self.inner.config.default_options)
    }

    /// Begin a transaction with specific options.
    ///
    /// The options only apply if a new physical transaction is opened.
    pub fn begin_with(&self, options: TxOptions) -> TransactionResult<(TransactionHandle, BeginStatus)> {
        let inner = &self.inner;
        let (tx, status) = inner
            .manager
            .begin(options, |opts| inner.begin_physical(opts))?;

        let depth = match status {
            BeginStatus::Started => 1,
            BeginStatus::Nested { depth } => depth,
        };
        Ok((TransactionHandle::new(inner.clone(), tx, depth), status))
    }

    /// Begin a transaction, panicking if no physical transaction could be
    /// opened. Joining an open transaction is not a failure.
    pub fn begin_or_panic(&self) -> TransactionHandle {
        self.begin_with_or_panic(self.inner.config.default_options)
    }

    /// [`begin_with`](Self::begin_with), panicking on failure.
    pub fn begin_with_or_panic(&self, options: TxOptions) -> TransactionHandle {
        match self.begin_with(options) {
            Ok((tx, _)) => tx,
            Err(e) => panic!("{e}"),
        }
    }

    /// Execute a function within a transaction, automatically committing or
    /// rolling back.
    pub fn transaction<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&TransactionHandle) -> Result<T, E>,
        E: From<TransactionError>,
    {
        run_in_transaction(self, f)
    }

    /// Execute a function within a transaction with specific options.
    pub fn transaction_with<F, T, E>(&self, options: TxOptions, f: F) -> Result<T, E>
    where
        F: FnOnce(&TransactionHandle) -> Result<T, E>,
        E: From<TransactionError>,
    {
        run_in_transaction_with(self, options, f)
    }

    /// Current nesting depth; zero when no transaction is open.
    pub fn depth(&self) -> u64 {
        self.inner.manager.depth()
    }

    /// Check if a physical transaction is open.
    ///
    /// Stays true after the database aborts the transaction on its own,
    /// until every handle is finalized; statements fail with an aborted
    /// error in the meantime.
    pub fn in_transaction(&self) -> bool {
        self.inner.manager.is_active()
    }

    /// Advisory rollbacks recorded over the connection's lifetime.
    pub fn rollbacks(&self) -> &RollbackTracker {
        self.inner.manager.rollbacks()
    }

    pub fn stats(&self) -> TxStats {
        self.inner.manager.stats()
    }

    // ==================== Statements ====================

    /// Execute a statement that returns no rows.
    pub fn execute(&self, sql: &str, params: &[Value]) -> TransactionResult<ExecResult> {
        self.inner.run(|c| c.execute(sql, params))
    }

    /// Run a query and collect its rows.
    pub fn query(&self, sql: &str, params: &[Value]) -> TransactionResult<Rows> {
        self.inner.run(|c| c.query(sql, params))
    }

    /// Decode the first row of a query into a record.
    pub fn get<T: DeserializeOwned>(&self, sql: &str, params: &[Value]) -> TransactionResult<T> {
        self.inner.run(|c| c.query(sql, params)?.first()?.decode())
    }

    /// Decode every row of a query into records.
    pub fn select<T: DeserializeOwned>(&self, sql: &str, params: &[Value]) -> TransactionResult<Vec<T>> {
        self.inner.run(|c| c.query(sql, params)?.decode_all())
    }

    /// Handle for cancelling a running statement from another thread, if the
    /// driver supports it.
    pub fn interrupt_handle(&self) -> Option<InterruptHandle> {
        self.inner.interrupt.clone().map(InterruptHandle::new)
    }

    // ==================== Lifecycle ====================

    /// Close the connection.
    ///
    /// Open transactions are neither committed nor rolled back; finish them
    /// first. Closing an already closed connection is a no-op.
    pub fn close(&self) -> TransactionResult<()> {
        let conn = self.inner.conn.lock().take();
        match conn {
            Some(conn) => conn
                .close()
                .map_err(|e| TransactionError::from(ConnectionError::Close(e))),
            None => Ok(()),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.conn.lock().is_none()
    }
}

impl fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("driver", &self.inner.driver)
            .field("address", &self.inner.config.address)
            .field("depth", &self.depth())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Barrier;
    use std::time::Duration;

    use proptest::prelude::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    use crate::driver::sqlite::SqliteConnection;
    use crate::driver::DriverError;
    use crate::params;
    use crate::transaction::ErrorKind;

    const SCHEMA: &str = "CREATE TABLE person (first_name TEXT, last_name TEXT, email TEXT)";

    #[derive(Debug, Deserialize)]
    struct Person {
        first_name: String,
    }

    fn setup() -> ConnectionHandle {
        let db = ConnectionHandle::open("sqlite", ":memory:").unwrap();
        db.execute(SCHEMA, params![]).unwrap();
        db
    }

    fn insert(tx: &TransactionHandle, first: &str) {
        tx.execute(
            "INSERT INTO person (first_name, last_name, email) VALUES (?, ?, ?)",
            params![first, "Hex", "x00.x7f@gmail.com"],
        )
        .unwrap();
    }

    fn names(db: &ConnectionHandle) -> Vec<String> {
        db.select::<Person>("SELECT first_name FROM person ORDER BY first_name", params![])
            .unwrap()
            .into_iter()
            .map(|p| p.first_name)
            .collect()
    }

    #[derive(Default)]
    struct Faults {
        fail_begin: AtomicBool,
        fail_commit: AtomicBool,
        fail_rollback: AtomicBool,
    }

    /// Wraps a real SQLite connection and fails on demand.
    struct FaultyConnection {
        inner: SqliteConnection,
        faults: Arc<Faults>,
    }

    impl Connection for FaultyConnection {
        fn begin(&mut self, options: &TxOptions) -> DriverResult<()> {
            if self.faults.fail_begin.load(Ordering::SeqCst) {
                return Err(DriverError::Other("injected begin failure".into()));
            }
            self.inner.begin(options)
        }

        fn commit(&mut self) -> DriverResult<()> {
            if self.faults.fail_commit.load(Ordering::SeqCst) {
                self.inner.rollback()?;
                return Err(DriverError::Other("injected commit failure".into()));
            }
            self.inner.commit()
        }

        fn rollback(&mut self) -> DriverResult<()> {
            self.inner.rollback()?;
            if self.faults.fail_rollback.load(Ordering::SeqCst) {
                return Err(DriverError::Other("injected rollback failure".into()));
            }
            Ok(())
        }

        fn execute(&mut self, sql: &str, params: &[Value]) -> DriverResult<ExecResult> {
            self.inner.execute(sql, params)
        }

        fn query(&mut self, sql: &str, params: &[Value]) -> DriverResult<Rows> {
            self.inner.query(sql, params)
        }

        fn close(self: Box<Self>) -> DriverResult<()> {
            Box::new(self.inner).close()
        }
    }

    fn faulty_setup() -> (ConnectionHandle, Arc<Faults>) {
        let faults = Arc::new(Faults::default());
        let inner = SqliteConnection::open(&ConnectionConfig::default()).unwrap();
        let db = ConnectionHandle::from_connection(
            "faulty",
            Box::new(FaultyConnection {
                inner,
                faults: faults.clone(),
            }),
        );
        db.execute(SCHEMA, params![]).unwrap();
        (db, faults)
    }

    #[test]
    fn test_nested_commit_persists_all_writes() {
        let db = setup();

        let (outer, status) = db.begin().unwrap();
        assert_eq!(status, BeginStatus::Started);
        insert(&outer, "R1");

        let (nested, status) = db.begin().unwrap();
        assert!(status.is_nested());
        insert(&nested, "R2");

        nested.commit().unwrap();
        assert_eq!(db.depth(), 1);
        assert_eq!(db.stats().physical_commits, 0);

        outer.commit().unwrap();
        assert_eq!(db.depth(), 0);
        assert_eq!(db.stats().physical_commits, 1);
        assert_eq!(names(&db), ["R1", "R2"]);
    }

    #[test]
    fn test_nested_rollback_then_outer_rollback_discards_all() {
        let db = setup();

        let (outer, _) = db.begin().unwrap();
        insert(&outer, "R1");
        let (nested, _) = db.begin().unwrap();
        insert(&nested, "R2");

        nested.rollback().unwrap();
        assert_eq!(db.depth(), 1);
        assert_eq!(db.stats().physical_rollbacks, 0);

        outer.rollback().unwrap();
        assert_eq!(db.depth(), 0);
        assert_eq!(db.stats().physical_rollbacks, 1);
        assert!(names(&db).is_empty());
    }

    #[test]
    fn test_begin_failure_issues_no_handle() {
        let (db, faults) = faulty_setup();
        faults.fail_begin.store(true, Ordering::SeqCst);

        let err = db.begin().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Begin);
        assert_eq!(db.depth(), 0);
        assert_eq!(db.stats().physical_begins, 0);

        faults.fail_begin.store(false, Ordering::SeqCst);
        let (tx, status) = db.begin().unwrap();
        assert_eq!(status, BeginStatus::Started);
        tx.commit().unwrap();
    }

    #[test]
    fn test_nested_begin_skips_the_driver() {
        let (db, faults) = faulty_setup();
        let (outer, _) = db.begin().unwrap();

        faults.fail_begin.store(true, Ordering::SeqCst);
        let (nested, status) = db.begin().unwrap();
        assert_eq!(status, BeginStatus::Nested { depth: 2 });

        nested.commit().unwrap();
        outer.commit().unwrap();
    }

    #[test]
    fn test_commit_failure_surfaces_to_outermost_only() {
        let (db, faults) = faulty_setup();
        let (outer, _) = db.begin().unwrap();
        insert(&outer, "R1");
        let (nested, _) = db.begin().unwrap();

        faults.fail_commit.store(true, Ordering::SeqCst);
        nested.commit().unwrap();

        let err = outer.commit().unwrap_err();
        assert!(matches!(
            err,
            TransactionError::Finalize { op: FinalizeOp::Commit, .. }
        ));
        assert_eq!(db.depth(), 0);
        assert!(names(&db).is_empty());

        // The connection is usable for a fresh transaction afterwards.
        faults.fail_commit.store(false, Ordering::SeqCst);
        let (tx, status) = db.begin().unwrap();
        assert_eq!(status, BeginStatus::Started);
        insert(&tx, "R2");
        tx.commit().unwrap();
        assert_eq!(names(&db), ["R2"]);
    }

    #[test]
    fn test_rollback_failure_surfaces_to_outermost_only() {
        let (db, faults) = faulty_setup();
        let (outer, _) = db.begin().unwrap();
        insert(&outer, "R1");
        let (nested, _) = db.begin().unwrap();

        faults.fail_rollback.store(true, Ordering::SeqCst);
        nested.rollback().unwrap();

        let err = outer.rollback().unwrap_err();
        assert!(matches!(
            err,
            TransactionError::Finalize { op: FinalizeOp::Rollback, .. }
        ));
        assert_eq!(db.depth(), 0);
        assert!(!db.in_transaction());
        assert_eq!(db.stats().physical_rollbacks, 0);

        faults.fail_rollback.store(false, Ordering::SeqCst);
        let (tx, status) = db.begin().unwrap();
        assert_eq!(status, BeginStatus::Started);
        tx.commit().unwrap();
        assert!(names(&db).is_empty());
    }

    fn keyed_setup() -> ConnectionHandle {
        let db = ConnectionHandle::open("sqlite", ":memory:").unwrap();
        db.execute("CREATE TABLE code (id INTEGER PRIMARY KEY)", params![])
            .unwrap();
        db.execute("INSERT INTO code (id) VALUES (1)", params![]).unwrap();
        db
    }

    fn code_count(db: &ConnectionHandle) -> i64 {
        db.query("SELECT COUNT(*) FROM code", params![])
            .unwrap()
            .first()
            .unwrap()
            .get_index(0)
            .unwrap()
    }

    #[test]
    fn test_database_abort_in_nested_handle_discards_unit_of_work() {
        let db = keyed_setup();

        let (outer, _) = db.begin().unwrap();
        outer.execute("INSERT INTO code (id) VALUES (2)", params![]).unwrap();

        let (nested, _) = db.begin().unwrap();
        let err = nested
            .execute("INSERT OR ROLLBACK INTO code (id) VALUES (1)", params![])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Statement);
        assert!(err.is_aborted());

        // Later statements are refused instead of running in autocommit.
        let err = nested
            .execute("INSERT INTO code (id) VALUES (3)", params![])
            .unwrap_err();
        assert!(err.is_aborted());
        nested.commit().unwrap();
        assert!(outer.query("SELECT id FROM code", params![]).unwrap_err().is_aborted());

        outer.rollback().unwrap();
        assert_eq!(db.depth(), 0);
        assert_eq!(code_count(&db), 1);
    }

    #[test]
    fn test_database_abort_fails_outermost_commit() {
        let db = keyed_setup();

        let (outer, _) = db.begin().unwrap();
        outer.execute("INSERT INTO code (id) VALUES (2)", params![]).unwrap();
        assert!(outer
            .execute("INSERT OR ROLLBACK INTO code (id) VALUES (1)", params![])
            .is_err());

        let err = outer.commit().unwrap_err();
        assert!(matches!(
            err,
            TransactionError::Finalize { op: FinalizeOp::Commit, .. }
        ));
        assert!(err.is_aborted());
        assert_eq!(db.depth(), 0);
        assert_eq!(code_count(&db), 1);

        let (tx, status) = db.begin().unwrap();
        assert_eq!(status, BeginStatus::Started);
        tx.execute("INSERT INTO code (id) VALUES (2)", params![]).unwrap();
        tx.commit().unwrap();
        assert_eq!(code_count(&db), 2);
    }

    #[test]
    fn test_drop_after_close_resets_depth() {
        let db = setup();
        let (outer, _) = db.begin().unwrap();
        let (nested, _) = db.begin().unwrap();
        db.close().unwrap();

        drop(nested);
        assert_eq!(db.depth(), 1);
        drop(outer);
        assert_eq!(db.depth(), 0);
        assert!(!db.in_transaction());
        assert_eq!(db.stats().physical_rollbacks, 0);
        assert_eq!(db.rollbacks().times(), 1);
    }

    #[test]
    #[should_panic(expected = "injected begin failure")]
    fn test_begin_or_panic_panics_on_driver_failure() {
        let (db, faults) = faulty_setup();
        faults.fail_begin.store(true, Ordering::SeqCst);
        let _tx = db.begin_or_panic();
    }

    #[test]
    fn test_begin_or_panic_accepts_nesting() {
        let db = setup();
        let outer = db.begin_or_panic();
        let nested = db.begin_or_panic();
        assert!(nested.is_nested());
        nested.commit().unwrap();
        outer.commit().unwrap();
    }

    #[test]
    fn test_close_is_idempotent() {
        let db = setup();
        assert!(!db.is_closed());
        db.close().unwrap();
        assert!(db.is_closed());
        db.close().unwrap();

        let err = db.execute("SELECT 1", params![]).unwrap_err();
        assert!(matches!(err, TransactionError::Connection(ConnectionError::Closed)));
        let err = db.begin().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connection);
        assert_eq!(db.depth(), 0);
    }

    #[test]
    fn test_open_unknown_driver() {
        let err = ConnectionHandle::open("oracle", "scott/tiger").unwrap_err();
        assert!(matches!(
            err,
            TransactionError::Connection(ConnectionError::Open { .. })
        ));
    }

    #[test]
    #[should_panic]
    fn test_open_or_panic() {
        ConnectionHandle::open_or_panic("oracle", "scott/tiger");
    }

    #[test]
    fn test_commit_is_durable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nestx.db");
        let address = path.to_string_lossy().to_string();

        let db = ConnectionHandle::open("sqlite", &address).unwrap();
        db.execute(SCHEMA, params![]).unwrap();
        db.transaction(|tx| {
            insert(tx, "R1");
            db.transaction(|nested| {
                insert(nested, "R2");
                Ok::<_, TransactionError>(())
            })
        })
        .unwrap();
        db.close().unwrap();

        let reopened = ConnectionHandle::open("sqlite", &address).unwrap();
        assert_eq!(names(&reopened), ["R1", "R2"]);
    }

    #[test]
    fn test_concurrent_begins_share_one_transaction() {
        let db = setup();
        let threads = 8;
        let barrier = Barrier::new(threads);

        std::thread::scope(|s| {
            for i in 0..threads {
                let db = db.clone();
                let barrier = &barrier;
                s.spawn(move || {
                    let (tx, _) = db.begin().unwrap();
                    barrier.wait();
                    insert(&tx, &format!("T{i}"));
                    barrier.wait();
                    tx.commit().unwrap();
                });
            }
        });

        let stats = db.stats();
        assert_eq!(stats.physical_begins, 1);
        assert_eq!(stats.nested_begins, threads as u64 - 1);
        assert_eq!(stats.physical_commits, 1);
        assert_eq!(names(&db).len(), threads);
        assert_eq!(db.depth(), 0);
    }

    #[test]
    fn test_interrupt_cancels_running_query() {
        let db = setup();
        let handle = db.interrupt_handle().unwrap();
        let done = AtomicBool::new(false);

        let result = std::thread::scope(|s| {
            let worker = s.spawn(|| {
                let result = db.query(
                    "WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c WHERE x < 1000000000) \
                     SELECT count(*) FROM c",
                    params![],
                );
                done.store(true, Ordering::SeqCst);
                result
            });
            while !done.load(Ordering::SeqCst) {
                std::thread::sleep(Duration::from_millis(20));
                handle.interrupt();
            }
            worker.join().unwrap()
        });

        let err = result.unwrap_err();
        assert!(err.is_interrupted());

        // The connection survives the interruption.
        db.execute("INSERT INTO person (first_name) VALUES ('after')", params![])
            .unwrap();
    }

    proptest! {
        #[test]
        fn prop_commit_order_does_not_matter(
            order in (1usize..8).prop_flat_map(|n| Just((0..n).collect::<Vec<_>>()).prop_shuffle())
        ) {
            let db = setup();
            let mut handles: Vec<Option<TransactionHandle>> =
                (0..order.len()).map(|_| Some(db.begin().unwrap().0)).collect();
            prop_assert_eq!(db.stats().physical_begins, 1);
            prop_assert_eq!(db.depth(), order.len() as u64);

            for (step, &i) in order.iter().enumerate() {
                let tx = handles[i].take().unwrap();
                insert(&tx, &format!("H{i}"));
                tx.commit().unwrap();

                let last = step + 1 == order.len();
                prop_assert_eq!(db.stats().physical_commits, u64::from(last));
                prop_assert_eq!(db.depth(), (order.len() - step - 1) as u64);
            }
            prop_assert_eq!(names(&db).len(), order.len());
        }

        #[test]
        fn prop_nested_rollbacks_are_advisory(
            (n, k) in (2u64..8).prop_flat_map(|n| (Just(n), 0..n))
        ) {
            let db = setup();
            let (outer, _) = db.begin().unwrap();
            insert(&outer, "outer");

            let nested: Vec<TransactionHandle> = (1..n).map(|_| db.begin().unwrap().0).collect();
            for (i, tx) in nested.into_iter().enumerate() {
                insert(&tx, &format!("N{i}"));
                if (i as u64) < k {
                    tx.rollback().unwrap();
                } else {
                    tx.commit().unwrap();
                }
            }

            prop_assert_eq!(db.rollbacks().times(), k);
            prop_assert_eq!(db.rollbacks().is_rollbacked(), k >= 1);
            prop_assert_eq!(outer.is_rollbacked(), k >= 1);
            prop_assert_eq!(db.stats().physical_rollbacks, 0);

            outer.commit().unwrap();
            prop_assert_eq!(names(&db).len() as u64, n);
        }
    }
}
