//! Run a unit of work inside a transaction.

use crate::db::ConnectionHandle;
use crate::transaction::error::TransactionError;
use crate::transaction::handle::TransactionHandle;
use crate::transaction::options::TxOptions;

/// Execute a function within a transaction, committing or rolling back.
///
/// If the function returns Ok, the handle is committed; if it returns Err,
/// the handle is rolled back and the original error is returned. If it
/// panics, the handle is rolled back while unwinding. When called inside an
/// open transaction, the commit and rollback follow the usual nesting rules.
pub fn run_in_transaction<T, E, F>(conn: &ConnectionHandle, f: F) -> Result<T, E>
where
    F: FnOnce(&TransactionHandle) -> Result<T, E>,
    E: From<TransactionError>,
{
    run_in_transaction_with(conn, conn.config().default_options, f)
}

/// Like [`run_in_transaction`], with explicit options for the physical
/// transaction. The options are ignored if a transaction is already open.
pub fn run_in_transaction_with<T, E, F>(
    conn: &ConnectionHandle,
    options: TxOptions,
    f: F,
) -> Result<T, E>
where
    F: FnOnce(&TransactionHandle) -> Result<T, E>,
    E: From<TransactionError>,
{
    let (tx, _) = conn.begin_with(options)?;

    match f(&tx) {
        Ok(result) => {
            tx.commit()?;
            Ok(result)
        }
        Err(e) => {
            // The caller's error wins over a failed rollback.
            let _ = tx.rollback();
            Err(e)
        }
    }
}
