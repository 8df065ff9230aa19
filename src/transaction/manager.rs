//! Transaction manager - arbitrates begin and finalize for one connection.
//!
//! The manager owns the nesting counter and a single slot holding the
//! physical transaction currently open. Begin and finalize run under the
//! slot lock, so "depth 0 -> open and publish" and "depth n -> n+1" are one
//! transition each, and a finalize taking the depth to zero cannot interleave
//! with a begin on another thread.
//!
//! The manager never talks to the driver itself; callers pass the physical
//! operation as a closure.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use ulid::Ulid;

use crate::transaction::counter::{NestingCounter, RollbackTracker, StatsCounters, TxStats};
use crate::transaction::error::{FinalizeOp, TransactionResult};
use crate::transaction::options::TxOptions;

/// The physical transaction shared by every handle of one unit of work.
#[derive(Debug)]
pub(crate) struct PhysicalTransaction {
    pub(crate) id: String,
    pub(crate) options: TxOptions,
    pub(crate) started_at: DateTime<Utc>,
    /// Advisory rollbacks requested within this physical transaction.
    pub(crate) rollbacks: RollbackTracker,
}

impl PhysicalTransaction {
    fn new(options: TxOptions) -> Self {
        Self {
            id: Ulid::new().to_string().to_lowercase(),
            options,
            started_at: Utc::now(),
            rollbacks: RollbackTracker::default(),
        }
    }
}

/// How a begin was satisfied.
///
/// `Nested` is informational, never a failure: the handle returned with it
/// is fully usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeginStatus {
    /// A new physical transaction was opened.
    Started,
    /// The physical transaction already open was joined.
    Nested {
        /// Nesting depth including the new handle.
        depth: u64,
    },
}

impl BeginStatus {
    pub fn is_nested(&self) -> bool {
        matches!(self, BeginStatus::Nested { .. })
    }
}

/// What a commit or rollback actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Finalized {
    /// Other handles are still open; nothing was sent to the driver.
    Deferred { remaining: u64 },
    /// The physical transaction was committed or rolled back.
    Physical,
}

#[derive(Debug, Default)]
pub(crate) struct TransactionManager {
    slot: Mutex<Option<Arc<PhysicalTransaction>>>,
    depth: NestingCounter,
    rollbacks: RollbackTracker,
    stats: StatsCounters,
}

impl TransactionManager {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Current nesting depth.
    pub(crate) fn depth(&self) -> u64 {
        self.depth.get()
    }

    pub(crate) fn is_active(&self) -> bool {
        self.depth.is_active()
    }

    pub(crate) fn rollbacks(&self) -> &RollbackTracker {
        &self.rollbacks
    }

    pub(crate) fn stats(&self) -> TxStats {
        self.stats.snapshot()
    }

    /// Issue a handle onto the current physical transaction, opening one with
    /// `open` if none is pending.
    ///
    /// On failure the depth is left untouched.
    pub(crate) fn begin<F>(
        &self,
        options: TxOptions,
        open: F,
    ) -> TransactionResult<(Arc<PhysicalTransaction>, BeginStatus)>
    where
        F: FnOnce(&TxOptions) -> TransactionResult<()>,
    {
        let mut slot = self.slot.lock();

        if let Some(tx) = slot.as_ref() {
            let depth = self.depth.increment();
            StatsCounters::bump(&self.stats.nested_begins);
            return Ok((tx.clone(), BeginStatus::Nested { depth }));
        }

        open(&options)?;

        let tx = Arc::new(PhysicalTransaction::new(options));
        *slot = Some(tx.clone());
        self.depth.increment();
        StatsCounters::bump(&self.stats.physical_begins);
        Ok((tx, BeginStatus::Started))
    }

    /// Release one handle of `tx`.
    ///
    /// If other handles remain, only the depth changes (and a rollback is
    /// recorded as advisory). The release that takes the depth to zero runs
    /// `physical` and clears the slot whether or not it succeeds.
    pub(crate) fn finalize<F>(
        &self,
        tx: &PhysicalTransaction,
        op: FinalizeOp,
        physical: F,
    ) -> TransactionResult<Finalized>
    where
        F: FnOnce() -> TransactionResult<()>,
    {
        let mut slot = self.slot.lock();

        let remaining = self.depth.decrement();
        if remaining > 0 {
            match op {
                FinalizeOp::Commit => StatsCounters::bump(&self.stats.deferred_commits),
                FinalizeOp::Rollback => {
                    self.rollbacks.increment();
                    tx.rollbacks.increment();
                    StatsCounters::bump(&self.stats.advisory_rollbacks);
                }
            }
            return Ok(Finalized::Deferred { remaining });
        }

        slot.take();
        physical()?;
        match op {
            FinalizeOp::Commit => StatsCounters::bump(&self.stats.physical_commits),
            FinalizeOp::Rollback => StatsCounters::bump(&self.stats.physical_rollbacks),
        }
        Ok(Finalized::Physical)
    }
}
