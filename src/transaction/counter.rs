//! Atomic counters shared between a connection and its transaction handles.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Number of transaction handles issued and not yet finalized.
///
/// Never drops below zero.
#[derive(Debug, Default)]
pub(crate) struct NestingCounter {
    count: AtomicU64,
}

impl NestingCounter {
    pub(crate) fn get(&self) -> u64 {
        self.count.load(Ordering::Acquire)
    }

    pub(crate) fn is_active(&self) -> bool {
        self.get() > 0
    }

    /// Returns the depth after incrementing.
    pub(crate) fn increment(&self) -> u64 {
        self.count.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Returns the depth after decrementing; saturates at zero.
    pub(crate) fn decrement(&self) -> u64 {
        match self
            .count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
        {
            Ok(prev) => prev - 1,
            Err(_) => 0,
        }
    }
}

impl fmt::Display for NestingCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "active tx counter: {}", self.get())
    }
}

/// Counts rollbacks requested inside a nested scope.
///
/// Such rollbacks are advisory: they undo nothing. The count only grows, so
/// the outermost caller can check whether any inner scope asked to abort
/// before deciding to commit.
#[derive(Debug, Default)]
pub struct RollbackTracker {
    count: AtomicU64,
}

impl RollbackTracker {
    pub(crate) fn increment(&self) {
        self.count.fetch_add(1, Ordering::AcqRel);
    }

    /// Number of advisory rollbacks recorded so far.
    pub fn times(&self) -> u64 {
        self.count.load(Ordering::Acquire)
    }

    pub fn is_rollbacked(&self) -> bool {
        self.times() > 0
    }
}

impl fmt::Display for RollbackTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rollbacked in nested transaction: {}", self.times())
    }
}

/// Snapshot of what a connection has done with its transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TxStats {
    /// Physical transactions opened.
    pub physical_begins: u64,
    /// Begins that joined an already open physical transaction.
    pub nested_begins: u64,
    pub physical_commits: u64,
    pub physical_rollbacks: u64,
    /// Commits that only decremented the depth.
    pub deferred_commits: u64,
    /// Rollbacks that only decremented the depth.
    pub advisory_rollbacks: u64,
}

#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    pub(crate) physical_begins: AtomicU64,
    pub(crate) nested_begins: AtomicU64,
    pub(crate) physical_commits: AtomicU64,
    pub(crate) physical_rollbacks: AtomicU64,
    pub(crate) deferred_commits: AtomicU64,
    pub(crate) advisory_rollbacks: AtomicU64,
}

impl StatsCounters {
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> TxStats {
        TxStats {
            physical_begins: self.physical_begins.load(Ordering::Relaxed),
            nested_begins: self.nested_begins.load(Ordering::Relaxed),
            physical_commits: self.physical_commits.load(Ordering::Relaxed),
            physical_rollbacks: self.physical_rollbacks.load(Ordering::Relaxed),
            deferred_commits: self.deferred_commits.load(Ordering::Relaxed),
            advisory_rollbacks: self.advisory_rollbacks.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_counter_saturates_at_zero() {
        let counter = NestingCounter::default();
        assert!(!counter.is_active());
        assert_eq!(counter.decrement(), 0);
        assert_eq!(counter.get(), 0);

        assert_eq!(counter.increment(), 1);
        assert_eq!(counter.increment(), 2);
        assert_eq!(counter.decrement(), 1);
        assert!(counter.is_active());
        assert_eq!(counter.to_string(), "active tx counter: 1");
    }

    #[test]
    fn test_counter_concurrent_updates() {
        let counter = Arc::new(NestingCounter::default());
        std::thread::scope(|s| {
            for _ in 0..8 {
                let counter = counter.clone();
                s.spawn(move || {
                    for _ in 0..1000 {
                        counter.increment();
                        counter.decrement();
                    }
                });
            }
        });
        assert_eq!(counter.get(), 0);
    }

    #[test]
    fn test_rollback_tracker() {
        let tracker = RollbackTracker::default();
        assert!(!tracker.is_rollbacked());
        tracker.increment();
        tracker.increment();
        assert_eq!(tracker.times(), 2);
        assert!(tracker.is_rollbacked());
        assert_eq!(tracker.to_string(), "rollbacked in nested transaction: 2");
    }
}
