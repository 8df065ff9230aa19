//! Options for opening a physical transaction.
//!
//! These only matter for the outermost begin. A nested begin joins the
//! physical transaction that is already open and its options are ignored.

use std::fmt;

/// How the physical transaction acquires its locks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TxBehavior {
    /// Locks are taken lazily on first read or write.
    #[default]
    Deferred,

    /// A write lock is taken at BEGIN, so the first write cannot fail with
    /// a busy error halfway through the unit of work.
    Immediate,

    /// Like `Immediate`, and readers on other connections are excluded too.
    Exclusive,
}

impl fmt::Display for TxBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxBehavior::Deferred => write!(f, "DEFERRED"),
            TxBehavior::Immediate => write!(f, "IMMEDIATE"),
            TxBehavior::Exclusive => write!(f, "EXCLUSIVE"),
        }
    }
}

/// Parse behavior from string (SQL keyword).
impl std::str::FromStr for TxBehavior {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "DEFERRED" => Ok(TxBehavior::Deferred),
            "IMMEDIATE" => Ok(TxBehavior::Immediate),
            "EXCLUSIVE" => Ok(TxBehavior::Exclusive),
            _ => Err(format!("unknown transaction behavior: {}", s)),
        }
    }
}

/// Options passed to the driver when a physical transaction is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TxOptions {
    pub behavior: TxBehavior,
    /// Reject writes for the lifetime of the physical transaction.
    pub read_only: bool,
}

impl TxOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn behavior(mut self, behavior: TxBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn read_only(mut self, value: bool) -> Self {
        self.read_only = value;
        self
    }
}
