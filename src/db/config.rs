//! Connection configuration.

use std::time::Duration;

use crate::driver::sqlite::MEMORY;
use crate::transaction::{TxBehavior, TxOptions};

/// Environment variable naming the driver.
pub const ENV_DRIVER: &str = "NESTX_DRIVER";
/// Environment variable holding the connection address.
pub const ENV_DSN: &str = "NESTX_DSN";

/// Connection configuration options.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Registered driver name.
    pub driver: String,
    /// Driver-specific address; a file path or `:memory:` for SQLite.
    pub address: String,
    /// Create the database if it doesn't exist.
    pub create_if_missing: bool,
    /// How long to wait on a locked database before failing.
    pub busy_timeout: Duration,
    /// Enforce foreign key constraints.
    pub foreign_keys: bool,
    /// Options used when a begin does not pass its own.
    pub default_options: TxOptions,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            driver: "sqlite".to_string(),
            address: MEMORY.to_string(),
            create_if_missing: true,
            busy_timeout: Duration::from_secs(5),
            foreign_keys: true,
            default_options: TxOptions::default(),
        }
    }
}

impl ConnectionConfig {
    /// Create a new configuration with the given address.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Default::default()
        }
    }

    /// Read driver and address from `NESTX_DRIVER` and `NESTX_DSN`, falling
    /// back to the defaults for whichever is unset.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(driver) = lookup(ENV_DRIVER).filter(|v| !v.is_empty()) {
            config.driver = driver;
        }
        if let Some(address) = lookup(ENV_DSN).filter(|v| !v.is_empty()) {
            config.address = address;
        }
        config
    }

    /// Set the driver name.
    pub fn driver(mut self, value: impl Into<String>) -> Self {
        self.driver = value.into();
        self
    }

    /// Set create_if_missing flag.
    pub fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Set the busy timeout.
    pub fn busy_timeout(mut self, value: Duration) -> Self {
        self.busy_timeout = value;
        self
    }

    /// Set foreign_keys flag.
    pub fn foreign_keys(mut self, value: bool) -> Self {
        self.foreign_keys = value;
        self
    }

    /// Set the default transaction options.
    pub fn default_options(mut self, value: TxOptions) -> Self {
        self.default_options = value;
        self
    }

    /// Shorthand for setting the default transaction behavior.
    pub fn behavior(mut self, value: TxBehavior) -> Self {
        self.default_options.behavior = value;
        self
    }
}
