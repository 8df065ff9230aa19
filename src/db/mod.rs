//! Connection-level API: opening, configuring and closing a connection, and
//! beginning transactions on it.

mod config;
mod connection;

pub use config::{ConnectionConfig, ENV_DRIVER, ENV_DSN};
pub use connection::ConnectionHandle;
pub(crate) use connection::ConnectionInner;
