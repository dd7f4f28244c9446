//! Logger setup.
//!
//! The engine only emits through the `log` facade; [`init_logging`] installs
//! an `env_logger` backend for binaries that want one.

mod init;

pub use init::{DEFAULT_FILTER, LoggingConfig, init_logging};
