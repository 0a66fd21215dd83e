//! Process shell for the channel logger: configuration, logging setup, the
//! live connection driver and the two entry points used by the `chanlog`
//! binary.

pub mod config;
pub mod connection;
pub mod run;
pub mod tracing_config;

pub use config::{ConfigError, ServerConfig};
