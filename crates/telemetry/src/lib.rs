//! Logging setup for the backup retention tool.

pub mod tracing_setup;

pub use tracing_setup::*;
