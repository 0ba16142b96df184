//! Core of the backup retention filter.
//!
//! Parses a listing of backup names, extracts the `backup-YYYYMMDD-HHMMSS`
//! timestamp from each and selects the ones older than the retention cutoff.

pub mod backup;
pub mod error;
pub mod filter;
pub mod literal;
pub mod payload;
pub mod retention;

pub use backup::*;
pub use error::{Error, Result};
pub use filter::*;
pub use payload::*;
pub use retention::*;
