//! Unified error types for the retention filter.
//!
//! Per-item failures (missing timestamp, impossible date, non-text item) are
//! not errors: the filter skips them. Only caller input that cannot be
//! recovered from surfaces here.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the retention filter.
#[derive(Debug, Error)]
pub enum Error {
    /// Retention days did not parse as an integer.
    #[error("invalid retention days {value:?}: {source}")]
    InvalidRetention {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    /// `now - days` falls outside the representable date range.
    #[error("retention of {days} days puts the cutoff out of range")]
    CutoffOutOfRange { days: i64 },

    /// Literal-notation payload rejected at a byte offset.
    #[error("literal syntax error at byte {offset}: {message}")]
    Literal { offset: usize, message: String },
}

impl Error {
    pub fn literal(offset: usize, msg: impl Into<String>) -> Self {
        Self::Literal {
            offset,
            message: msg.into(),
        }
    }

    /// Byte offset of a literal syntax error, if this is one.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::Literal { offset, .. } => Some(*offset),
            _ => None,
        }
    }
}
