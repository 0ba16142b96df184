//! Backup name timestamp extraction.
//!
//! A backup name carries its creation time as `backup-YYYYMMDD-HHMMSS`
//! anywhere in the string. Nothing else about the name is assumed.

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use std::sync::LazyLock;

/// Embedded timestamp pattern: date digits, then time digits.
pub const BACKUP_NAME_PATTERN: &str = r"backup-([0-9]{8})-([0-9]{6})";

/// Compiled backup name regex (lazy initialization).
static BACKUP_NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(BACKUP_NAME_PATTERN).expect("invalid backup name pattern"));

/// Result of looking for a timestamp in a backup name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extracted {
    /// No `backup-YYYYMMDD-HHMMSS` substring.
    Missing,
    /// The substring is present but the digits are not a calendar date/time.
    InvalidDate,
    Timestamp(NaiveDateTime),
}

/// A backup name borrowed from the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackupName<'a>(&'a str);

impl<'a> BackupName<'a> {
    pub fn new(name: &'a str) -> Self {
        Self(name)
    }

    pub fn as_str(&self) -> &'a str {
        self.0
    }

    /// Searches the name for the first timestamp match and validates it.
    pub fn extract(&self) -> Extracted {
        let Some(caps) = BACKUP_NAME_REGEX.captures(self.0) else {
            return Extracted::Missing;
        };
        match parse_digits(&caps[1], &caps[2]) {
            Some(ts) => Extracted::Timestamp(ts),
            None => Extracted::InvalidDate,
        }
    }

    /// Timestamp embedded in the name, if any.
    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        match self.extract() {
            Extracted::Timestamp(ts) => Some(ts),
            _ => None,
        }
    }
}

/// Interprets `YYYYMMDD` and `HHMMSS` digit groups.
///
/// Years start at 1 and seconds stop at 59; leap seconds are not valid.
fn parse_digits(date: &str, time: &str) -> Option<NaiveDateTime> {
    let field = |s: &str, range: std::ops::Range<usize>| s.get(range)?.parse::<u32>().ok();

    let year = field(date, 0..4)?;
    let month = field(date, 4..6)?;
    let day = field(date, 6..8)?;
    let hour = field(time, 0..2)?;
    let minute = field(time, 2..4)?;
    let second = field(time, 4..6)?;

    if year < 1 {
        return None;
    }
    NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, day)?.and_hms_opt(hour, minute, second)
}
