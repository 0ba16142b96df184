//! Retention window and cutoff computation.

use std::ops::RangeInclusive;

use chrono::{DateTime, Datelike, Duration, NaiveDateTime, Utc};

use crate::error::{Error, Result};

/// Years a cutoff may fall in; backup names carry four-digit years.
pub const CUTOFF_YEARS: RangeInclusive<i32> = 1..=9999;

/// Number of days backups are kept before they become deletion candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionWindow {
    days: i64,
}

impl RetentionWindow {
    pub fn from_days(days: i64) -> Self {
        Self { days }
    }

    /// Parses a caller-supplied day count.
    ///
    /// Surrounding whitespace, a leading sign and single underscores between
    /// digits are accepted (`" 30"`, `"+7"`, `"1_000"`). Anything else is an
    /// error; there is no fallback value.
    pub fn from_days_str(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let digits = strip_digit_separators(trimmed).unwrap_or_else(|| trimmed.to_string());
        digits
            .parse::<i64>()
            .map(Self::from_days)
            .map_err(|source| Error::InvalidRetention {
                value: raw.to_string(),
                source,
            })
    }

    pub fn days(&self) -> i64 {
        self.days
    }

    /// Cutoff instant: `now` minus the window, as naive UTC.
    ///
    /// Backups timestamped strictly before the cutoff are candidates. A
    /// negative window puts the cutoff after `now`. A cutoff outside
    /// [`CUTOFF_YEARS`] is an error.
    pub fn cutoff(&self, now: DateTime<Utc>) -> Result<NaiveDateTime> {
        let out_of_range = || Error::CutoffOutOfRange { days: self.days };
        let window = Duration::try_days(self.days).ok_or_else(out_of_range)?;
        now.naive_utc()
            .checked_sub_signed(window)
            .filter(|cutoff| CUTOFF_YEARS.contains(&cutoff.year()))
            .ok_or_else(out_of_range)
    }
}

/// Removes `_` separators placed between digits.
///
/// Returns `None` when an underscore is misplaced, leaving the raw text to
/// fail integer parsing.
fn strip_digit_separators(s: &str) -> Option<String> {
    if !s.contains('_') {
        return Some(s.to_string());
    }

    let body = s.strip_prefix(['+', '-']).unwrap_or(s);
    let bytes = body.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if *b == b'_' {
            let before = i.checked_sub(1).and_then(|j| bytes.get(j));
            let after = bytes.get(i + 1);
            if !before.is_some_and(u8::is_ascii_digit) || !after.is_some_and(u8::is_ascii_digit) {
                return None;
            }
        }
    }
    Some(s.replace('_', ""))
}
