//! Retention filter: selects payload items older than the cutoff.

use std::fmt;

use chrono::NaiveDateTime;
use tracing::{debug, trace};

use crate::backup::{BackupName, Extracted};
use crate::payload::PayloadItem;

/// Destination directory joined in front of every candidate name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationPrefix(String);

impl DestinationPrefix {
    /// Strips every trailing `/` from the raw prefix.
    pub fn new(raw: &str) -> Self {
        Self(raw.trim_end_matches('/').to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn candidate_path(&self, name: &str) -> String {
        format!("{}/{}", self.0, name)
    }
}

/// A backup selected for deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionCandidate {
    /// Original backup name from the payload.
    pub name: String,
    pub timestamp: NaiveDateTime,
    /// `<prefix>/<name>`.
    pub path: String,
}

impl fmt::Display for DeletionCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

/// Per-item outcome of the filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    NotText,
    NoTimestamp,
    InvalidDate,
    /// Timestamp at or after the cutoff.
    Retained(NaiveDateTime),
    Selected(DeletionCandidate),
}

/// Counts gathered during one scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub scanned: usize,
    pub non_text: usize,
    pub unmatched: usize,
    pub invalid_date: usize,
    pub retained: usize,
    pub selected: usize,
}

impl FilterStats {
    fn record(&mut self, verdict: &Verdict) {
        self.scanned += 1;
        match verdict {
            Verdict::NotText => self.non_text += 1,
            Verdict::NoTimestamp => self.unmatched += 1,
            Verdict::InvalidDate => self.invalid_date += 1,
            Verdict::Retained(_) => self.retained += 1,
            Verdict::Selected(_) => self.selected += 1,
        }
    }

    /// Items skipped without a usable timestamp.
    pub fn skipped(&self) -> usize {
        self.non_text + self.unmatched + self.invalid_date
    }
}

/// Candidates in input order plus the scan counts.
#[derive(Debug, Clone, Default)]
pub struct FilterOutcome {
    pub candidates: Vec<DeletionCandidate>,
    pub stats: FilterStats,
}

pub struct RetentionFilter {
    cutoff: NaiveDateTime,
    prefix: DestinationPrefix,
}

impl RetentionFilter {
    pub fn new(cutoff: NaiveDateTime, prefix: DestinationPrefix) -> Self {
        Self { cutoff, prefix }
    }

    pub fn cutoff(&self) -> NaiveDateTime {
        self.cutoff
    }

    pub fn prefix(&self) -> &DestinationPrefix {
        &self.prefix
    }

    /// Classifies a single payload item.
    pub fn evaluate(&self, item: &PayloadItem) -> Verdict {
        let Some(name) = item.as_text() else {
            return Verdict::NotText;
        };

        match BackupName::new(name).extract() {
            Extracted::Missing => Verdict::NoTimestamp,
            Extracted::InvalidDate => Verdict::InvalidDate,
            Extracted::Timestamp(ts) if ts < self.cutoff => Verdict::Selected(DeletionCandidate {
                name: name.to_string(),
                timestamp: ts,
                path: self.prefix.candidate_path(name),
            }),
            Extracted::Timestamp(ts) => Verdict::Retained(ts),
        }
    }

    /// Scans all items, keeping input order.
    pub fn scan(&self, items: &[PayloadItem]) -> FilterOutcome {
        let mut outcome = FilterOutcome::default();

        for (index, item) in items.iter().enumerate() {
            let verdict = self.evaluate(item);
            outcome.stats.record(&verdict);
            match verdict {
                Verdict::Selected(candidate) => outcome.candidates.push(candidate),
                Verdict::Retained(ts) => trace!(index, timestamp = %ts, "Retained"),
                skipped => trace!(index, verdict = ?skipped, "Skipped item"),
            }
        }

        debug!(
            cutoff = %self.cutoff,
            scanned = outcome.stats.scanned,
            selected = outcome.stats.selected,
            retained = outcome.stats.retained,
            skipped = outcome.stats.skipped(),
            "Retention scan complete"
        );
        outcome
    }

    /// Deletion candidates in input order.
    pub fn candidates(&self, items: &[PayloadItem]) -> Vec<DeletionCandidate> {
        self.scan(items).candidates
    }
}
