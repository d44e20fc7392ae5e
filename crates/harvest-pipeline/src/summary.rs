//! Run summary counters

use crate::outcome::RejectionKind;
use std::collections::BTreeMap;
use std::time::Duration;

/// Counts of every terminal outcome in a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Archives matched by the patterns
    pub archives_total: usize,
    /// Archives opened and walked (fully or until cancellation)
    pub archives_processed: usize,
    /// Archives that could not be opened
    pub archives_failed: usize,
    /// Records written to the result sink
    pub accepted: u64,
    /// Books dropped by the inclusion filter
    pub filtered: u64,
    /// Entry-level rejections by reason
    pub rejected: BTreeMap<RejectionKind, u64>,
    /// Failure-log lines that could not be written
    pub failure_log_dropped: u64,
    /// The run stopped early on a cancellation request
    pub cancelled: bool,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn record_rejection(&mut self, kind: RejectionKind) {
        *self.rejected.entry(kind).or_default() += 1;
    }

    #[must_use]
    pub fn rejected_count(&self, kind: RejectionKind) -> u64 {
        self.rejected.get(&kind).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn rejected_total(&self) -> u64 {
        self.rejected.values().sum()
    }

    /// Rejections that are normal filtering (language mismatch).
    #[must_use]
    pub fn expected_rejections(&self) -> u64 {
        self.rejected
            .iter()
            .filter(|(kind, _)| kind.is_expected())
            .map(|(_, count)| count)
            .sum()
    }

    /// Rejections caused by defective entries.
    #[must_use]
    pub fn defects(&self) -> u64 {
        self.rejected_total() - self.expected_rejections()
    }

    /// Entries that reached a terminal state.
    #[must_use]
    pub fn entries_finished(&self) -> u64 {
        self.accepted + self.filtered + self.rejected_total()
    }
}
