//! Result sink and failure log
//!
//! Both are owned by a single writer thread fed through a channel of
//! [`SinkEvent`]s, so output lines never interleave.
//!
//! The result sink writes one JSON object per line. The failure log is a
//! plain-text file with one line per rejected entry:
//!
//! ```text
//! 2024/03/01 12:00:00 ERROR missing_body lib/f.zip/1001.fb2: Expected exactly one body, found 0
//! 2024/03/01 12:00:00 INFO language_mismatch lib/f.zip/1002.fb2: Entry is not in Russian: en
//! ```

use crate::error::SinkError;
use crate::outcome::{ExtractionOutcome, Rejection};
use crate::summary::RunSummary;
use chrono::Local;
use crossbeam_channel::Receiver;
use harvest_ebook::{book_id, ExtractedBook};
use log::warn;
use std::fmt;
use std::io::{self, Write};

/// Timestamp layout of failure-log lines.
pub const LOG_TIME_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Messages consumed by the writer thread.
#[derive(Debug)]
pub enum SinkEvent {
    Outcome(ExtractionOutcome),
    /// An archive could not be opened; logged but not counted as an entry
    ArchiveFailed(Rejection),
}

/// Newline-delimited JSON writer for accepted books.
#[derive(Debug)]
pub struct ResultSink<W: Write> {
    writer: W,
    written: u64,
    poisoned: bool,
}

impl<W: Write> ResultSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            written: 0,
            poisoned: false,
        }
    }

    /// Append one record as a single line.
    ///
    /// The record is encoded in full before anything is written, so an
    /// encoding failure leaves no partial line behind. A failed write may
    /// leave part of a line in the output; the sink then refuses every
    /// later record so nothing is appended to the fragment.
    ///
    /// # Errors
    ///
    /// Returns `SinkError` if encoding or writing fails, and
    /// `SinkError::Poisoned` for every record after a failed write.
    pub fn write(&mut self, book: &ExtractedBook) -> Result<(), SinkError> {
        if self.poisoned {
            return Err(SinkError::Poisoned);
        }
        let mut line = serde_json::to_vec(book)?;
        line.push(b'\n');
        if let Err(e) = self.writer.write_all(&line) {
            self.poisoned = true;
            return Err(e.into());
        }
        self.written += 1;
        Ok(())
    }

    /// Whether a failed write has stopped this sink.
    #[must_use]
    pub const fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    #[must_use]
    pub const fn written(&self) -> u64 {
        self.written
    }

    /// # Errors
    ///
    /// Returns the underlying IO error.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Severity column of the failure log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => f.write_str("INFO"),
            Self::Error => f.write_str("ERROR"),
        }
    }
}

/// Plain-text log of entries that produced no record.
///
/// Write failures are counted and dropped, never retried. Lines still
/// buffered when a flush fails count as dropped too.
#[derive(Debug)]
pub struct FailureLog<W: Write> {
    writer: W,
    audit_filtered: bool,
    dropped: u64,
    /// Lines accepted by the writer since the last successful flush
    unflushed: u64,
}

impl<W: Write> FailureLog<W> {
    /// `audit_filtered` also logs books dropped by the inclusion filter.
    pub fn new(writer: W, audit_filtered: bool) -> Self {
        Self {
            writer,
            audit_filtered,
            dropped: 0,
            unflushed: 0,
        }
    }

    pub fn record(&mut self, rejection: &Rejection) {
        let level = if rejection.kind.is_expected() {
            LogLevel::Info
        } else {
            LogLevel::Error
        };
        self.write_line(level, rejection.kind.as_str(), &rejection.id(), &rejection.detail);
    }

    pub fn record_filtered(&mut self, archive: &str, entry: &str) {
        if self.audit_filtered {
            self.write_line(
                LogLevel::Info,
                "sampled_out",
                &book_id(archive, entry),
                "discarded by inclusion filter",
            );
        }
    }

    fn write_line(&mut self, level: LogLevel, reason: &str, id: &str, detail: &str) {
        let detail = detail.replace(['\n', '\r'], " ");
        let line = format!(
            "{} {level} {reason} {id}: {detail}\n",
            Local::now().format(LOG_TIME_FORMAT)
        );
        if self.writer.write_all(line.as_bytes()).is_err() {
            self.dropped += 1;
        } else {
            self.unflushed += 1;
        }
    }

    #[must_use]
    pub const fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Flush the writer. On failure every line written since the last
    /// successful flush is counted as dropped.
    ///
    /// # Errors
    ///
    /// Returns the underlying IO error.
    pub fn flush(&mut self) -> io::Result<()> {
        let flushed = self.writer.flush();
        if flushed.is_err() {
            self.dropped += self.unflushed;
        }
        self.unflushed = 0;
        flushed
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Consume events until every sender is gone, tallying outcome counts.
///
/// Archive-level fields of the returned summary are left at zero.
pub fn drain<O: Write, L: Write>(
    events: &Receiver<SinkEvent>,
    results: &mut ResultSink<O>,
    failures: &mut FailureLog<L>,
) -> RunSummary {
    let mut summary = RunSummary::default();

    for event in events {
        match event {
            SinkEvent::Outcome(ExtractionOutcome::Accepted(book)) => {
                match results.write(&book) {
                    Ok(()) => summary.accepted += 1,
                    Err(e) => {
                        warn!("Failed to write {}: {e}", book.id);
                        let rejection = Rejection::serialization(&book, &e);
                        failures.record(&rejection);
                        summary.record_rejection(rejection.kind);
                    }
                }
            }
            SinkEvent::Outcome(ExtractionOutcome::Rejected(rejection)) => {
                failures.record(&rejection);
                summary.record_rejection(rejection.kind);
            }
            SinkEvent::Outcome(ExtractionOutcome::Filtered { archive, entry }) => {
                failures.record_filtered(&archive, &entry);
                summary.filtered += 1;
            }
            SinkEvent::ArchiveFailed(rejection) => failures.record(&rejection),
        }
    }

    summary.failure_log_dropped = failures.dropped();
    summary
}
