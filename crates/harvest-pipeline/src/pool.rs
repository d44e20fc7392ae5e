//! Extraction worker pool
//!
//! Archives are processed one after another. For each archive a fixed set
//! of worker threads takes entries over a rendezvous channel; the thread
//! walking the archive blocks until a worker is free. Workers run
//! decode, parse and filter, then hand the outcome to the writer thread.
//!
//! ```text
//! [Archive walker] --ArchiveEntry--> [Worker x N] --SinkEvent--> [Writer]
//!   (one archive)     bounded(0)                    bounded(2N)   (sink + log)
//! ```

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::filter::{Decision, InclusionFilter};
use crate::outcome::{ExtractionOutcome, Rejection};
use crate::random::{RandomSource, SeededRandom, ThreadRandom};
use crate::sink::{self, FailureLog, ResultSink, SinkEvent};
use crate::summary::RunSummary;
use crossbeam_channel::{bounded, Sender};
use harvest_archive::{ArchiveEntry, ArchiveReader, ArchiveSet};
use harvest_ebook::extract_book;
use log::{debug, info, warn};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

/// Shared flag that stops a run from submitting further entries.
///
/// Entries already handed to a worker still finish and are written in full.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Receives progress notifications during a run.
///
/// `entry_finished` is called from worker threads.
pub trait ProgressObserver: Send + Sync {
    fn archive_started(&self, _path: &Path, _entries: usize) {}
    fn entry_finished(&self, _path: &Path) {}
    fn archive_finished(&self, _path: &Path) {}
}

/// Observer that ignores every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {}

enum ArchiveStatus {
    Processed,
    Failed,
    Cancelled,
}

/// A configured extraction run.
pub struct Pipeline {
    config: PipelineConfig,
    filter: InclusionFilter,
    random: Box<dyn RandomSource>,
    observer: Box<dyn ProgressObserver>,
    cancel: CancellationToken,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Build a pipeline from a validated configuration.
    ///
    /// A configured seed selects [`SeededRandom`]; otherwise sampling uses
    /// [`ThreadRandom`].
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Config` if the configuration is invalid.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;

        let random: Box<dyn RandomSource> = match config.seed {
            Some(seed) => Box::new(SeededRandom::new(seed)),
            None => Box::new(ThreadRandom),
        };
        let filter = InclusionFilter::new(config.fiction_prefixes.clone(), config.discard_probability);

        Ok(Self {
            config,
            filter,
            random,
            observer: Box::new(NoProgress),
            cancel: CancellationToken::new(),
        })
    }

    #[must_use]
    pub fn with_random(mut self, random: impl RandomSource + 'static) -> Self {
        self.random = Box::new(random);
        self
    }

    #[must_use]
    pub fn with_observer(mut self, observer: impl ProgressObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Decode, parse and filter one entry.
    pub fn process_entry(&self, entry: ArchiveEntry) -> ExtractionOutcome {
        let ArchiveEntry {
            archive,
            name,
            contents,
        } = entry;

        match extract_book(&archive, &name, &contents, self.config.truncate_to) {
            Ok(book) => match self.filter.decide(&book.id, &book.genres, self.random.as_ref()) {
                Decision::Keep => ExtractionOutcome::Accepted(book),
                Decision::Discard => {
                    debug!("Sampled out {}", book.id);
                    ExtractionOutcome::Filtered {
                        archive,
                        entry: name,
                    }
                }
            },
            Err(e) => ExtractionOutcome::Rejected(Rejection::from_ebook(archive, name, &e)),
        }
    }

    /// Run over every archive, writing to the configured files.
    ///
    /// Both files are created (or truncated) before the first archive is
    /// opened.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Output` if either file cannot be created and
    /// `PipelineError::Flush` if the results cannot be flushed at the end.
    pub fn run(&self, archives: &ArchiveSet) -> Result<RunSummary> {
        let output = create(&self.config.output_path)?;
        let failure_log = create(&self.config.failure_log_path)?;
        self.run_with_writers(archives, BufWriter::new(output), BufWriter::new(failure_log))
    }

    /// Run over every archive, writing to the given sinks.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Flush` if the results cannot be flushed and
    /// `PipelineError::WriterPanicked` if the writer thread dies.
    pub fn run_with_writers<O, L>(
        &self,
        archives: &ArchiveSet,
        output: O,
        failure_log: L,
    ) -> Result<RunSummary>
    where
        O: Write + Send,
        L: Write + Send,
    {
        let started = Instant::now();
        info!("Found {} zip files", archives.len());

        let (events_tx, events_rx) = bounded::<SinkEvent>(self.config.concurrency * 2);
        let audit_filtered = self.config.audit_filtered;

        let mut processed = 0;
        let mut failed = 0;
        let mut cancelled = false;

        let joined = thread::scope(|scope| {
            let writer = scope.spawn(move || {
                let mut results = ResultSink::new(output);
                let mut failures = FailureLog::new(failure_log, audit_filtered);
                let mut summary = sink::drain(&events_rx, &mut results, &mut failures);
                if let Err(e) = failures.flush() {
                    warn!("Failed to flush failure log: {e}");
                }
                summary.failure_log_dropped = failures.dropped();
                (summary, results.flush())
            });

            for path in archives {
                if self.cancel.is_cancelled() {
                    cancelled = true;
                    break;
                }
                match self.process_archive(path, &events_tx) {
                    ArchiveStatus::Processed => processed += 1,
                    ArchiveStatus::Failed => failed += 1,
                    ArchiveStatus::Cancelled => {
                        processed += 1;
                        cancelled = true;
                        break;
                    }
                }
            }

            drop(events_tx);
            writer.join()
        });

        let (mut summary, flushed) = joined.map_err(|_| PipelineError::WriterPanicked)?;
        flushed.map_err(PipelineError::Flush)?;

        summary.archives_total = archives.len();
        summary.archives_processed = processed;
        summary.archives_failed = failed;
        summary.cancelled = cancelled;
        summary.elapsed = started.elapsed();

        if cancelled {
            warn!("Run cancelled after {processed} archives");
        }
        info!(
            "Done: {} accepted, {} filtered, {} rejected in {:.2?}",
            summary.accepted,
            summary.filtered,
            summary.rejected_total(),
            summary.elapsed
        );

        Ok(summary)
    }

    fn process_archive(&self, path: &Path, events: &Sender<SinkEvent>) -> ArchiveStatus {
        let mut reader = match ArchiveReader::open(path) {
            Ok(reader) => reader,
            Err(e) => {
                warn!("Failed to open {}: {e}", path.display());
                // writer only disconnects after every sender is dropped
                let _ = events.send(SinkEvent::ArchiveFailed(Rejection::archive_open(path, &e)));
                return ArchiveStatus::Failed;
            }
        };

        info!("Reading data from {}", path.display());
        self.observer.archive_started(path, reader.file_count());

        let concurrency = self.config.concurrency;
        // rendezvous: an entry is only read once a worker is free to take it
        let (entry_tx, entry_rx) = bounded::<ArchiveEntry>(0);
        let mut status = ArchiveStatus::Processed;

        thread::scope(|scope| {
            for _ in 0..concurrency {
                let entry_rx = entry_rx.clone();
                let events = events.clone();
                scope.spawn(move || {
                    for entry in entry_rx {
                        let outcome = self.process_entry(entry);
                        if events.send(SinkEvent::Outcome(outcome)).is_err() {
                            break;
                        }
                        self.observer.entry_finished(path);
                    }
                });
            }
            drop(entry_rx);

            for item in reader.entries() {
                if self.cancel.is_cancelled() {
                    status = ArchiveStatus::Cancelled;
                    break;
                }
                match item {
                    Ok(entry) => {
                        if entry_tx.send(entry).is_err() {
                            break;
                        }
                    }
                    Err(failure) => {
                        warn!("Failed to read {}/{}: {}", failure.archive, failure.name, failure.error);
                        let rejection = Rejection::from_entry_error(failure);
                        if events
                            .send(SinkEvent::Outcome(ExtractionOutcome::Rejected(rejection)))
                            .is_err()
                        {
                            break;
                        }
                        self.observer.entry_finished(path);
                    }
                }
            }

            drop(entry_tx);
        });

        self.observer.archive_finished(path);
        status
    }
}

fn create(path: &Path) -> Result<File> {
    File::create(path).map_err(|source| PipelineError::Output {
        path: path.to_path_buf(),
        source,
    })
}
