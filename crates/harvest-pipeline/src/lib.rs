//! # harvest-pipeline
//!
//! Concurrent extraction of FB2 books from ZIP archives into
//! newline-delimited JSON.
//!
//! A run walks each archive of an [`ArchiveSet`](harvest_archive::ArchiveSet)
//! in turn and fans its entries out to a fixed pool of worker threads. Each
//! worker decodes and parses one entry and applies the [`InclusionFilter`].
//! A single writer thread owns both outputs:
//!
//! - the **result sink**: one JSON object per accepted book;
//! - the **failure log**: one line per entry that produced no record, with
//!   the archive, entry, reason and detail.
//!
//! A broken entry or an archive that cannot be opened is logged and
//! skipped; the run always continues.
//!
//! ## Quick Start
//!
//! ```no_run
//! use harvest_archive::expand_patterns;
//! use harvest_pipeline::{Pipeline, PipelineConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let archives = expand_patterns("library/fb2-*.zip")?;
//!
//! let mut config = PipelineConfig::new("books.ndjson", "failures.log");
//! config.seed = Some(42);
//!
//! let summary = Pipeline::new(config)?.run(&archives)?;
//! println!("{} books written", summary.accepted);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod filter;
pub mod outcome;
pub mod pool;
pub mod random;
pub mod sink;
pub mod summary;

pub use config::{PipelineConfig, DEFAULT_CONCURRENCY};
pub use error::{PipelineError, Result, SinkError};
pub use filter::{
    Decision, GenrePrefixSet, InclusionFilter, DEFAULT_DISCARD_PROBABILITY,
    DEFAULT_FICTION_PREFIXES,
};
pub use outcome::{ExtractionOutcome, Rejection, RejectionKind};
pub use pool::{CancellationToken, NoProgress, Pipeline, ProgressObserver};
pub use random::{RandomSource, SeededRandom, ThreadRandom};
pub use sink::{FailureLog, LogLevel, ResultSink, SinkEvent};
pub use summary::RunSummary;
