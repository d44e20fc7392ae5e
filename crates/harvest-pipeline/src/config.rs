//! Pipeline configuration

use crate::error::{PipelineError, Result};
use crate::filter::{GenrePrefixSet, DEFAULT_DISCARD_PROBABILITY};
use harvest_ebook::DEFAULT_TRUNCATE_TO;
use std::path::PathBuf;

/// Default number of concurrent entry workers per archive.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Settings for one run. Immutable once the run starts.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// NDJSON output file (truncated on start)
    pub output_path: PathBuf,

    /// Failure log file (truncated on start)
    pub failure_log_path: PathBuf,

    /// Maximum body length, in characters
    pub truncate_to: usize,

    /// Worker threads per archive. At most this many entries are being
    /// processed at once, plus the one the reader is handing over.
    pub concurrency: usize,

    pub fiction_prefixes: GenrePrefixSet,

    /// Probability of dropping a non-fiction book, in `[0, 1]`
    pub discard_probability: f64,

    /// Seed for reproducible sampling; unseeded when `None`
    pub seed: Option<u64>,

    /// Log books dropped by the inclusion filter as `sampled_out`
    pub audit_filtered: bool,
}

impl PipelineConfig {
    /// Configuration with default tuning for the given output files.
    pub fn new(output_path: impl Into<PathBuf>, failure_log_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
            failure_log_path: failure_log_path.into(),
            truncate_to: DEFAULT_TRUNCATE_TO,
            concurrency: DEFAULT_CONCURRENCY,
            fiction_prefixes: GenrePrefixSet::default(),
            discard_probability: DEFAULT_DISCARD_PROBABILITY,
            seed: None,
            audit_filtered: false,
        }
    }

    /// Check every field before a run starts.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Config` describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.output_path.as_os_str().is_empty() {
            return Err(PipelineError::Config("output path is required".to_string()));
        }
        if self.failure_log_path.as_os_str().is_empty() {
            return Err(PipelineError::Config("failure log path is required".to_string()));
        }
        if self.output_path == self.failure_log_path {
            return Err(PipelineError::Config(format!(
                "output and failure log must be different files ({})",
                self.output_path.display()
            )));
        }
        if self.truncate_to == 0 {
            return Err(PipelineError::Config(
                "truncate_to must be at least 1".to_string(),
            ));
        }
        if self.concurrency == 0 {
            return Err(PipelineError::Config(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.discard_probability) {
            return Err(PipelineError::Config(format!(
                "discard_probability must be within [0, 1], got {}",
                self.discard_probability
            )));
        }
        Ok(())
    }
}
