//! Error types for pipeline runs

use harvest_archive::ArchiveError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that abort a run.
///
/// Everything scoped to one entry or one archive is recorded in the failure
/// log instead and never surfaces here.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// An output file could not be created
    #[error("Failed to create {}: {source}", path.display())]
    Output {
        /// File that could not be created
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Buffered results could not be flushed at the end of the run
    #[error("Failed to flush results: {0}")]
    Flush(#[source] io::Error),

    /// The writer thread stopped unexpectedly
    #[error("Writer thread panicked")]
    WriterPanicked,
}

impl From<ArchiveError> for PipelineError {
    fn from(err: ArchiveError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Failure to append one record to the result sink.
#[derive(Error, Debug)]
pub enum SinkError {
    /// The record could not be encoded as JSON
    #[error("JSON encoding failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The encoded line could not be written
    #[error("Write failed: {0}")]
    Io(#[from] io::Error),

    /// An earlier write failed and may have left a partial line
    #[error("Output abandoned after an earlier write failure")]
    Poisoned,
}
