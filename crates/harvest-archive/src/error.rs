//! Error types for archive operations

use thiserror::Error;

/// Errors that can occur while enumerating or reading archives
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// IO error during archive operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid ZIP archive format
    #[error("Invalid ZIP archive: {0}")]
    InvalidZip(#[from] zip::result::ZipError),

    /// Entry is password-protected
    #[error("Entry is password-protected")]
    PasswordProtected,

    /// File within archive exceeds size limit
    #[error("File '{name}' is too large ({size} bytes, max {max} bytes)")]
    FileTooLarge {
        /// Name of the file that exceeded the limit
        name: String,
        /// Actual file size in bytes
        size: u64,
        /// Maximum allowed file size in bytes
        max: u64,
    },

    /// Glob pattern could not be compiled
    #[error("Invalid glob pattern '{pattern}': {message}")]
    InvalidPattern {
        /// The offending pattern
        pattern: String,
        /// Parser message from `glob`
        message: String,
    },
}

impl ArchiveError {
    /// Short machine-readable tag used in failure logs.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::FileTooLarge { .. } => "entry_too_large",
            Self::InvalidPattern { .. } => "invalid_pattern",
            Self::Io(_) | Self::InvalidZip(_) | Self::PasswordProtected => "entry_read_error",
        }
    }
}
