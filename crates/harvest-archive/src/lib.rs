//! Archive enumeration and ZIP entry reading for fb2-harvest
//!
//! Book collections ship as many large ZIP archives (`fb2-000001-010000.zip`
//! and so on), each holding thousands of `.fb2` entries. This crate covers
//! the two archive-level steps of a run:
//!
//! - **Enumeration**: comma-separated glob patterns become a deduplicated
//!   [`ArchiveSet`].
//! - **Reading**: an [`ArchiveReader`] walks one archive's file entries in
//!   central-directory order. Unreadable or oversized entries come back as
//!   [`EntryError`]s without ending the walk.
//!
//! # Usage
//!
//! ```no_run
//! use harvest_archive::{expand_patterns, ArchiveReader};
//!
//! let archives = expand_patterns("library/fb2-*.zip")?;
//! for path in &archives {
//!     let mut reader = ArchiveReader::open(path)?;
//!     for entry in reader.entries() {
//!         match entry {
//!             Ok(entry) => println!("{} ({} bytes)", entry.name, entry.contents.len()),
//!             Err(failure) => eprintln!("{}: {}", failure.name, failure.error),
//!         }
//!     }
//! }
//! # Ok::<(), harvest_archive::ArchiveError>(())
//! ```

pub mod enumerate;
pub mod error;
pub mod zip;

/// Maximum size for a single file within an archive (100 MB).
///
/// Larger entries are reported as `FileTooLarge` instead of being read into
/// memory.
pub const MAX_FILE_SIZE: u64 = 100_000_000;

pub use enumerate::{expand_patterns, ArchiveSet};
pub use error::ArchiveError;
pub use zip::{ArchiveEntry, ArchiveReader, Entries, EntryError};
