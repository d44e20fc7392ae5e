//! ZIP archive reading
//!
//! An [`ArchiveReader`] keeps one archive open and yields its file entries in
//! central-directory order, one at a time. Directory records are skipped.
//! A damaged or oversized entry is reported as an [`EntryError`] and the
//! iteration moves on to the next record.

use crate::error::ArchiveError;
use crate::MAX_FILE_SIZE;
use log::{debug, warn};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::Arc;
use zip::ZipArchive;

/// One file entry read out of an archive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArchiveEntry {
    /// Display form of the owning archive's path
    pub archive: Arc<str>,
    /// Entry name as stored in the archive
    pub name: String,
    /// Uncompressed contents
    pub contents: Vec<u8>,
}

/// An entry that could not be read.
#[derive(Debug)]
pub struct EntryError {
    /// Display form of the owning archive's path
    pub archive: Arc<str>,
    /// Entry name, or `#<index>` when even the header was unreadable
    pub name: String,
    /// What went wrong
    pub error: ArchiveError,
}

/// An open ZIP archive.
pub struct ArchiveReader {
    label: Arc<str>,
    archive: ZipArchive<BufReader<File>>,
}

impl std::fmt::Debug for ArchiveReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveReader")
            .field("archive", &self.label)
            .field("records", &self.archive.len())
            .finish()
    }
}

impl ArchiveReader {
    /// Open an archive and read its central directory.
    ///
    /// # Errors
    ///
    /// Returns `ArchiveError` if the file cannot be opened or is not a valid
    /// ZIP archive.
    pub fn open(path: &Path) -> Result<Self, ArchiveError> {
        let file = File::open(path)?;
        let archive = ZipArchive::new(BufReader::new(file))?;
        debug!(
            "Opened {} ({} records)",
            path.display(),
            archive.len()
        );

        Ok(Self {
            label: Arc::from(path.display().to_string()),
            archive,
        })
    }

    /// Number of file (non-directory) records in the central directory.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.archive
            .file_names()
            .filter(|name| !name.ends_with('/'))
            .count()
    }

    /// Iterate over the archive's file entries.
    pub fn entries(&mut self) -> Entries<'_> {
        Entries {
            reader: self,
            index: 0,
        }
    }

    fn read_entry(&mut self, index: usize) -> Option<Result<ArchiveEntry, EntryError>> {
        let label = Arc::clone(&self.label);
        let fail = |name: String, error: ArchiveError| {
            Some(Err(EntryError {
                archive: Arc::clone(&label),
                name,
                error,
            }))
        };

        let mut zip_file = match self.archive.by_index(index) {
            Ok(zip_file) => zip_file,
            Err(e) => return fail(format!("#{index}"), e.into()),
        };

        if zip_file.is_dir() {
            return None;
        }

        let name = zip_file.name().to_string();

        if zip_file.encrypted() {
            return fail(name, ArchiveError::PasswordProtected);
        }

        let size = zip_file.size();
        if size > MAX_FILE_SIZE {
            warn!("Skipping large entry: {name} ({size} bytes exceeds {MAX_FILE_SIZE} bytes limit)");
            return fail(
                name.clone(),
                ArchiveError::FileTooLarge {
                    name,
                    size,
                    max: MAX_FILE_SIZE,
                },
            );
        }

        let capacity = usize::try_from(size).unwrap_or_default();
        let mut contents = Vec::with_capacity(capacity);
        if let Err(e) = zip_file.read_to_end(&mut contents) {
            return fail(name, e.into());
        }

        Some(Ok(ArchiveEntry {
            archive: label,
            name,
            contents,
        }))
    }
}

/// Iterator over the file entries of an [`ArchiveReader`].
#[derive(Debug)]
pub struct Entries<'a> {
    reader: &'a mut ArchiveReader,
    index: usize,
}

impl Iterator for Entries<'_> {
    type Item = Result<ArchiveEntry, EntryError>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.index < self.reader.archive.len() {
            let index = self.index;
            self.index += 1;
            if let Some(item) = self.reader.read_entry(index) {
                return Some(item);
            }
        }
        None
    }
}
