//! Terminal outcomes of one extraction attempt

use harvest_archive::{ArchiveError, EntryError};
use harvest_ebook::{book_id, EbookError, ExtractedBook};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Why an entry (or archive) produced no record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RejectionKind {
    LanguageMismatch,
    MissingGenre,
    MissingTitle,
    MissingBody,
    MissingTitleInfo,
    MissingAuthors,
    MalformedMarkup,
    DecodeError,
    EntryReadError,
    EntryTooLarge,
    SerializationError,
    ArchiveOpenError,
}

impl RejectionKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LanguageMismatch => "language_mismatch",
            Self::MissingGenre => "missing_genre",
            Self::MissingTitle => "missing_title",
            Self::MissingBody => "missing_body",
            Self::MissingTitleInfo => "missing_title_info",
            Self::MissingAuthors => "missing_authors",
            Self::MalformedMarkup => "malformed_markup",
            Self::DecodeError => "decode_error",
            Self::EntryReadError => "entry_read_error",
            Self::EntryTooLarge => "entry_too_large",
            Self::SerializationError => "serialization_error",
            Self::ArchiveOpenError => "archive_open_error",
        }
    }

    /// Normal corpus filtering rather than a defect.
    #[must_use]
    pub const fn is_expected(self) -> bool {
        matches!(self, Self::LanguageMismatch)
    }
}

impl fmt::Display for RejectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&EbookError> for RejectionKind {
    fn from(err: &EbookError) -> Self {
        match err {
            EbookError::Decode(_) => Self::DecodeError,
            EbookError::LanguageMismatch(_) => Self::LanguageMismatch,
            EbookError::MissingGenre => Self::MissingGenre,
            EbookError::MissingTitle(_) => Self::MissingTitle,
            EbookError::MissingBody(_) => Self::MissingBody,
            EbookError::MissingTitleInfo(_) => Self::MissingTitleInfo,
            EbookError::MissingAuthors => Self::MissingAuthors,
            EbookError::MalformedMarkup(_) => Self::MalformedMarkup,
        }
    }
}

impl From<&ArchiveError> for RejectionKind {
    fn from(err: &ArchiveError) -> Self {
        match err {
            ArchiveError::FileTooLarge { .. } => Self::EntryTooLarge,
            _ => Self::EntryReadError,
        }
    }
}

/// A typed rejection with enough context for one failure-log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub kind: RejectionKind,
    pub archive: Arc<str>,
    /// Entry name; empty for archive-scoped failures
    pub entry: String,
    pub detail: String,
}

impl Rejection {
    pub fn from_ebook(archive: Arc<str>, entry: String, err: &EbookError) -> Self {
        Self {
            kind: err.into(),
            archive,
            entry,
            detail: err.to_string(),
        }
    }

    #[must_use]
    pub fn from_entry_error(failure: EntryError) -> Self {
        Self {
            kind: (&failure.error).into(),
            detail: failure.error.to_string(),
            archive: failure.archive,
            entry: failure.name,
        }
    }

    #[must_use]
    pub fn archive_open(path: &Path, err: &ArchiveError) -> Self {
        Self {
            kind: RejectionKind::ArchiveOpenError,
            archive: Arc::from(path.display().to_string()),
            entry: String::new(),
            detail: err.to_string(),
        }
    }

    pub fn serialization(book: &ExtractedBook, detail: impl fmt::Display) -> Self {
        Self {
            kind: RejectionKind::SerializationError,
            archive: Arc::from(book.id.strip_suffix(book.file_name.as_str()).map_or("", |a| {
                a.strip_suffix('/').unwrap_or(a)
            })),
            entry: book.file_name.clone(),
            detail: detail.to_string(),
        }
    }

    /// `<archive>/<entry>`, or just the archive for archive-scoped failures.
    #[must_use]
    pub fn id(&self) -> String {
        if self.entry.is_empty() {
            self.archive.to_string()
        } else {
            book_id(&self.archive, &self.entry)
        }
    }
}

/// Terminal state of one entry.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionOutcome {
    Accepted(ExtractedBook),
    Rejected(Rejection),
    /// Dropped by the inclusion filter
    Filtered { archive: Arc<str>, entry: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use harvest_ebook::{Author, ParsedBook};

    #[test]
    fn test_kind_matches_ebook_reason() {
        let errors = [
            EbookError::Decode(String::new()),
            EbookError::LanguageMismatch("en".to_string()),
            EbookError::MissingGenre,
            EbookError::MissingTitle(String::new()),
            EbookError::MissingBody(0),
            EbookError::MissingTitleInfo(2),
            EbookError::MissingAuthors,
            EbookError::MalformedMarkup(String::new()),
        ];
        for err in &errors {
            assert_eq!(RejectionKind::from(err).as_str(), err.reason());
            assert_eq!(RejectionKind::from(err).is_expected(), err.is_expected());
        }
    }

    #[test]
    fn test_entry_error_kinds() {
        let too_large = EntryError {
            archive: Arc::from("lib.zip"),
            name: "big.fb2".to_string(),
            error: ArchiveError::FileTooLarge {
                name: "big.fb2".to_string(),
                size: 2,
                max: 1,
            },
        };
        let rejection = Rejection::from_entry_error(too_large);
        assert_eq!(rejection.kind, RejectionKind::EntryTooLarge);
        assert_eq!(rejection.id(), "lib.zip/big.fb2");

        let locked = EntryError {
            archive: Arc::from("lib.zip"),
            name: "locked.fb2".to_string(),
            error: ArchiveError::PasswordProtected,
        };
        assert_eq!(
            Rejection::from_entry_error(locked).kind,
            RejectionKind::EntryReadError
        );
    }

    #[test]
    fn test_archive_open_id_is_archive() {
        let err = ArchiveError::PasswordProtected;
        let rejection = Rejection::archive_open(Path::new("dir/broken.zip"), &err);
        assert_eq!(rejection.id(), "dir/broken.zip");
        assert!(!rejection.kind.is_expected());
    }

    #[test]
    fn test_serialization_recovers_archive() {
        let parsed = ParsedBook {
            genres: vec!["sf".to_string()],
            authors: vec![Author::default()],
            book_title: "Т".to_string(),
            annotation: String::new(),
            body: String::new(),
        };
        let book = ExtractedBook::new("dir/lib.zip", "sub/7.fb2", parsed);
        let rejection = Rejection::serialization(&book, "boom");
        assert_eq!(&*rejection.archive, "dir/lib.zip");
        assert_eq!(rejection.entry, "sub/7.fb2");
        assert_eq!(rejection.id(), book.id);
    }
}
