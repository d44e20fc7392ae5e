//! Error types for FB2 entry decoding and parsing

/// Result type alias for entry operations
pub type Result<T> = std::result::Result<T, EbookError>;

/// Reasons an entry does not become a book record.
///
/// Every variant is scoped to one entry. [`EbookError::LanguageMismatch`] is
/// an expected filtering outcome rather than a defect in the input; see
/// [`EbookError::is_expected`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EbookError {
    /// Bytes are neither UTF-8 nor valid Windows-1251
    #[error("Failed to decode entry: {0}")]
    Decode(String),

    /// `<lang>` is missing, repeated, or not `ru`
    #[error("Entry is not in Russian: {0}")]
    LanguageMismatch(String),

    /// No `<genre>` element
    #[error("No genres found")]
    MissingGenre,

    /// Zero, several, or an empty `<book-title>`
    #[error("Book title missing or ambiguous: {0}")]
    MissingTitle(String),

    /// Zero or several `<body>` elements
    #[error("Expected exactly one body, found {0}")]
    MissingBody(usize),

    /// Zero or several `<title-info>` blocks
    #[error("Expected exactly one title-info, found {0}")]
    MissingTitleInfo(usize),

    /// `<title-info>` has no `<author>`
    #[error("No authors found in title-info")]
    MissingAuthors,

    /// The XML tokenizer could not continue
    #[error("Malformed markup: {0}")]
    MalformedMarkup(String),
}

impl EbookError {
    /// Short machine-readable tag used in failure logs and summaries.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::Decode(_) => "decode_error",
            Self::LanguageMismatch(_) => "language_mismatch",
            Self::MissingGenre => "missing_genre",
            Self::MissingTitle(_) => "missing_title",
            Self::MissingBody(_) => "missing_body",
            Self::MissingTitleInfo(_) => "missing_title_info",
            Self::MissingAuthors => "missing_authors",
            Self::MalformedMarkup(_) => "malformed_markup",
        }
    }

    /// True for outcomes that are normal corpus filtering, not defects.
    #[must_use]
    pub const fn is_expected(&self) -> bool {
        matches!(self, Self::LanguageMismatch(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_tags_are_distinct() {
        let errors = [
            EbookError::Decode(String::new()),
            EbookError::LanguageMismatch(String::new()),
            EbookError::MissingGenre,
            EbookError::MissingTitle(String::new()),
            EbookError::MissingBody(2),
            EbookError::MissingTitleInfo(0),
            EbookError::MissingAuthors,
            EbookError::MalformedMarkup(String::new()),
        ];
        let mut tags: Vec<&str> = errors.iter().map(EbookError::reason).collect();
        tags.sort_unstable();
        tags.dedup();
        assert_eq!(tags.len(), errors.len());
    }

    #[test]
    fn test_only_language_mismatch_is_expected() {
        assert!(EbookError::LanguageMismatch("en".to_string()).is_expected());
        assert!(!EbookError::MissingGenre.is_expected());
        assert!(!EbookError::Decode("bad".to_string()).is_expected());
    }

    #[test]
    fn test_display_includes_counts() {
        assert_eq!(
            EbookError::MissingBody(2).to_string(),
            "Expected exactly one body, found 2"
        );
    }
}
