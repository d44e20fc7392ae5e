//! Record types produced by the FB2 entry parser
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One `<author>` of a book's `<title-info>`.
///
/// Every sub-field is optional; a missing `<middle-name>` does not make the
/// author invalid. Absent fields serialize as empty strings so every output
/// line has the same shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Author {
    /// `<first-name>`
    #[serde(
        default,
        serialize_with = "empty_if_none",
        deserialize_with = "none_if_empty"
    )]
    pub first_name: Option<String>,

    /// `<last-name>`
    #[serde(
        default,
        serialize_with = "empty_if_none",
        deserialize_with = "none_if_empty"
    )]
    pub last_name: Option<String>,

    /// `<middle-name>`
    #[serde(
        default,
        serialize_with = "empty_if_none",
        deserialize_with = "none_if_empty"
    )]
    pub middle_name: Option<String>,

    /// `<nickname>`
    #[serde(
        default,
        serialize_with = "empty_if_none",
        deserialize_with = "none_if_empty"
    )]
    pub nick_name: Option<String>,
}

/// Fields of an entry that passed every structural check.
///
/// This is what the parser knows; the archive-level identity (`id`,
/// `file_name`) is attached by [`ExtractedBook::new`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ParsedBook {
    /// Genre codes in document order (duplicates kept)
    pub genres: Vec<String>,

    /// Authors from `<title-info>`
    pub authors: Vec<Author>,

    /// Text of the single `<book-title>`
    pub book_title: String,

    /// Text of the `<annotation>`, empty when absent
    pub annotation: String,

    /// Trimmed and truncated body text
    pub body: String,
}

/// An accepted book, ready to be written as one JSON line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExtractedBook {
    /// `<archive path>/<entry name>`
    pub id: String,

    #[serde(rename = "genre")]
    pub genres: Vec<String>,

    #[serde(rename = "author")]
    pub authors: Vec<Author>,

    pub book_title: String,

    pub body: String,

    pub annotation: String,

    /// Entry name inside the archive, without the archive prefix
    pub file_name: String,
}

impl ExtractedBook {
    /// Attach archive identity to a parsed book.
    #[must_use]
    pub fn new(archive: &str, entry_name: &str, parsed: ParsedBook) -> Self {
        Self {
            id: book_id(archive, entry_name),
            genres: parsed.genres,
            authors: parsed.authors,
            book_title: parsed.book_title,
            body: parsed.body,
            annotation: parsed.annotation,
            file_name: entry_name.to_string(),
        }
    }
}

/// Stable identifier of an entry within a run.
#[inline]
#[must_use]
pub fn book_id(archive: &str, entry_name: &str) -> String {
    format!("{archive}/{entry_name}")
}

fn empty_if_none<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(value.as_deref().unwrap_or(""))
}

fn none_if_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}
