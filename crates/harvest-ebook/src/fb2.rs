//! `FictionBook` (FB2) entry parser
//!
//! FB2 is an XML-based e-book format popular in Russia and Eastern Europe.
//! Only the handful of elements a book record needs are read:
//!
//! - `<lang>`: must occur once and be `ru`
//! - `<genre>`: one or more genre codes (e.g. `sf_space`, `prose_classic`)
//! - `<annotation>`: optional summary
//! - `<book-title>`: exactly one
//! - `<body>`: exactly one; its full text becomes the record body
//! - `<title-info>`: exactly one, holding the `<author>` entries
//!
//! Element names are matched on their local name, so `<fb:genre>` and
//! `<genre>` are the same element. Counting is document-wide: a
//! `<src-title-info>` carrying its own `<book-title>` makes the title
//! ambiguous, and a `<body name="notes">` counts as a second body.
//!
//! References:
//! - Official XSD schema: <https://github.com/gribuser/fb2>

use crate::encoding;
use crate::error::{EbookError, Result};
use crate::types::{Author, ExtractedBook, ParsedBook};
use quick_xml::events::{BytesText, Event};
use quick_xml::Reader;

/// Default body truncation bound, in characters.
pub const DEFAULT_TRUNCATE_TO: usize = 50_000;

/// Language every accepted entry must declare.
pub const REQUIRED_LANGUAGE: &str = "ru";

/// Elements the scanner tracks. Everything else is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Lang,
    Genre,
    Annotation,
    BookTitle,
    Body,
    TitleInfo,
    Author,
    FirstName,
    MiddleName,
    LastName,
    Nickname,
    Other,
}

impl Tag {
    const COUNT: usize = 12;

    fn from_local_name(name: &[u8]) -> Self {
        match name {
            b"lang" => Self::Lang,
            b"genre" => Self::Genre,
            b"annotation" => Self::Annotation,
            b"book-title" => Self::BookTitle,
            b"body" => Self::Body,
            b"title-info" => Self::TitleInfo,
            b"author" => Self::Author,
            b"first-name" => Self::FirstName,
            b"middle-name" => Self::MiddleName,
            b"last-name" => Self::LastName,
            b"nickname" => Self::Nickname,
            _ => Self::Other,
        }
    }

    const fn is_name_part(self) -> bool {
        matches!(
            self,
            Self::FirstName | Self::MiddleName | Self::LastName | Self::Nickname
        )
    }
}

/// Everything collected in one pass, before any check is applied.
#[derive(Debug, Default)]
struct Scan {
    langs: Vec<String>,
    genres: Vec<String>,
    annotations: Vec<String>,
    titles: Vec<String>,
    bodies: Vec<String>,
    title_infos: usize,
    authors: Vec<Author>,
}

/// Stack of open elements plus per-tag open counts.
#[derive(Debug, Default)]
struct Cursor {
    stack: Vec<Tag>,
    open: [usize; Tag::COUNT],
    /// Author name part being captured, with its text so far
    name_part: Option<(Tag, String)>,
}

impl Cursor {
    fn is_open(&self, tag: Tag) -> bool {
        self.open[tag as usize] > 0
    }

    fn push(&mut self, tag: Tag) {
        self.stack.push(tag);
        self.open[tag as usize] += 1;
    }

    fn pop(&mut self) -> Option<Tag> {
        let tag = self.stack.pop()?;
        self.open[tag as usize] -= 1;
        Some(tag)
    }

    fn in_title_info_author(&self) -> bool {
        self.is_open(Tag::TitleInfo) && self.is_open(Tag::Author)
    }
}

/// Decode and parse one archive entry into an accepted book.
///
/// # Errors
///
/// Any [`EbookError`]: decoding failures first, then the structural checks
/// of [`parse_entry`].
pub fn extract_book(
    archive: &str,
    entry_name: &str,
    bytes: &[u8],
    truncate_to: usize,
) -> Result<ExtractedBook> {
    let text = encoding::normalize(bytes)?;
    let parsed = parse_entry(&text, truncate_to)?;
    Ok(ExtractedBook::new(archive, entry_name, parsed))
}

/// Parse FB2 markup into a [`ParsedBook`].
///
/// Checks run in a fixed order and the first failure is returned: language,
/// genres, (annotation, never fails), title, body, title-info, authors.
///
/// # Errors
///
/// The [`EbookError`] variant of the first check that failed, or
/// [`EbookError::MalformedMarkup`] if the XML cannot be tokenized.
pub fn parse_entry(xml_content: &str, truncate_to: usize) -> Result<ParsedBook> {
    let scan = scan(xml_content)?;

    match scan.langs.as_slice() {
        [lang] if lang == REQUIRED_LANGUAGE => {}
        [] => return Err(EbookError::LanguageMismatch("no lang element".to_string())),
        [lang] => return Err(EbookError::LanguageMismatch(format!("lang is '{lang}'"))),
        many => {
            return Err(EbookError::LanguageMismatch(format!(
                "{} lang elements",
                many.len()
            )))
        }
    }

    if scan.genres.is_empty() {
        return Err(EbookError::MissingGenre);
    }

    let annotation = match scan.annotations.as_slice() {
        [single] => single.trim().to_string(),
        _ => String::new(),
    };

    let book_title = match scan.titles.as_slice() {
        [title] if !title.is_empty() => title.clone(),
        [_] => return Err(EbookError::MissingTitle("book-title is empty".to_string())),
        titles => {
            return Err(EbookError::MissingTitle(format!(
                "found {} book-title elements",
                titles.len()
            )))
        }
    };

    let body = match scan.bodies.as_slice() {
        [body] => truncate_chars(body.trim(), truncate_to).to_string(),
        bodies => return Err(EbookError::MissingBody(bodies.len())),
    };

    if scan.title_infos != 1 {
        return Err(EbookError::MissingTitleInfo(scan.title_infos));
    }
    if scan.authors.is_empty() {
        return Err(EbookError::MissingAuthors);
    }

    Ok(ParsedBook {
        genres: scan.genres,
        authors: scan.authors,
        book_title,
        annotation,
        body,
    })
}

/// Cut `text` to at most `max_chars` characters (not bytes).
#[inline]
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    text.char_indices()
        .nth(max_chars)
        .map_or(text, |(byte_index, _)| &text[..byte_index])
}

/// Single streaming pass collecting every tracked element.
fn scan(xml_content: &str) -> Result<Scan> {
    let mut reader = Reader::from_str(xml_content);
    reader.expand_empty_elements(true);

    let mut scan = Scan::default();
    let mut cursor = Cursor::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let tag = Tag::from_local_name(e.local_name().as_ref());
                open_element(&mut scan, &mut cursor, tag);
                cursor.push(tag);
            }
            Ok(Event::End(_)) => {
                if let Some(tag) = cursor.pop() {
                    close_element(&mut scan, &mut cursor, tag);
                }
            }
            Ok(Event::Text(e)) => append_text(&mut scan, &mut cursor, &text_of(&e)),
            Ok(Event::CData(e)) => {
                let raw = e.into_inner();
                append_text(&mut scan, &mut cursor, &String::from_utf8_lossy(&raw));
            }
            Ok(Event::Eof) => {
                if !cursor.stack.is_empty() {
                    return Err(EbookError::MalformedMarkup(format!(
                        "document ends with {} unclosed elements",
                        cursor.stack.len()
                    )));
                }
                break;
            }
            Err(e) => {
                return Err(EbookError::MalformedMarkup(format!(
                    "XML error at byte {}: {e}",
                    reader.buffer_position()
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(scan)
}

fn open_element(scan: &mut Scan, cursor: &mut Cursor, tag: Tag) {
    match tag {
        Tag::Lang => scan.langs.push(String::new()),
        Tag::Genre => scan.genres.push(String::new()),
        Tag::Annotation => scan.annotations.push(String::new()),
        Tag::BookTitle => scan.titles.push(String::new()),
        Tag::Body => scan.bodies.push(String::new()),
        Tag::TitleInfo => scan.title_infos += 1,
        Tag::Author if cursor.is_open(Tag::TitleInfo) => scan.authors.push(Author::default()),
        part if part.is_name_part() && cursor.in_title_info_author() => {
            if cursor.name_part.is_none() {
                cursor.name_part = Some((part, String::new()));
            }
        }
        _ => {}
    }
}

fn close_element(scan: &mut Scan, cursor: &mut Cursor, tag: Tag) {
    match tag {
        Tag::Lang => trim_last(&mut scan.langs),
        Tag::BookTitle => trim_last(&mut scan.titles),
        Tag::Genre => {
            trim_last(&mut scan.genres);
            if scan.genres.last().is_some_and(String::is_empty) {
                scan.genres.pop();
            }
        }
        part if part.is_name_part() => {
            let Some((capturing, text)) = cursor.name_part.take() else {
                return;
            };
            if capturing != part {
                cursor.name_part = Some((capturing, text));
                return;
            }
            let Some(author) = scan.authors.last_mut() else {
                return;
            };
            let slot = match part {
                Tag::FirstName => &mut author.first_name,
                Tag::MiddleName => &mut author.middle_name,
                Tag::LastName => &mut author.last_name,
                _ => &mut author.nick_name,
            };
            let text = text.trim();
            if slot.is_none() && !text.is_empty() {
                *slot = Some(text.to_string());
            }
        }
        _ => {}
    }
}

fn append_text(scan: &mut Scan, cursor: &mut Cursor, text: &str) {
    let targets = [
        (Tag::Lang, &mut scan.langs),
        (Tag::Genre, &mut scan.genres),
        (Tag::Annotation, &mut scan.annotations),
        (Tag::BookTitle, &mut scan.titles),
        (Tag::Body, &mut scan.bodies),
    ];
    for (tag, values) in targets {
        if cursor.is_open(tag) {
            if let Some(value) = values.last_mut() {
                value.push_str(text);
            }
        }
    }

    if let Some((_, part)) = cursor.name_part.as_mut() {
        part.push_str(text);
    }
}

fn trim_last(values: &mut [String]) {
    if let Some(value) = values.last_mut() {
        let trimmed = value.trim();
        if trimmed.len() != value.len() {
            *value = trimmed.to_string();
        }
    }
}

/// Unescaped text, or the raw text when it uses an undeclared entity.
fn text_of(e: &BytesText<'_>) -> String {
    match e.unescape() {
        Ok(text) => text.into_owned(),
        Err(_) => String::from_utf8_lossy(e).into_owned(),
    }
}
