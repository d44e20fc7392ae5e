//! # harvest-ebook
//!
//! FB2 (`FictionBook`) entry decoding and parsing for fb2-harvest.
//!
//! One archive entry goes through two pure steps:
//!
//! 1. [`encoding::normalize`] turns raw bytes into UTF-8 text. Entries are
//!    either UTF-8 or Windows-1251; nothing else is attempted.
//! 2. [`fb2::parse_entry`] reads the consumed fields and applies the
//!    structural checks, returning a [`ParsedBook`] or the typed
//!    [`EbookError`] of the first failed check.
//!
//! [`fb2::extract_book`] runs both and attaches the archive identity.
//!
//! ## Quick Start
//!
//! ```rust
//! use harvest_ebook::{extract_book, EbookError};
//!
//! let xml = r#"<FictionBook><description><title-info>
//!     <genre>sf_space</genre>
//!     <author><first-name>Иван</first-name><last-name>Ефремов</last-name></author>
//!     <book-title>Туманность Андромеды</book-title>
//!     <lang>ru</lang>
//! </title-info></description><body><p>Текст</p></body></FictionBook>"#;
//!
//! let book = extract_book("library/f.zip", "42.fb2", xml.as_bytes(), 50_000)?;
//! assert_eq!(book.id, "library/f.zip/42.fb2");
//! assert_eq!(book.genres, vec!["sf_space"]);
//! # Ok::<(), EbookError>(())
//! ```
//!
//! ## Output shape
//!
//! | Field | JSON key | Notes |
//! |-------|----------|-------|
//! | `id` | `id` | `<archive>/<entry>` |
//! | `genres` | `genre` | document order, duplicates kept |
//! | `authors` | `author` | `first_name`, `last_name`, `middle_name`, `nick_name` |
//! | `book_title` | `book_title` | exactly one `<book-title>` |
//! | `body` | `body` | trimmed, truncated by characters |
//! | `annotation` | `annotation` | empty when absent |
//! | `file_name` | `file_name` | entry name inside the archive |

/// Two-way UTF-8 / Windows-1251 normalization
pub mod encoding;
/// Error types for entry decoding and parsing
pub mod error;
/// FB2 entry parser
pub mod fb2;
/// Book record types
pub mod types;

// Re-export commonly used items
pub use encoding::{normalize, SourceEncoding};
pub use error::{EbookError, Result};
pub use fb2::{extract_book, parse_entry, truncate_chars, DEFAULT_TRUNCATE_TO};
pub use types::{book_id, Author, ExtractedBook, ParsedBook};
