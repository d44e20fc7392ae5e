//! Character encoding normalization for FB2 entries.
//!
//! FB2 files in Russian-language libraries are stored either as UTF-8 or as
//! Windows-1251. This module settles on one of the two and decodes to a
//! `String`; no other legacy code page is considered.
//!
//! Resolution order:
//! 1. UTF-8 BOM
//! 2. `encoding="..."` in the XML declaration (UTF-8 label only if the bytes
//!    really are UTF-8)
//! 3. UTF-8 validation
//! 4. Windows-1251 as the fallback

use encoding_rs::{Encoding, UTF_8, WINDOWS_1251};
use log::debug;

use crate::error::{EbookError, Result};

/// UTF-8 BOM: EF BB BF
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// How far into the entry to look for an XML declaration.
const DECLARATION_SCAN_LIMIT: usize = 1024;

/// Encoding an entry was decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEncoding {
    /// UTF-8 without BOM
    Utf8,
    /// UTF-8 with BOM
    Utf8Bom,
    /// Windows-1251 (Cyrillic)
    Windows1251,
}

impl SourceEncoding {
    /// The `encoding_rs` codec for this source.
    #[must_use]
    pub fn codec(self) -> &'static Encoding {
        match self {
            Self::Utf8 | Self::Utf8Bom => UTF_8,
            Self::Windows1251 => WINDOWS_1251,
        }
    }
}

impl std::fmt::Display for SourceEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Utf8 => write!(f, "UTF-8"),
            Self::Utf8Bom => write!(f, "UTF-8 with BOM"),
            Self::Windows1251 => write!(f, "windows-1251"),
        }
    }
}

/// Decide which of the two supported encodings `buffer` uses.
#[must_use]
pub fn detect(buffer: &[u8]) -> SourceEncoding {
    if buffer.starts_with(UTF8_BOM) {
        return SourceEncoding::Utf8Bom;
    }

    let is_utf8 = std::str::from_utf8(buffer).is_ok();

    if let Some(declared) = declared_encoding(buffer) {
        if declared == UTF_8 && is_utf8 {
            return SourceEncoding::Utf8;
        }
        if declared == WINDOWS_1251 {
            return SourceEncoding::Windows1251;
        }
    }

    if is_utf8 {
        SourceEncoding::Utf8
    } else {
        SourceEncoding::Windows1251
    }
}

/// Decode an entry's bytes to canonical UTF-8 text.
///
/// # Errors
///
/// Returns [`EbookError::Decode`] if the payload contains NUL bytes (binary
/// data, not markup) or a byte sequence that is invalid in the resolved
/// encoding.
pub fn normalize(buffer: &[u8]) -> Result<String> {
    if buffer.contains(&0) {
        return Err(EbookError::Decode(
            "payload contains NUL bytes (binary data)".to_string(),
        ));
    }

    let encoding = detect(buffer);
    debug!("Decoding {} bytes as {encoding}", buffer.len());

    let payload = match encoding {
        SourceEncoding::Utf8Bom => &buffer[UTF8_BOM.len()..],
        SourceEncoding::Utf8 | SourceEncoding::Windows1251 => buffer,
    };
    encoding
        .codec()
        .decode_without_bom_handling_and_without_replacement(payload)
        .map(std::borrow::Cow::into_owned)
        .ok_or_else(|| EbookError::Decode(format!("byte sequence is not valid {encoding}")))
}

/// Read the `encoding` pseudo-attribute of a leading `<?xml ...?>`.
fn declared_encoding(buffer: &[u8]) -> Option<&'static Encoding> {
    let head = &buffer[..buffer.len().min(DECLARATION_SCAN_LIMIT)];
    let start = find(head, b"<?xml")?;
    let end = start + find(&head[start..], b"?>")?;
    let declaration = &head[start..end];

    let attr = find(declaration, b"encoding")?;
    let rest = &declaration[attr + b"encoding".len()..];
    let rest = trim_ascii_start(rest).strip_prefix(b"=")?;
    let rest = trim_ascii_start(rest);

    let (&quote, rest) = rest.split_first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }
    let close = rest.iter().position(|&b| b == quote)?;

    Encoding::for_label(&rest[..close])
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn trim_ascii_start(bytes: &[u8]) -> &[u8] {
    let skip = bytes
        .iter()
        .take_while(|b| b.is_ascii_whitespace())
        .count();
    &bytes[skip..]
}
