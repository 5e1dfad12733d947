//! Header-name recognizer
//!
//! Classifies the text before ':' into a [`HeaderKind`], long and compact
//! forms alike, in one forward byte scan. A bare CR/LF as the very first
//! character signals end-of-headers and is returned without being
//! consumed; the aggregation loop owns that byte.

use crate::error::{ParseError, ParseResult};
use crate::span::Span;
use crate::types::{is_token_char, HeaderKind};
use std::str::FromStr;

/// Result of scanning one header name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameScan {
    /// The cursor sat on the blank line terminating the header section;
    /// nothing was consumed
    EndOfHeaders,
    /// A name followed by ':'; the body starts right after the colon
    Name {
        kind: HeaderKind,
        span: Span,
        body_start: usize,
    },
}

/// Scan the header name starting at `pos`.
///
/// Whitespace between the name and the ':' is tolerated. Reaching the end
/// of the buffer (or a line break) before the ':' is a hard error;
/// unrecognized-but-well-formed names classify as [`HeaderKind::Other`].
pub fn scan_header_name(msg: &str, pos: usize) -> ParseResult<NameScan> {
    let bytes = msg.as_bytes();
    if pos >= bytes.len() {
        return Err(ParseError::PrematureEnd { offset: pos });
    }
    if bytes[pos] == b'\r' || bytes[pos] == b'\n' {
        return Ok(NameScan::EndOfHeaders);
    }

    let mut i = pos;
    while i < bytes.len() && is_token_char(bytes[i]) {
        i += 1;
    }
    if i == pos {
        // first byte is not a legal name character
        return Err(ParseError::MalformedHeaderName { offset: pos });
    }
    let name = Span::from_usize(pos, i);

    // optional whitespace before the colon
    while i < bytes.len() && (bytes[i] == b' ' || bytes[i] == b'\t') {
        i += 1;
    }
    if i >= bytes.len() {
        return Err(ParseError::MalformedHeaderName { offset: i });
    }
    if bytes[i] != b':' {
        return Err(ParseError::MalformedHeaderName { offset: i });
    }

    // the name run is pure token ASCII, safe to slice
    let kind = HeaderKind::from_str(name.as_str(msg)).unwrap_or(HeaderKind::Other);

    Ok(NameScan::Name {
        kind,
        span: name,
        body_start: i + 1,
    })
}
