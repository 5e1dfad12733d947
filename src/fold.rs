//! The shared line-folding predicate
//!
//! Every body parser in this crate must agree on one question: does the
//! CR/LF at a given position terminate the header value, or is it a folded
//! continuation (CRLF followed by SP/TAB)? This module is the single
//! answer; no parser re-implements the check.

use crate::error::{ParseError, ParseResult};

/// Classification of a byte position with respect to line breaks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Break {
    /// Not a line break at all; the byte is ordinary value content.
    /// A lone CR with no LF behind it falls here.
    None,
    /// A folded continuation; the value resumes at `resume` (the SP/TAB
    /// immediately after the break)
    Fold { resume: usize },
    /// A terminating break; the value ends at `end` (CR excluded) and the
    /// next line starts at `next`
    End { end: usize, next: usize },
}

/// Classify the byte at `pos`.
///
/// Both CRLF and a bare LF count as a break; the returned `end` always
/// excludes the CR, so stored bodies never carry a trailing CR.
pub fn classify_break(bytes: &[u8], pos: usize) -> Break {
    let lf = match bytes[pos] {
        b'\r' if pos + 1 < bytes.len() && bytes[pos + 1] == b'\n' => pos + 1,
        b'\n' => pos,
        _ => return Break::None,
    };
    let after = lf + 1;
    if after < bytes.len() && (bytes[after] == b' ' || bytes[after] == b'\t') {
        Break::Fold { resume: after }
    } else {
        Break::End {
            end: pos,
            next: after,
        }
    }
}

/// End of a header value located by [`scan_line_end`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineEnd {
    /// One past the last value byte (CR excluded)
    pub end: usize,
    /// First byte of the following line
    pub next: usize,
}

/// Scan forward from `pos` for the first non-folded line break.
///
/// Folded breaks are skipped over; the value span returned to the caller
/// keeps any embedded fold sequences verbatim. Running out of buffer
/// before a terminating break is a hard error.
pub fn scan_line_end(bytes: &[u8], pos: usize) -> ParseResult<LineEnd> {
    let mut i = pos;
    while i < bytes.len() {
        match classify_break(bytes, i) {
            Break::None => i += 1,
            Break::Fold { resume } => i = resume,
            Break::End { end, next } => return Ok(LineEnd { end, next }),
        }
    }
    Err(ParseError::PrematureEnd { offset: bytes.len() })
}

/// Skip linear whitespace: SP, TAB and folded line breaks.
///
/// Returns the offset of the first non-LWS byte (possibly the end of the
/// buffer or a terminating break).
pub fn skip_lws(bytes: &[u8], pos: usize) -> usize {
    let mut i = pos;
    while i < bytes.len() {
        match bytes[i] {
            b' ' | b'\t' => i += 1,
            b'\r' | b'\n' => match classify_break(bytes, i) {
                Break::Fold { resume } => i = resume,
                _ => return i,
            },
            _ => return i,
        }
    }
    i
}
