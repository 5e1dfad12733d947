//! CSeq header-body parser
//!
//! Grammar: `1*DIGIT SP method-token`. The number and the method come
//! back as independent spans; anything besides whitespace and folds
//! between the method and the line end is fatal.

use crate::error::{ParseError, ParseResult};
use crate::fold::{classify_break, skip_lws, Break, LineEnd};
use crate::span::Span;
use crate::types::{is_token_char, HeaderKind};

/// Parsed CSeq body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CSeqBody {
    pub number: Span,
    pub method: Span,
}

fn err(offset: usize, reason: &'static str) -> ParseError {
    ParseError::MalformedBody {
        kind: HeaderKind::CSeq,
        offset,
        reason,
    }
}

/// Parse a CSeq body starting at `pos` (just past the colon).
pub fn parse_cseq(msg: &str, pos: usize) -> ParseResult<(CSeqBody, LineEnd)> {
    let bytes = msg.as_bytes();
    let mut p = skip_lws(bytes, pos);

    let n_start = p;
    while p < bytes.len() && bytes[p].is_ascii_digit() {
        p += 1;
    }
    if p == n_start {
        return Err(err(n_start, "missing sequence number"));
    }
    let number = Span::from_usize(n_start, p);

    let q = skip_lws(bytes, p);
    if q == p {
        return Err(err(p, "missing space after sequence number"));
    }
    p = q;

    let m_start = p;
    while p < bytes.len() && is_token_char(bytes[p]) {
        p += 1;
    }
    if p == m_start {
        return Err(err(m_start, "missing method"));
    }
    let method = Span::from_usize(m_start, p);

    // only whitespace and folds may remain before the line end
    p = skip_lws(bytes, p);
    if p >= bytes.len() {
        return Err(ParseError::PrematureEnd { offset: p });
    }
    match classify_break(bytes, p) {
        Break::End { end: _, next } => Ok((
            CSeqBody { number, method },
            LineEnd {
                end: method.end as usize,
                next,
            },
        )),
        _ => Err(err(p, "trailing content after method")),
    }
}
