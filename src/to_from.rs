//! To / From header-body parser
//!
//! Grammar: optional display-name (quoted string with backslash escapes,
//! or an unquoted token sequence) then the address, either enclosed as
//! `"<" URI ">"` or a bare URI/token, then `*(";" param)`.
//!
//! The enclosed-vs-bare distinction is tracked explicitly: after a bare
//! URI a ';' starts the header parameter list, while inside angle
//! brackets it would be part of the URI. A parameter literally named
//! `tag` is kept in the generic list and duplicated into `tag_value`.

use crate::error::{ParseError, ParseResult};
use crate::fold::{classify_break, skip_lws, Break, LineEnd};
use crate::span::Span;
use crate::types::{is_token_char, HeaderKind, Param};

/// Parsed To or From body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToFromBody {
    /// The full body span
    pub span: Span,
    /// Display name, quotes stripped when it was a quoted string
    pub display_name: Option<Span>,
    /// The address URI; angle brackets stripped when enclosed
    pub uri: Span,
    /// Whether the URI was enclosed in angle brackets
    pub enclosed: bool,
    /// Header parameters in order of appearance
    pub params: Vec<Param>,
    /// Value of the first parameter named `tag`, duplicated out of
    /// `params` for dialog matching
    pub tag_value: Option<Span>,
}

fn err(kind: HeaderKind, offset: usize, reason: &'static str) -> ParseError {
    ParseError::MalformedBody {
        kind,
        offset,
        reason,
    }
}

/// Parse a To/From body starting at `pos` (just past the colon); `kind`
/// names the header in errors.
pub fn parse_to_from(msg: &str, pos: usize, kind: HeaderKind) -> ParseResult<(ToFromBody, LineEnd)> {
    let bytes = msg.as_bytes();
    let mut p = skip_lws(bytes, pos);
    let body_start = p;

    let mut display_name = None;
    let enclosed;
    let uri;

    if p < bytes.len() && bytes[p] == b'"' {
        // quoted display name; the grammar then requires an enclosed URI
        let (name, after) = scan_quoted(bytes, p)?;
        display_name = Some(name);
        p = skip_lws(bytes, after);
        if p >= bytes.len() || bytes[p] != b'<' {
            return Err(err(kind, p, "quoted display name without enclosed URI"));
        }
        let (u, after) = scan_enclosed_uri(bytes, p, kind)?;
        uri = u;
        enclosed = true;
        p = after;
    } else {
        // look ahead for '<' on this line: anything before it is an
        // unquoted display name, possibly empty
        match find_angle_open(bytes, p) {
            Some(open) => {
                let name_end = trim_back(bytes, p, open);
                if name_end > p {
                    display_name = Some(Span::from_usize(p, name_end));
                }
                let (u, after) = scan_enclosed_uri(bytes, open, kind)?;
                uri = u;
                enclosed = true;
                p = after;
            }
            None => {
                // bare URI: runs to the first ';', whitespace or line end
                let start = p;
                while p < bytes.len()
                    && !matches!(bytes[p], b';' | b' ' | b'\t' | b'\r' | b'\n')
                {
                    p += 1;
                }
                if p == start {
                    return Err(err(kind, start, "missing address"));
                }
                uri = Span::from_usize(start, p);
                enclosed = false;
            }
        }
    }

    let mut body = ToFromBody {
        span: Span::from_usize(body_start, body_start),
        display_name,
        uri,
        enclosed,
        params: Vec::new(),
        tag_value: None,
    };

    // parameter list, then the terminating line break
    loop {
        p = skip_lws(bytes, p);
        if p >= bytes.len() {
            return Err(ParseError::PrematureEnd { offset: p });
        }
        if let Break::End { end, next } = classify_break(bytes, p) {
            body.span = Span::from_usize(body_start, end);
            return Ok((body, LineEnd { end, next }));
        }
        if bytes[p] != b';' {
            return Err(err(kind, p, "unexpected content after address"));
        }
        p = skip_lws(bytes, p + 1);
        let name = scan_token_span(bytes, &mut p).ok_or_else(|| err(kind, p, "empty parameter name"))?;

        let eq_pos = skip_lws(bytes, p);
        let value = if eq_pos < bytes.len() && bytes[eq_pos] == b'=' {
            p = skip_lws(bytes, eq_pos + 1);
            if p < bytes.len() && bytes[p] == b'"' {
                let (v, after) = scan_quoted(bytes, p)?;
                p = after;
                Some(v)
            } else {
                let v = scan_value_span(bytes, &mut p)
                    .ok_or_else(|| err(kind, p, "empty parameter value"))?;
                Some(v)
            }
        } else {
            None
        };

        if body.tag_value.is_none() && name.as_str(msg).eq_ignore_ascii_case("tag") {
            body.tag_value = value;
        }
        body.params.push(Param { name, value });
    }
}

/// Quoted string starting at the '"' in `pos`; returns the content span
/// (quotes stripped) and the offset after the closing quote. Backslash
/// escapes any byte, CR and LF included; an unescaped line break or the
/// end of the buffer before the closing quote is fatal.
fn scan_quoted(bytes: &[u8], pos: usize) -> ParseResult<(Span, usize)> {
    let mut i = pos + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return Ok((Span::from_usize(pos + 1, i), i + 1)),
            b'\r' | b'\n' => match classify_break(bytes, i) {
                // folds may continue a quoted string
                Break::Fold { resume } => i = resume,
                Break::None => i += 1,
                Break::End { .. } => {
                    return Err(ParseError::UnterminatedQuotedString { offset: pos })
                }
            },
            _ => i += 1,
        }
    }
    Err(ParseError::UnterminatedQuotedString { offset: pos })
}

/// `<uri>`; `pos` sits on '<'. Returns the URI span (brackets stripped)
/// and the offset after '>'.
fn scan_enclosed_uri(bytes: &[u8], pos: usize, kind: HeaderKind) -> ParseResult<(Span, usize)> {
    let mut i = pos + 1;
    while i < bytes.len() && !matches!(classify_break(bytes, i), Break::End { .. }) {
        if bytes[i] == b'>' {
            let span = Span::from_usize(pos + 1, i);
            if span.is_empty() {
                return Err(err(kind, pos, "empty URI"));
            }
            return Ok((span, i + 1));
        }
        i += 1;
    }
    Err(ParseError::UnbalancedDelimiter {
        open: '<',
        offset: pos,
    })
}

/// First '<' on this header line, folds skipped, or None if the value
/// ends first
fn find_angle_open(bytes: &[u8], pos: usize) -> Option<usize> {
    let mut i = pos;
    while i < bytes.len() {
        match classify_break(bytes, i) {
            Break::End { .. } => return None,
            Break::Fold { resume } => i = resume,
            Break::None => {
                if bytes[i] == b'<' {
                    return Some(i);
                }
                i += 1;
            }
        }
    }
    None
}

/// Trim trailing SP/TAB off `[start, end)`
fn trim_back(bytes: &[u8], start: usize, end: usize) -> usize {
    let mut e = end;
    while e > start && (bytes[e - 1] == b' ' || bytes[e - 1] == b'\t') {
        e -= 1;
    }
    e
}

fn scan_token_span(bytes: &[u8], p: &mut usize) -> Option<Span> {
    let start = *p;
    while *p < bytes.len() && is_token_char(bytes[*p]) {
        *p += 1;
    }
    (*p > start).then(|| Span::from_usize(start, *p))
}

fn scan_value_span(bytes: &[u8], p: &mut usize) -> Option<Span> {
    let start = *p;
    while *p < bytes.len()
        && !matches!(bytes[*p], b';' | b' ' | b'\t' | b'\r' | b'\n')
    {
        *p += 1;
    }
    (*p > start).then(|| Span::from_usize(start, *p))
}
