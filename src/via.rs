//! Via header parser
//!
//! Grammar:
//! `"SIP" "/" version "/" transport SP host [":" port] *(";" param)
//!  [SP "(" comment ")"] *("," via-entry)`
//!
//! IPv6 hosts must be bracket-enclosed and the stored host span has the
//! brackets stripped; a ':' inside unclosed brackets is never taken as
//! the host/port separator. Comments nest. Comma-separated entries form
//! a linked chain, each carrying its own byte size.
//!
//! Port numeral conversion failure is the single non-fatal condition in
//! the entire parser: the port span is kept, the numeric field stays
//! `None`, and parsing continues.

use crate::error::{ParseError, ParseResult};
use crate::fold::{classify_break, skip_lws, Break, LineEnd};
use crate::span::Span;
use crate::types::{is_token_char, HeaderKind};

/// Recognized Via parameter kinds; anything else is `Generic`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViaParamKind {
    Branch,
    Ttl,
    Maddr,
    Received,
    Hidden,
    Generic,
}

/// One `;name[=value]` Via parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViaParam {
    pub kind: ViaParamKind,
    pub name: Span,
    pub value: Option<Span>,
}

/// One entry of a (possibly comma-separated) Via header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViaEntry {
    /// Protocol name span, always the literal `SIP`
    pub protocol: Span,
    pub version: Span,
    pub transport: Span,
    /// Host span; brackets already stripped for IPv6 literals
    pub host: Span,
    /// The port text as it appeared, if any
    pub port_span: Option<Span>,
    /// The converted port. `None` with `port_span` present means the
    /// numeral did not fit a u16 -- flagged, not fatal.
    pub port: Option<u16>,
    /// Parameters in order of appearance
    pub params: Vec<ViaParam>,
    /// Direct pointer to the branch value; transaction matching hangs
    /// off this
    pub branch: Option<Span>,
    pub comment: Option<Span>,
    /// Byte size of this entry within the header body
    pub size: u16,
    /// Next comma-separated entry
    pub next: Option<Box<ViaEntry>>,
}

impl ViaEntry {
    /// Iterate this entry and every chained one, left to right
    pub fn iter(&self) -> ViaIter<'_> {
        ViaIter { cur: Some(self) }
    }

    /// Number of entries in the chain starting here
    pub fn count(&self) -> usize {
        self.iter().count()
    }

    /// True when the port text was present but did not convert
    pub fn port_overflowed(&self) -> bool {
        self.port_span.is_some() && self.port.is_none()
    }
}

/// Iterator over a Via entry chain
#[derive(Debug)]
pub struct ViaIter<'a> {
    cur: Option<&'a ViaEntry>,
}

impl<'a> Iterator for ViaIter<'a> {
    type Item = &'a ViaEntry;

    fn next(&mut self) -> Option<&'a ViaEntry> {
        let cur = self.cur.take()?;
        self.cur = cur.next.as_deref();
        Some(cur)
    }
}

/// How one entry ended
enum EntryEnd {
    /// A comma; the next entry starts at the contained offset
    Comma(usize),
    /// The non-folded line break terminating the whole header
    Line(LineEnd),
}

fn err(offset: usize, reason: &'static str) -> ParseError {
    ParseError::MalformedBody {
        kind: HeaderKind::Via,
        offset,
        reason,
    }
}

/// Parse a full Via header body starting at `pos` (just past the colon).
///
/// Returns the head of the entry chain and the location of the body end.
pub fn parse_via(msg: &str, pos: usize, max_entries: usize) -> ParseResult<(ViaEntry, LineEnd)> {
    let bytes = msg.as_bytes();
    let mut entries: Vec<ViaEntry> = Vec::new();
    let mut cursor = pos;

    let line_end = loop {
        if entries.len() >= max_entries {
            return Err(err(cursor, "too many chained entries"));
        }
        let (entry, end) = parse_entry(msg, bytes, cursor)?;
        entries.push(entry);
        match end {
            EntryEnd::Comma(next) => cursor = next,
            EntryEnd::Line(le) => break le,
        }
    };

    // link back to front
    let mut chain: Option<Box<ViaEntry>> = None;
    for mut entry in entries.into_iter().rev() {
        entry.next = chain.take();
        chain = Some(Box::new(entry));
    }
    match chain {
        Some(head) => Ok((*head, line_end)),
        None => Err(err(pos, "empty header body")),
    }
}

fn parse_entry(msg: &str, bytes: &[u8], pos: usize) -> ParseResult<(ViaEntry, EntryEnd)> {
    let mut p = skip_lws(bytes, pos);
    let start = p;

    // sent-protocol: "SIP" "/" version "/" transport
    let protocol = scan_token(bytes, &mut p).ok_or_else(|| err(p, "missing protocol name"))?;
    if !protocol.as_str(msg).eq_ignore_ascii_case("SIP") {
        return Err(err(protocol.start as usize, "protocol name is not SIP"));
    }
    expect_slash(bytes, &mut p)?;
    let version = scan_token(bytes, &mut p).ok_or_else(|| err(p, "missing protocol version"))?;
    expect_slash(bytes, &mut p)?;
    let transport = scan_token(bytes, &mut p).ok_or_else(|| err(p, "missing transport"))?;

    // at least one LWS between transport and host
    let q = skip_lws(bytes, p);
    if q == p {
        return Err(err(p, "missing space before host"));
    }
    p = q;

    let host = scan_host(bytes, &mut p)?;
    let mut entry = ViaEntry {
        protocol,
        version,
        transport,
        host,
        port_span: None,
        port: None,
        params: Vec::new(),
        branch: None,
        comment: None,
        size: 0,
        next: None,
    };
    let mut content_end = p;

    loop {
        p = skip_lws(bytes, p);
        if p >= bytes.len() {
            return Err(ParseError::PrematureEnd { offset: p });
        }
        if let Break::End { end, next } = classify_break(bytes, p) {
            entry.size = (content_end - start) as u16;
            return Ok((entry, EntryEnd::Line(LineEnd { end, next })));
        }
        match bytes[p] {
            b',' => {
                entry.size = (content_end - start) as u16;
                return Ok((entry, EntryEnd::Comma(p + 1)));
            }
            b':' if entry.port_span.is_none()
                && entry.params.is_empty()
                && entry.comment.is_none() =>
            {
                p = skip_lws(bytes, p + 1);
                let d_start = p;
                while p < bytes.len() && bytes[p].is_ascii_digit() {
                    p += 1;
                }
                if p == d_start {
                    return Err(err(d_start, "missing port digits"));
                }
                let span = Span::from_usize(d_start, p);
                entry.port_span = Some(span);
                // conversion failure is flagged, never fatal
                entry.port = span.as_str(msg).parse::<u16>().ok();
                content_end = p;
            }
            b';' if entry.comment.is_none() => {
                let param = parse_param(msg, bytes, &mut p)?;
                if param.kind == ViaParamKind::Branch {
                    entry.branch = param.value;
                }
                content_end = param
                    .value
                    .map_or(param.name.end as usize, |v| v.end as usize);
                entry.params.push(param);
            }
            b'(' if entry.comment.is_none() => {
                entry.comment = Some(parse_comment(bytes, &mut p)?);
                content_end = p;
            }
            _ => return Err(err(p, "unexpected character in entry")),
        }
    }
}

fn expect_slash(bytes: &[u8], p: &mut usize) -> ParseResult<()> {
    *p = skip_lws(bytes, *p);
    if *p >= bytes.len() || bytes[*p] != b'/' {
        return Err(err(*p, "expected '/'"));
    }
    *p = skip_lws(bytes, *p + 1);
    Ok(())
}

fn scan_token(bytes: &[u8], p: &mut usize) -> Option<Span> {
    let start = *p;
    while *p < bytes.len() && is_token_char(bytes[*p]) {
        *p += 1;
    }
    (*p > start).then(|| Span::from_usize(start, *p))
}

/// Host, either a bracketed IPv6 literal (brackets stripped from the
/// span) or a plain hostname/IPv4 token
fn scan_host(bytes: &[u8], p: &mut usize) -> ParseResult<Span> {
    if *p < bytes.len() && bytes[*p] == b'[' {
        let open = *p;
        let mut i = open + 1;
        while i < bytes.len() && !matches!(classify_break(bytes, i), Break::End { .. }) {
            if bytes[i] == b']' {
                let span = Span::from_usize(open + 1, i);
                if span.is_empty() {
                    return Err(err(open, "empty IPv6 literal"));
                }
                *p = i + 1;
                return Ok(span);
            }
            i += 1;
        }
        return Err(ParseError::UnbalancedDelimiter {
            open: '[',
            offset: open,
        });
    }

    let start = *p;
    while *p < bytes.len()
        && !matches!(
            bytes[*p],
            b':' | b';' | b',' | b'(' | b' ' | b'\t' | b'\r' | b'\n'
        )
    {
        *p += 1;
    }
    if *p == start {
        return Err(err(start, "missing host"));
    }
    Ok(Span::from_usize(start, *p))
}

/// One `;name[=value]` parameter; `p` sits on the ';'
fn parse_param(msg: &str, bytes: &[u8], p: &mut usize) -> ParseResult<ViaParam> {
    *p = skip_lws(bytes, *p + 1);
    let name = scan_token(bytes, p).ok_or_else(|| err(*p, "empty parameter name"))?;
    let kind = classify_param(name.as_str(msg));

    let eq_pos = skip_lws(bytes, *p);
    let has_value = eq_pos < bytes.len() && bytes[eq_pos] == b'=';

    match kind {
        ViaParamKind::Hidden => {
            if has_value {
                return Err(err(eq_pos, "hidden takes no value"));
            }
            return Ok(ViaParam {
                kind,
                name,
                value: None,
            });
        }
        ViaParamKind::Branch | ViaParamKind::Ttl | ViaParamKind::Maddr | ViaParamKind::Received => {
            if !has_value {
                return Err(err(*p, "missing value for parameter"));
            }
        }
        ViaParamKind::Generic => {
            if !has_value {
                return Ok(ViaParam {
                    kind,
                    name,
                    value: None,
                });
            }
        }
    }

    *p = skip_lws(bytes, eq_pos + 1);
    let v_start = *p;
    while *p < bytes.len()
        && !matches!(
            bytes[*p],
            b';' | b',' | b'(' | b' ' | b'\t' | b'\r' | b'\n'
        )
    {
        *p += 1;
    }
    if *p == v_start {
        return Err(err(v_start, "empty parameter value"));
    }
    let value = Span::from_usize(v_start, *p);

    if kind == ViaParamKind::Ttl && !value.as_str(msg).bytes().all(|b| b.is_ascii_digit()) {
        return Err(err(v_start, "ttl is not numeric"));
    }

    Ok(ViaParam {
        kind,
        name,
        value: Some(value),
    })
}

fn classify_param(name: &str) -> ViaParamKind {
    if name.eq_ignore_ascii_case("branch") {
        ViaParamKind::Branch
    } else if name.eq_ignore_ascii_case("ttl") {
        ViaParamKind::Ttl
    } else if name.eq_ignore_ascii_case("maddr") {
        ViaParamKind::Maddr
    } else if name.eq_ignore_ascii_case("received") {
        ViaParamKind::Received
    } else if name.eq_ignore_ascii_case("hidden") {
        ViaParamKind::Hidden
    } else {
        ViaParamKind::Generic
    }
}

/// Balanced, nestable `( ... )` comment; `p` sits on the '('. The span
/// excludes the outer parentheses.
fn parse_comment(bytes: &[u8], p: &mut usize) -> ParseResult<Span> {
    let open = *p;
    let mut depth = 1usize;
    let mut i = open + 1;
    while i < bytes.len() {
        match classify_break(bytes, i) {
            Break::End { .. } => break,
            Break::Fold { resume } => {
                i = resume;
                continue;
            }
            Break::None => {}
        }
        match bytes[i] {
            b'\\' => i += 1, // quoted-pair inside the comment
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    let span = Span::from_usize(open + 1, i);
                    *p = i + 1;
                    return Ok(span);
                }
            }
            _ => {}
        }
        i += 1;
    }
    Err(ParseError::UnbalancedDelimiter {
        open: '(',
        offset: open,
    })
}
