//! Message model and aggregation loop
//!
//! [`SipMessage`] owns the raw text; every structure produced by parsing
//! is a span into it, so the message and its buffer live and die
//! together. Parsing is driven by a caller-supplied coverage target and
//! can be resumed from the stored cursor to progressively widen
//! coverage.

use crate::cseq::{parse_cseq, CSeqBody};
use crate::error::{ParseError, ParseResult};
use crate::fold::scan_line_end;
use crate::header_name::{scan_header_name, NameScan};
use crate::limits::ParserLimits;
use crate::span::Span;
use crate::start_line::{classify, StartLine};
use crate::to_from::{parse_to_from, ToFromBody};
use crate::types::{HeaderFlags, HeaderKind, Method};
use crate::via::{parse_via, ViaEntry};
use tracing::{debug, trace};

/// Structured payload of a header field.
///
/// Every header carries exactly one of these; types without a dedicated
/// sub-parser get `None` and expose only their body span.
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderPayload {
    None,
    Via(ViaEntry),
    ToFrom(ToFromBody),
    CSeq(CSeqBody),
}

/// One parsed header field
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderField {
    pub kind: HeaderKind,
    pub name: Span,
    pub body: Span,
    pub payload: HeaderPayload,
}

impl HeaderField {
    pub fn via(&self) -> Option<&ViaEntry> {
        match &self.payload {
            HeaderPayload::Via(v) => Some(v),
            _ => None,
        }
    }

    pub fn to_from(&self) -> Option<&ToFromBody> {
        match &self.payload {
            HeaderPayload::ToFrom(t) => Some(t),
            _ => None,
        }
    }

    pub fn cseq(&self) -> Option<&CSeqBody> {
        match &self.payload {
            HeaderPayload::CSeq(c) => Some(c),
            _ => None,
        }
    }
}

/// A parsed SIP message
#[derive(Debug, Clone)]
pub struct SipMessage {
    /// Original message text
    raw_message: String,

    /// Parser limits for security
    limits: ParserLimits,

    /// Classified first line; None until classification ran
    start_line: Option<StartLine>,

    /// First line span (line break excluded)
    first_line_span: Span,

    /// Append-only ordered header list
    headers: Vec<HeaderField>,

    // First-occurrence indices into `headers` (Via gets two slots)
    via1: Option<usize>,
    via2: Option<usize>,
    to: Option<usize>,
    from: Option<usize>,
    call_id: Option<usize>,
    cseq: Option<usize>,
    contact: Option<usize>,
    max_forwards: Option<usize>,
    route: Option<usize>,
    record_route: Option<usize>,

    /// Cumulative set of observed header types
    seen: HeaderFlags,

    /// Resumable parse cursor
    cursor: usize,

    /// Whether the blank line ending the header section was reached
    eoh: bool,

    /// Everything after the blank line, if any
    body: Option<Span>,
}

impl SipMessage {
    /// Create a new SIP message from the raw text
    pub fn new(message: String) -> Self {
        Self::with_limits(message, ParserLimits::default())
    }

    /// Create a new SIP message with custom parser limits
    pub fn with_limits(message: String, limits: ParserLimits) -> Self {
        Self {
            raw_message: message,
            limits,
            start_line: None,
            first_line_span: Span::default(),
            headers: Vec::new(),
            via1: None,
            via2: None,
            to: None,
            from: None,
            call_id: None,
            cseq: None,
            contact: None,
            max_forwards: None,
            route: None,
            record_route: None,
            seen: HeaderFlags::NONE,
            cursor: 0,
            eoh: false,
            body: None,
        }
    }

    /// Create a new SIP message from a string slice
    pub fn new_from_str(message: &str) -> Self {
        Self::new(message.to_string())
    }

    /// Get the current parser limits
    pub fn limits(&self) -> &ParserLimits {
        &self.limits
    }

    /// Top-level entry point: classify the first line, then extend
    /// header coverage until `target` is satisfied.
    ///
    /// The target is the caller's choice; requests commonly use
    /// [`HeaderFlags::request_default`] (one Via observed) and replies
    /// [`HeaderFlags::reply_default`] (two). An `Err` does not roll back:
    /// headers appended before the failure stay inspectable.
    pub fn parse(&mut self, target: HeaderFlags) -> ParseResult<()> {
        if self.raw_message.len() > self.limits.max_message_size {
            return Err(ParseError::MessageTooLarge {
                size: self.raw_message.len(),
                limit: self.limits.max_message_size,
            });
        }

        if self.start_line.is_none() {
            trace!(len = self.raw_message.len(), "classifying first line");
            let first = classify(&self.raw_message);
            self.start_line = Some(first.line);
            self.first_line_span = first.span;
            self.cursor = first.next;
            if !first.line.is_valid() {
                debug!("first line did not classify");
                return Err(ParseError::InvalidFirstLine {
                    offset: 0,
                    reason: "unrecognized request or status line",
                });
            }
        } else if !self.start_line().is_valid() {
            return Err(ParseError::InvalidFirstLine {
                offset: 0,
                reason: "unrecognized request or status line",
            });
        }

        self.extend_coverage(target)
    }

    /// Convenience: parse with the usual target for the message class
    /// (one Via for requests, two for replies)
    pub fn parse_default(&mut self) -> ParseResult<()> {
        self.parse(HeaderFlags::NONE)?;
        let target = if self.is_request() {
            HeaderFlags::request_default()
        } else {
            HeaderFlags::reply_default()
        };
        self.parse(target)
    }

    /// Run the aggregation loop from the stored cursor until every type
    /// in `target` has been observed, end-of-headers is reached, or a
    /// fatal error occurs.
    ///
    /// May be called repeatedly with widening targets; each call resumes
    /// where the previous one stopped.
    pub fn extend_coverage(&mut self, target: HeaderFlags) -> ParseResult<()> {
        if self.start_line.is_none() {
            return Err(ParseError::InvalidFirstLine {
                offset: 0,
                reason: "first line not classified",
            });
        }

        while !self.eoh && !self.seen.contains(target) {
            if self.headers.len() >= self.limits.max_headers {
                return Err(ParseError::TooManyHeaders {
                    limit: self.limits.max_headers,
                });
            }

            let (kind, name, body_start) =
                match scan_header_name(&self.raw_message, self.cursor)? {
                    NameScan::EndOfHeaders => {
                        self.finish_headers();
                        break;
                    }
                    NameScan::Name {
                        kind,
                        span,
                        body_start,
                    } => (kind, span, body_start),
                };

            let body_start = crate::fold::skip_lws(self.raw_message.as_bytes(), body_start);

            let (payload, body_end, next) = match kind {
                HeaderKind::Via => {
                    let (via, le) =
                        parse_via(&self.raw_message, body_start, self.limits.max_via_entries)?;
                    (HeaderPayload::Via(via), le.end, le.next)
                }
                HeaderKind::To | HeaderKind::From => {
                    let (tf, le) = parse_to_from(&self.raw_message, body_start, kind)?;
                    (HeaderPayload::ToFrom(tf), le.end, le.next)
                }
                HeaderKind::CSeq => {
                    let (cs, le) = parse_cseq(&self.raw_message, body_start)?;
                    (HeaderPayload::CSeq(cs), le.end, le.next)
                }
                _ => {
                    // generic extractor: body runs to the first
                    // non-folded line break, preceding CR excluded
                    let le = scan_line_end(self.raw_message.as_bytes(), body_start)?;
                    (HeaderPayload::None, le.end, le.next)
                }
            };

            let index = self.headers.len();
            self.headers.push(HeaderField {
                kind,
                name,
                body: Span::from_usize(body_start, body_end),
                payload,
            });
            self.record_occurrence(kind, index);
            self.cursor = next;
        }

        Ok(())
    }

    /// Consume the blank line and record the body span, if any
    fn finish_headers(&mut self) {
        let bytes = self.raw_message.as_bytes();
        self.eoh = true;
        self.seen.insert(HeaderFlags::END_OF_HEADERS);
        let mut after = self.cursor;
        if after < bytes.len() && bytes[after] == b'\r' {
            after += 1;
        }
        if after < bytes.len() && bytes[after] == b'\n' {
            after += 1;
        }
        self.cursor = after;
        if after < bytes.len() {
            self.body = Some(Span::from_usize(after, bytes.len()));
        }
        trace!(headers = self.headers.len(), "end of headers");
    }

    /// Update first-occurrence pointers and the seen-mask
    fn record_occurrence(&mut self, kind: HeaderKind, index: usize) {
        match kind {
            HeaderKind::Via => {
                if self.via1.is_none() {
                    self.via1 = Some(index);
                    self.seen.insert(HeaderFlags::VIA);
                } else if self.via2.is_none() {
                    self.via2 = Some(index);
                    self.seen.insert(HeaderFlags::VIA2);
                }
                return;
            }
            HeaderKind::Other => return,
            _ => {}
        }
        self.seen.insert(HeaderFlags::for_kind(kind));
        let slot = match kind {
            HeaderKind::To => &mut self.to,
            HeaderKind::From => &mut self.from,
            HeaderKind::CallId => &mut self.call_id,
            HeaderKind::CSeq => &mut self.cseq,
            HeaderKind::Contact => &mut self.contact,
            HeaderKind::MaxForwards => &mut self.max_forwards,
            HeaderKind::Route => &mut self.route,
            HeaderKind::RecordRoute => &mut self.record_route,
            HeaderKind::Via | HeaderKind::Other => return,
        };
        if slot.is_none() {
            *slot = Some(index);
        }
    }

    // --- accessors ---

    /// Access the raw message text
    pub fn raw_message(&self) -> &str {
        &self.raw_message
    }

    /// The classified first line; [`StartLine::Invalid`] when it did not
    /// classify, which callers must check rather than assuming success
    pub fn start_line(&self) -> StartLine {
        self.start_line.unwrap_or(StartLine::Invalid)
    }

    /// The first line text
    pub fn first_line(&self) -> &str {
        self.first_line_span.as_str(&self.raw_message)
    }

    pub fn is_request(&self) -> bool {
        self.start_line().is_request()
    }

    pub fn is_reply(&self) -> bool {
        self.start_line().is_reply()
    }

    /// Request method, if this is a request
    pub fn method(&self) -> Option<Method> {
        match self.start_line() {
            StartLine::Request { method, .. } => Some(method),
            _ => None,
        }
    }

    /// Reply status code, if this is a reply
    pub fn status(&self) -> Option<u16> {
        match self.start_line() {
            StartLine::Reply { status, .. } => Some(status),
            _ => None,
        }
    }

    /// All headers parsed so far, in insertion order
    pub fn headers(&self) -> &[HeaderField] {
        &self.headers
    }

    /// Set of header types observed so far
    pub fn seen(&self) -> HeaderFlags {
        self.seen
    }

    /// True once the blank line ending the headers was reached
    pub fn headers_complete(&self) -> bool {
        self.eoh
    }

    /// Offset the aggregation loop would resume from
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Message body text, if a body followed the headers
    pub fn body(&self) -> Option<&str> {
        self.body.map(|b| b.as_str(&self.raw_message))
    }

    /// Resolve a span against this message's buffer
    pub fn get_str(&self, span: Span) -> &str {
        span.as_str(&self.raw_message)
    }

    /// Resolve an optional span against this message's buffer
    pub fn get_opt_str(&self, span: Option<Span>) -> Option<&str> {
        span.map(|s| s.as_str(&self.raw_message))
    }

    fn field_at(&self, index: Option<usize>) -> Option<&HeaderField> {
        index.and_then(|i| self.headers.get(i))
    }

    /// First Via entry chain
    pub fn via1(&self) -> Option<&ViaEntry> {
        self.field_at(self.via1).and_then(HeaderField::via)
    }

    /// Second Via header's entry chain
    pub fn via2(&self) -> Option<&ViaEntry> {
        self.field_at(self.via2).and_then(HeaderField::via)
    }

    /// To header body
    pub fn to(&self) -> Option<&ToFromBody> {
        self.field_at(self.to).and_then(HeaderField::to_from)
    }

    /// From header body
    pub fn from(&self) -> Option<&ToFromBody> {
        self.field_at(self.from).and_then(HeaderField::to_from)
    }

    /// CSeq body
    pub fn cseq(&self) -> Option<&CSeqBody> {
        self.field_at(self.cseq).and_then(HeaderField::cseq)
    }

    /// Call-ID body text
    pub fn call_id(&self) -> Option<&str> {
        self.field_at(self.call_id).map(|h| self.get_str(h.body))
    }

    /// First Contact header field
    pub fn contact(&self) -> Option<&HeaderField> {
        self.field_at(self.contact)
    }

    /// First Max-Forwards header field
    pub fn max_forwards(&self) -> Option<&HeaderField> {
        self.field_at(self.max_forwards)
    }

    /// First Route header field
    pub fn route(&self) -> Option<&HeaderField> {
        self.field_at(self.route)
    }

    /// First Record-Route header field
    pub fn record_route(&self) -> Option<&HeaderField> {
        self.field_at(self.record_route)
    }

    /// All headers of one kind, in order
    pub fn headers_of_kind(&self, kind: HeaderKind) -> impl Iterator<Item = &HeaderField> {
        self.headers.iter().filter(move |h| h.kind == kind)
    }
}
