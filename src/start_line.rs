//! First-line classifier
//!
//! Decides Request vs Reply and extracts method/URI/version or
//! status/reason. One canonical implementation, token-then-compare style:
//! the four well-known methods and the `SIP/2.0` reply prefix are matched
//! with literal case-insensitive compares, everything else falls back to a
//! generic token scan.
//!
//! Classification never rewrites the buffer: all results are spans into
//! it, so the same bytes can be classified again at will.

use crate::limits::MIN_FIRST_LINE_LENGTH;
use crate::span::Span;
use crate::types::{is_token_char, Method};
use std::str::FromStr;

/// Outcome of first-line classification.
///
/// Invalid means the line matched neither grammar; consumption still
/// advances past the line, so callers must check the variant rather than
/// infer success from getting a result back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartLine {
    Request {
        method: Method,
        method_span: Span,
        uri: Span,
        version: Span,
    },
    Reply {
        version: Span,
        status: u16,
        reason: Span,
    },
    Invalid,
}

impl StartLine {
    pub fn is_request(&self) -> bool {
        matches!(self, StartLine::Request { .. })
    }

    pub fn is_reply(&self) -> bool {
        matches!(self, StartLine::Reply { .. })
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self, StartLine::Invalid)
    }
}

/// A classified first line: the variant, its span (line break excluded)
/// and the offset of the first byte after the line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirstLine {
    pub line: StartLine,
    pub span: Span,
    pub next: usize,
}

const REPLY_PREFIX: &[u8] = b"IP/2.0 ";

/// Fast-path method literals, trailing space included
const FAST_METHODS: [(&[u8], Method); 4] = [
    (b"INVITE ", Method::INVITE),
    (b"ACK ", Method::ACK),
    (b"CANCEL ", Method::CANCEL),
    (b"BYE ", Method::BYE),
];

/// Classify the first line of `msg`.
///
/// Buffers shorter than [`MIN_FIRST_LINE_LENGTH`] are Invalid without any
/// further inspection.
pub fn classify(msg: &str) -> FirstLine {
    let bytes = msg.as_bytes();

    if bytes.len() < MIN_FIRST_LINE_LENGTH {
        return FirstLine {
            line: StartLine::Invalid,
            span: Span::from_usize(0, bytes.len()),
            next: bytes.len(),
        };
    }

    // First line is never folded; the buffer end doubles as line end for
    // a start line with no terminator.
    let (end, next) = match bytes.iter().position(|&b| b == b'\n') {
        Some(lf) if lf > 0 && bytes[lf - 1] == b'\r' => (lf - 1, lf + 1),
        Some(lf) => (lf, lf + 1),
        None => (bytes.len(), bytes.len()),
    };

    let line = classify_line(bytes, end);
    FirstLine {
        line,
        span: Span::from_usize(0, end),
        next,
    }
}

fn classify_line(bytes: &[u8], end: usize) -> StartLine {
    // Reply: "SIP/2.0" + SP, case-insensitive on the first letter only
    if (bytes[0] == b'S' || bytes[0] == b's') && &bytes[1..8] == REPLY_PREFIX {
        return classify_status(bytes, end);
    }
    classify_request(bytes, end)
}

/// `SIP/2.0 SP 3DIGIT [SP reason]` -- the status code token must be
/// exactly three ASCII digits; the reason phrase is free text to line end
fn classify_status(bytes: &[u8], end: usize) -> StartLine {
    let code = &bytes[8..];
    if end < 11 || !code[..3.min(code.len())].iter().all(u8::is_ascii_digit) {
        return StartLine::Invalid;
    }
    // a fourth digit means the token is not exactly three digits
    if end > 11 && bytes[11].is_ascii_digit() {
        return StartLine::Invalid;
    }
    let status = (bytes[8] - b'0') as u16 * 100 + (bytes[9] - b'0') as u16 * 10
        + (bytes[10] - b'0') as u16;

    let reason = if end > 11 {
        if bytes[11] != b' ' {
            return StartLine::Invalid;
        }
        Span::from_usize(12, end)
    } else {
        Span::from_usize(end, end)
    };

    StartLine::Reply {
        version: Span::from_usize(0, 7),
        status,
        reason,
    }
}

/// `method SP uri SP version`, nothing else on the line
fn classify_request(bytes: &[u8], end: usize) -> StartLine {
    // Literal compare for the four well-known methods, then the generic
    // token scan for everything else (tagged Other).
    let (method, after_method) = match fast_method(bytes, end) {
        Some(hit) => hit,
        None => match scan_method_token(bytes, end) {
            Some(hit) => hit,
            None => return StartLine::Invalid,
        },
    };
    let method_span = Span::from_usize(0, after_method - 1);

    let uri_start = after_method;
    let uri_end = match bytes[uri_start..end].iter().position(|&b| b == b' ') {
        Some(rel) if rel > 0 => uri_start + rel,
        _ => return StartLine::Invalid, // empty URI or no version at all
    };

    // version is a single token filling the rest of the line; trailing
    // garbage (any later space) is fatal
    let version_start = uri_end + 1;
    if version_start >= end || bytes[version_start..end].contains(&b' ') {
        return StartLine::Invalid;
    }

    StartLine::Request {
        method,
        method_span,
        uri: Span::from_usize(uri_start, uri_end),
        version: Span::from_usize(version_start, end),
    }
}

fn fast_method(bytes: &[u8], end: usize) -> Option<(Method, usize)> {
    for (lit, method) in FAST_METHODS {
        if end > lit.len() && bytes[..lit.len()].eq_ignore_ascii_case(lit) {
            return Some((method, lit.len()));
        }
    }
    None
}

fn scan_method_token(bytes: &[u8], end: usize) -> Option<(Method, usize)> {
    let mut i = 0;
    while i < end && is_token_char(bytes[i]) {
        i += 1;
    }
    if i == 0 || i >= end || bytes[i] != b' ' {
        return None;
    }
    // the token run is pure ASCII, safe to slice
    let token = std::str::from_utf8(&bytes[..i]).ok()?;
    Some((Method::from_str(token).unwrap_or(Method::Other), i + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify_str(s: &str) -> FirstLine {
        classify(s)
    }

    #[test]
    fn test_invite_request() {
        let msg = "INVITE sip:bob@biloxi.com SIP/2.0\r\nVia: x\r\n";
        let fl = classify_str(msg);
        match fl.line {
            StartLine::Request {
                method,
                method_span,
                uri,
                version,
            } => {
                assert_eq!(method, Method::INVITE);
                assert_eq!(method_span.as_str(msg), "INVITE");
                assert_eq!(uri.as_str(msg), "sip:bob@biloxi.com");
                assert_eq!(version.as_str(msg), "SIP/2.0");
            }
            other => panic!("expected request, got {:?}", other),
        }
        assert_eq!(fl.next, 35);
        assert_eq!(fl.span.as_str(msg), "INVITE sip:bob@biloxi.com SIP/2.0");
    }

    #[test]
    fn test_fast_path_is_case_insensitive() {
        let msg = "invite sip:bob@biloxi.com SIP/2.0\r\n";
        match classify_str(msg).line {
            StartLine::Request { method, .. } => assert_eq!(method, Method::INVITE),
            other => panic!("expected request, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_method_is_other() {
        let msg = "REGISTER sip:registrar.biloxi.com SIP/2.0\r\n";
        match classify_str(msg).line {
            StartLine::Request {
                method,
                method_span,
                ..
            } => {
                assert_eq!(method, Method::Other);
                assert_eq!(method_span.as_str(msg), "REGISTER");
            }
            other => panic!("expected request, got {:?}", other),
        }
    }

    #[test]
    fn test_reply_404() {
        let msg = "SIP/2.0 404 Not Found\r\n";
        match classify_str(msg).line {
            StartLine::Reply {
                version,
                status,
                reason,
            } => {
                assert_eq!(version.as_str(msg), "SIP/2.0");
                assert_eq!(status, 404);
                assert_eq!(reason.as_str(msg), "Not Found");
            }
            other => panic!("expected reply, got {:?}", other),
        }
    }

    #[test]
    fn test_reply_lowercase_first_letter() {
        // only the first letter is case-insensitive; the rest is literal
        let msg = "sIP/2.0 200 All Good Here\r\n";
        match classify_str(msg).line {
            StartLine::Reply { status, .. } => assert_eq!(status, 200),
            other => panic!("expected reply, got {:?}", other),
        }
        let msg = "sip/2.0 200 All Good Here\r\n";
        assert_eq!(classify_str(msg).line, StartLine::Invalid);
    }

    #[test]
    fn test_status_must_be_exactly_three_digits() {
        assert_eq!(classify_str("SIP/2.0 40 Not Found\r\n").line, StartLine::Invalid);
        assert_eq!(classify_str("SIP/2.0 4040 NotFound\r\n").line, StartLine::Invalid);
        assert_eq!(classify_str("SIP/2.0 4xf Not Found\r\n").line, StartLine::Invalid);
    }

    #[test]
    fn test_minimum_length_reject() {
        let fl = classify_str("BYE a SIP/2.0\r\n");
        assert_eq!(fl.line, StartLine::Invalid);
        // rejected without inspection: consumption covers the whole buffer
        assert_eq!(fl.next, 15);
    }

    #[test]
    fn test_trailing_garbage_after_version() {
        let msg = "INVITE sip:bob@biloxi.com SIP/2.0 junk\r\n";
        assert_eq!(classify_str(msg).line, StartLine::Invalid);
    }

    #[test]
    fn test_missing_version() {
        let msg = "INVITE sip:bob@biloxi.com.example.org\r\n";
        assert_eq!(classify_str(msg).line, StartLine::Invalid);
    }

    #[test]
    fn test_invalid_still_advances_past_line() {
        let msg = "GARBAGE!!! ###### no version here\r\nVia: x\r\n";
        let fl = classify_str(msg);
        assert_eq!(fl.line, StartLine::Invalid);
        assert_eq!(&msg[fl.next..], "Via: x\r\n");
    }

    #[test]
    fn test_empty_reason_phrase() {
        let msg = "SIP/2.0 486 Busy Here\r\n";
        assert!(classify_str(msg).line.is_reply());
        let msg = "SIP/2.0 180 x\r\nVia: a\r\n";
        match classify_str(msg).line {
            StartLine::Reply { reason, .. } => assert_eq!(reason.as_str(msg), "x"),
            other => panic!("expected reply, got {:?}", other),
        }
    }
}
