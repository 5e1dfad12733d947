//! Unified error type for SIP message parsing
//!
//! Every grammar violation is fatal and surfaces as one of these variants;
//! the single non-fatal condition in the whole parser (Via port numeral
//! conversion failure) never produces an error and is recorded on the
//! [`crate::via::ViaEntry`] instead.

use crate::types::HeaderKind;
use thiserror::Error;

/// Parse errors, each carrying the byte offset where parsing stopped
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The first line is neither a valid request line nor a valid status
    /// line (includes buffers below the minimum length)
    #[error("invalid first line at offset {offset}: {reason}")]
    InvalidFirstLine { offset: usize, reason: &'static str },

    /// No ':' found before end of buffer or a bare CRLF, or a non-token
    /// byte inside the header name
    #[error("malformed header name at offset {offset}")]
    MalformedHeaderName { offset: usize },

    /// A structured body (Via, To/From, CSeq) violated its grammar
    #[error("malformed {kind} header body at offset {offset}: {reason}")]
    MalformedBody {
        kind: HeaderKind,
        offset: usize,
        reason: &'static str,
    },

    /// A quoted string (display name) was not closed before line end
    #[error("unterminated quoted string starting at offset {offset}")]
    UnterminatedQuotedString { offset: usize },

    /// Unbalanced Via comment parentheses or IPv6 host brackets
    #[error("unbalanced '{open}' at offset {offset}")]
    UnbalancedDelimiter { open: char, offset: usize },

    /// Buffer ended inside a header, before the end-of-headers line
    #[error("message ended prematurely at offset {offset}")]
    PrematureEnd { offset: usize },

    /// Message exceeds the configured size cap
    #[error("message size {size} exceeds maximum {limit}")]
    MessageTooLarge { size: usize, limit: usize },

    /// Header count exceeds the configured cap
    #[error("header count exceeds maximum {limit}")]
    TooManyHeaders { limit: usize },
}

/// Result type for parser operations
pub type ParseResult<T> = Result<T, ParseError>;

impl ParseError {
    /// Byte offset into the message where parsing stopped
    pub fn offset(&self) -> Option<usize> {
        match self {
            ParseError::InvalidFirstLine { offset, .. }
            | ParseError::MalformedHeaderName { offset }
            | ParseError::MalformedBody { offset, .. }
            | ParseError::UnterminatedQuotedString { offset }
            | ParseError::UnbalancedDelimiter { offset, .. }
            | ParseError::PrematureEnd { offset } => Some(*offset),
            ParseError::MessageTooLarge { .. } | ParseError::TooManyHeaders { .. } => None,
        }
    }

    /// Error category for metrics and logging
    pub fn category(&self) -> &'static str {
        match self {
            ParseError::InvalidFirstLine { .. } => "first-line",
            ParseError::MalformedHeaderName { .. } => "header-name",
            ParseError::MalformedBody { .. } => "structured-body",
            ParseError::UnterminatedQuotedString { .. } => "quoted-string",
            ParseError::UnbalancedDelimiter { .. } => "delimiter",
            ParseError::PrematureEnd { .. } => "premature-end",
            ParseError::MessageTooLarge { .. } | ParseError::TooManyHeaders { .. } => "limits",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ParseError::MalformedBody {
            kind: HeaderKind::Via,
            offset: 42,
            reason: "missing transport",
        };
        assert!(err.to_string().contains("Via"));
        assert!(err.to_string().contains("42"));
        assert_eq!(err.offset(), Some(42));
        assert_eq!(err.category(), "structured-body");
    }

    #[test]
    fn test_limit_errors_have_no_offset() {
        let err = ParseError::TooManyHeaders { limit: 256 };
        assert_eq!(err.offset(), None);
        assert_eq!(err.category(), "limits");
    }
}
