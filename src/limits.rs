//! Security limits and constants for the parser
//!
//! These limits prevent DoS attacks while maintaining RFC compliance

/// Maximum SIP message size we'll accept (64KB - 1)
/// This matches our u16 Span optimization
pub const MAX_MESSAGE_SIZE: usize = 65535;

/// Maximum number of headers in a single message
pub const MAX_HEADERS: usize = 256;

/// Shortest start line the classifier will even look at.
///
/// `SIP/2.0 404 xy\r\n` and `BYE sip:a@b SIP/2.0` are both longer than
/// this; anything shorter cannot be a complete first line and is rejected
/// as Invalid without further inspection.
pub const MIN_FIRST_LINE_LENGTH: usize = 17;

/// Maximum number of Via hops we'll chain from one header
pub const MAX_VIA_ENTRIES: usize = 70; // RFC 3261 recommends 70

/// Runtime-adjustable parser limits
#[derive(Debug, Clone, Copy)]
pub struct ParserLimits {
    /// Maximum total message size in bytes
    pub max_message_size: usize,
    /// Maximum number of header fields
    pub max_headers: usize,
    /// Maximum comma-separated entries in one Via header
    pub max_via_entries: usize,
}

impl Default for ParserLimits {
    fn default() -> Self {
        Self {
            max_message_size: MAX_MESSAGE_SIZE,
            max_headers: MAX_HEADERS,
            max_via_entries: MAX_VIA_ENTRIES,
        }
    }
}
