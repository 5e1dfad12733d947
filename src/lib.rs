//! sipmsg - zero-copy SIP message parser
//!
//! A single-pass, hand-written parser that turns one complete SIP
//! message buffer into a structured [`SipMessage`]: classified start
//! line, ordered header list, well-known-header convenience pointers and
//! structured sub-parses of Via, To/From and CSeq. Everything is a span
//! into the owned buffer; nothing is copied or rewritten.
//!
//! Framing and socket I/O are the caller's problem: this crate parses
//! exactly one already-delivered message per buffer.

mod benchmark;
mod cseq;
mod error;
mod fold;
mod header_name;
mod limits;
mod message;
mod span;
mod start_line;
mod to_from;
mod types;
mod via;

pub use benchmark::{benchmark_parsing, run_parallel_benchmark};
pub use cseq::CSeqBody;
pub use error::{ParseError, ParseResult};
pub use limits::{ParserLimits, MAX_HEADERS, MAX_MESSAGE_SIZE, MIN_FIRST_LINE_LENGTH};
pub use message::{HeaderField, HeaderPayload, SipMessage};
pub use span::Span;
pub use start_line::StartLine;
pub use to_from::ToFromBody;
pub use types::{HeaderFlags, HeaderKind, Method, Param};
pub use via::{ViaEntry, ViaIter, ViaParam, ViaParamKind};
