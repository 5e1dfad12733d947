//! Common types and enums used throughout the parser

use crate::span::Span;
use strum_macros::{Display, EnumString};

/// Request methods the first-line classifier distinguishes.
///
/// Only the four fast-path methods get their own variant; every other
/// well-formed token is tagged `Other` and callers read the method span
/// for the actual text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Method {
    INVITE,
    ACK,
    CANCEL,
    BYE,
    #[strum(serialize = "OTHER")]
    Other,
}

/// Header types the recognizer classifies.
///
/// The long spellings and the single-letter compact forms below are a
/// byte-exact compatibility contract for callers that branch on header
/// type; matching is case-insensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum HeaderKind {
    #[strum(to_string = "Via", serialize = "v")]
    Via,
    #[strum(to_string = "From", serialize = "f")]
    From,
    #[strum(to_string = "To", serialize = "t")]
    To,
    #[strum(to_string = "CSeq")]
    CSeq,
    #[strum(to_string = "Call-ID", serialize = "i")]
    CallId,
    #[strum(to_string = "Contact", serialize = "m")]
    Contact,
    #[strum(to_string = "Max-Forwards")]
    MaxForwards,
    #[strum(to_string = "Route")]
    Route,
    #[strum(to_string = "Record-Route")]
    RecordRoute,
    #[strum(to_string = "Other")]
    Other,
}

/// Bitmask of header types, used both as the cumulative "seen" set of a
/// message and as the caller-supplied coverage target for the aggregation
/// loop.
///
/// Via gets two bits: `VIA` for the first occurrence, `VIA2` for the
/// second, so a caller can ask for "at least two Vias observed" (the
/// usual reply target) without enumerating headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeaderFlags(u32);

impl HeaderFlags {
    pub const NONE: HeaderFlags = HeaderFlags(0);
    pub const VIA: HeaderFlags = HeaderFlags(1 << 0);
    pub const VIA2: HeaderFlags = HeaderFlags(1 << 1);
    pub const TO: HeaderFlags = HeaderFlags(1 << 2);
    pub const FROM: HeaderFlags = HeaderFlags(1 << 3);
    pub const CSEQ: HeaderFlags = HeaderFlags(1 << 4);
    pub const CALL_ID: HeaderFlags = HeaderFlags(1 << 5);
    pub const CONTACT: HeaderFlags = HeaderFlags(1 << 6);
    pub const MAX_FORWARDS: HeaderFlags = HeaderFlags(1 << 7);
    pub const ROUTE: HeaderFlags = HeaderFlags(1 << 8);
    pub const RECORD_ROUTE: HeaderFlags = HeaderFlags(1 << 9);
    /// Set once the blank line terminating the header section was reached
    pub const END_OF_HEADERS: HeaderFlags = HeaderFlags(1 << 10);
    /// Every known header type plus end-of-headers
    pub const ALL: HeaderFlags = HeaderFlags((1 << 11) - 1);

    /// Target for requests: one Via observed
    pub fn request_default() -> HeaderFlags {
        Self::VIA
    }

    /// Target for replies: two Vias observed
    pub fn reply_default() -> HeaderFlags {
        Self::VIA | Self::VIA2
    }

    /// The flag corresponding to the first occurrence of a header kind.
    /// `Other` headers have no flag.
    pub fn for_kind(kind: HeaderKind) -> HeaderFlags {
        match kind {
            HeaderKind::Via => Self::VIA,
            HeaderKind::From => Self::FROM,
            HeaderKind::To => Self::TO,
            HeaderKind::CSeq => Self::CSEQ,
            HeaderKind::CallId => Self::CALL_ID,
            HeaderKind::Contact => Self::CONTACT,
            HeaderKind::MaxForwards => Self::MAX_FORWARDS,
            HeaderKind::Route => Self::ROUTE,
            HeaderKind::RecordRoute => Self::RECORD_ROUTE,
            HeaderKind::Other => Self::NONE,
        }
    }

    /// True when every bit of `other` is already set
    pub fn contains(self, other: HeaderFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: HeaderFlags) {
        self.0 |= other.0;
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn bits(self) -> u32 {
        self.0
    }
}

impl std::ops::BitOr for HeaderFlags {
    type Output = HeaderFlags;

    fn bitor(self, rhs: HeaderFlags) -> HeaderFlags {
        HeaderFlags(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for HeaderFlags {
    fn bitor_assign(&mut self, rhs: HeaderFlags) {
        self.0 |= rhs.0;
    }
}

/// A generic `;name[=value]` parameter; flags carry no value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param {
    pub name: Span,
    pub value: Option<Span>,
}

/// RFC 3261 token characters, shared by the method, header-name and
/// parameter scanners
pub(crate) fn is_token_char(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
            b'-' | b'.' | b'!' | b'%' | b'*' | b'_' | b'+' | b'`' | b'\'' | b'~'
        )
}
