//! Byte ranges into the raw message for zero-copy parsing

/// Represents a range of text within a message for zero-copy parsing.
///
/// Offsets are `u16` on purpose: the parser rejects messages larger than
/// 64KB - 1 (see [`crate::limits::MAX_MESSAGE_SIZE`]), which keeps every
/// span at four bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: u16,
    pub end: u16,
}

impl Span {
    /// Create a new Span
    pub fn new(start: u16, end: u16) -> Self {
        Span { start, end }
    }

    /// Create a Span from usize offsets
    pub fn from_usize(start: usize, end: usize) -> Self {
        Span {
            start: start as u16,
            end: end as u16,
        }
    }

    /// Get the string slice this span represents
    pub fn as_str<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start as usize..self.end as usize]
    }

    /// Get the length of this span
    pub fn len(&self) -> usize {
        (self.end - self.start) as usize
    }

    /// Check if this span is empty
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}
