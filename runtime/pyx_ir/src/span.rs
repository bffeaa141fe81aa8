//! Source location spans.

use std::fmt;

/// Byte range in the source text plus the 1-based line it starts on.
///
/// Lines are kept alongside the offsets because every diagnostic the host
/// sees is line-oriented (`invalid syntax (<name>, line 3)`).
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct Span {
    pub start: u32,
    pub end: u32,
    pub line: u32,
}

impl Span {
    /// Span for synthesized tokens (e.g. the implicit trailing `NEWLINE`).
    pub const DUMMY: Span = Span {
        start: 0,
        end: 0,
        line: 0,
    };

    #[inline]
    pub const fn new(start: u32, end: u32, line: u32) -> Self {
        Span { start, end, line }
    }

    /// Length in bytes.
    #[inline]
    pub const fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}@{}", self.start, self.end, self.line)
    }
}
