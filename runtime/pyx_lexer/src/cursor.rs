//! Character cursor over source text.
//!
//! Tracks the byte offset and the current 1-based line so every token can be
//! stamped with a [`Span`](pyx_ir::Span) without a second pass.

use std::str::Chars;

pub(crate) struct Cursor<'src> {
    source: &'src str,
    chars: Chars<'src>,
    pos: usize,
    line: u32,
}

impl<'src> Cursor<'src> {
    pub(crate) fn new(source: &'src str) -> Self {
        Cursor {
            source,
            chars: source.chars(),
            pos: 0,
            line: 1,
        }
    }

    #[inline]
    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    #[inline]
    pub(crate) fn line(&self) -> u32 {
        self.line
    }

    #[inline]
    pub(crate) fn is_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    #[inline]
    pub(crate) fn current(&self) -> Option<char> {
        self.chars.clone().next()
    }

    #[inline]
    pub(crate) fn peek(&self) -> Option<char> {
        let mut ahead = self.chars.clone();
        ahead.next();
        ahead.next()
    }

    #[inline]
    pub(crate) fn peek_nth(&self, n: usize) -> Option<char> {
        self.chars.clone().nth(n)
    }

    /// Advance one character, keeping the line count current.
    pub(crate) fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    /// Advance while `pred` holds.
    pub(crate) fn eat_while(&mut self, mut pred: impl FnMut(char) -> bool) {
        while let Some(c) = self.current() {
            if !pred(c) {
                break;
            }
            self.bump();
        }
    }

    /// Advance past `s` if the input continues with it.
    pub(crate) fn eat_str(&mut self, s: &str) -> bool {
        if self.rest().starts_with(s) {
            for _ in s.chars() {
                self.bump();
            }
            true
        } else {
            false
        }
    }

    #[inline]
    pub(crate) fn rest(&self) -> &'src str {
        self.chars.as_str()
    }

    #[inline]
    pub(crate) fn slice(&self, start: usize, end: usize) -> &'src str {
        &self.source[start..end]
    }
}
