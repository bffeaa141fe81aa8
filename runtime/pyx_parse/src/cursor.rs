//! Token cursor for navigating the token stream.

use std::mem::discriminant;

use pyx_ir::{Token, TokenKind};
use tracing::trace;

/// Position in a lexed token list.
///
/// The last token is always `Eof`; the cursor never advances past it.
pub(crate) struct Cursor {
    tokens: Vec<Token>,
    pos: usize,
}

impl Cursor {
    pub(crate) fn new(tokens: Vec<Token>) -> Self {
        Cursor { tokens, pos: 0 }
    }

    #[inline]
    pub(crate) fn current(&self) -> &TokenKind {
        self.nth(0)
    }

    /// Kind of the token `n` positions ahead, clamped to `Eof`.
    pub(crate) fn nth(&self, n: usize) -> &TokenKind {
        let index = (self.pos + n).min(self.tokens.len().saturating_sub(1));
        self.tokens
            .get(index)
            .map_or(&TokenKind::Eof, |token| &token.kind)
    }

    #[inline]
    pub(crate) fn line(&self) -> u32 {
        self.tokens.get(self.pos).map_or(0, |token| token.span.line)
    }

    /// Whether the current token has the same kind as `kind`, ignoring payloads.
    #[inline]
    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        discriminant(self.current()) == discriminant(kind)
    }

    #[inline]
    pub(crate) fn is_at_end(&self) -> bool {
        matches!(self.current(), TokenKind::Eof)
    }

    /// Consume the current token and return its kind.
    pub(crate) fn advance(&mut self) -> TokenKind {
        let kind = self.current().clone();
        trace!(pos = self.pos, kind = %kind, "advance");
        if !self.is_at_end() {
            self.pos += 1;
        }
        kind
    }

    /// Consume the current token if it matches `kind`.
    pub(crate) fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn skip_newlines(&mut self) {
        while self.check(&TokenKind::Newline) {
            self.advance();
        }
    }
}
