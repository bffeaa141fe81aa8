//! Lexer error types.
//!
//! Every lexer error becomes a `SyntaxError` inside the engine, so the
//! `Display` text is what the host ends up printing.

use pyx_ir::Span;

/// A lexer error: what went wrong and where.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{kind} (line {})", .span.line)]
pub struct LexError {
    pub span: Span,
    pub kind: LexErrorKind,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LexErrorKind {
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("integer literal too large")]
    IntOverflow,
    #[error("invalid number literal '{0}'")]
    InvalidNumber(String),
    #[error("invalid character '{0}'")]
    InvalidCharacter(char),
    #[error("unindent does not match any outer indentation level")]
    InconsistentDedent,
    #[error("unexpected character after line continuation character")]
    BadContinuation,
    #[error("unmatched '{0}'")]
    UnmatchedBracket(char),
}

impl LexError {
    #[inline]
    pub(crate) fn new(kind: LexErrorKind, span: Span) -> Self {
        LexError { span, kind }
    }
}
