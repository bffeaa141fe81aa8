//! Parse errors.
//!
//! The engine turns a `ParseError` into a `SyntaxError` exception, using the
//! `Display` text as the exception message.

use pyx_lexer::LexError;

/// Why parsing failed.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ParseErrorKind {
    #[error("invalid syntax")]
    InvalidSyntax,
    #[error("{0}")]
    Lex(pyx_lexer::LexErrorKind),
    #[error("expected {expected}, found {found}")]
    Expected {
        expected: &'static str,
        found: String,
    },
    #[error("cannot assign to {0}")]
    InvalidTarget(&'static str),
    #[error("expected an indented block")]
    ExpectedIndent,
    #[error("unexpected indent")]
    UnexpectedIndent,
    #[error("'{0}' outside loop")]
    OutsideLoop(&'static str),
    #[error("'return' outside function")]
    ReturnOutsideFunction,
    #[error("non-default argument follows default argument")]
    DefaultOrdering,
    #[error("too many nested expressions or blocks")]
    TooDeeplyNested,
}

/// A syntax error with its location.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[error("{kind} ({filename}, line {line})")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub filename: String,
    pub line: u32,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, filename: &str, line: u32) -> Self {
        ParseError {
            kind,
            filename: filename.to_string(),
            line,
        }
    }

    pub(crate) fn from_lex(err: LexError, filename: &str) -> Self {
        ParseError::new(ParseErrorKind::Lex(err.kind), filename, err.span.line)
    }
}
