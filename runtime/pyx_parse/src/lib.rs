//! Pyx Parse - recursive descent parser for the scripting language.
//!
//! Turns source text into a [`Code`] object. The grammar is split across
//! `grammar::stmt` (statements and blocks) and `grammar::expr` (expressions
//! by precedence level).
//!
//! Deeply nested input is handled with [`pyx_stack::ensure_sufficient_stack`]
//! at every recursive entry point, so pathological sources grow the stack
//! instead of overflowing it. Nesting is also capped at [`MAX_NESTING`]:
//! syntax trees are freed recursively, so an unbounded tree could not be
//! dropped on an ordinary thread stack.

mod cursor;
mod error;
mod grammar;

pub use error::{ParseError, ParseErrorKind};

use cursor::Cursor;
use pyx_ir::{Code, CodeBody, CompileMode};
use pyx_stack::ensure_sufficient_stack;
use tracing::debug;

/// Deepest nesting of expressions, trailers, operator chains and blocks a
/// source may use.
pub const MAX_NESTING: u32 = 1_000;

/// Compile `source` in the given mode.
///
/// `filename` is carried into the [`Code`] object and into error messages.
pub fn parse(source: &str, filename: &str, mode: CompileMode) -> Result<Code, ParseError> {
    let tokens =
        pyx_lexer::tokenize(source).map_err(|err| ParseError::from_lex(err, filename))?;
    let mut parser = Parser::new(tokens, filename);
    let body = match mode {
        CompileMode::Eval => CodeBody::Expression(parser.parse_eval_input()?),
        CompileMode::Exec | CompileMode::Single => {
            CodeBody::Statements(parser.parse_file_input()?)
        }
    };
    debug!(filename, mode = mode.as_str(), "compiled");
    Ok(Code {
        mode,
        filename: filename.to_string(),
        body,
    })
}

/// Parser state.
pub(crate) struct Parser<'a> {
    cursor: Cursor,
    filename: &'a str,
    /// Enclosing loops in the current function body.
    loop_depth: u32,
    /// Enclosing `def`/`lambda` bodies.
    function_depth: u32,
    /// Current syntax tree depth, checked against [`MAX_NESTING`].
    nesting: u32,
}

impl<'a> Parser<'a> {
    fn new(tokens: Vec<pyx_ir::Token>, filename: &'a str) -> Self {
        Parser {
            cursor: Cursor::new(tokens),
            filename,
            loop_depth: 0,
            function_depth: 0,
            nesting: 0,
        }
    }

    pub(crate) fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError::new(kind, self.filename, self.cursor.line())
    }

    /// Go one level deeper into the tree being built.
    pub(crate) fn descend(&mut self) -> Result<(), ParseError> {
        if self.nesting >= MAX_NESTING {
            return Err(self.error(ParseErrorKind::TooDeeplyNested));
        }
        self.nesting += 1;
        Ok(())
    }

    /// Run a recursive production one level deeper.
    pub(crate) fn nested<T>(
        &mut self,
        production: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        self.descend()?;
        let result = ensure_sufficient_stack(|| production(self));
        self.nesting -= 1;
        result
    }
}

#[cfg(test)]
mod tests;
