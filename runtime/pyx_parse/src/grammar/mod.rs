//! Grammar productions.
//!
//! Shared helpers live here; productions are split by syntactic category.

mod expr;
mod stmt;

use pyx_ir::{Expr, Stmt, Target, TokenKind};

use crate::{ParseError, ParseErrorKind, Parser};

impl Parser<'_> {
    /// `eval_input: testlist NEWLINE* EOF`
    pub(crate) fn parse_eval_input(&mut self) -> Result<Expr, ParseError> {
        self.cursor.skip_newlines();
        let expr = self.parse_testlist()?;
        self.cursor.skip_newlines();
        self.expect_end()?;
        Ok(expr)
    }

    /// `file_input: (NEWLINE | stmt)* EOF`
    pub(crate) fn parse_file_input(&mut self) -> Result<Vec<Stmt>, ParseError> {
        let mut body = Vec::new();
        loop {
            self.cursor.skip_newlines();
            if self.cursor.is_at_end() {
                break;
            }
            if self.cursor.check(&TokenKind::Indent) {
                return Err(self.error(ParseErrorKind::UnexpectedIndent));
            }
            self.parse_statement(&mut body)?;
        }
        Ok(body)
    }

    fn expect_end(&self) -> Result<(), ParseError> {
        if self.cursor.is_at_end() {
            Ok(())
        } else {
            Err(self.unexpected("end of input"))
        }
    }

    /// Consume `kind` or fail naming what was expected.
    pub(crate) fn expect(
        &mut self,
        kind: &TokenKind,
        expected: &'static str,
    ) -> Result<(), ParseError> {
        if self.cursor.eat(kind) {
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    pub(crate) fn expect_ident(&mut self) -> Result<String, ParseError> {
        match self.cursor.current() {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.cursor.advance();
                Ok(name)
            }
            _ => Err(self.unexpected("a name")),
        }
    }

    /// Error for an unexpected current token.
    ///
    /// Layout and end-of-input surprises read as plain "invalid syntax",
    /// the way interactive users expect to see them.
    pub(crate) fn unexpected(&self, expected: &'static str) -> ParseError {
        let found = self.cursor.current();
        let kind = match found {
            TokenKind::Newline | TokenKind::Eof | TokenKind::Dedent => {
                ParseErrorKind::InvalidSyntax
            }
            TokenKind::Indent => ParseErrorKind::UnexpectedIndent,
            other => ParseErrorKind::Expected {
                expected,
                found: other.to_string(),
            },
        };
        self.error(kind)
    }

    /// Reinterpret a parsed expression as an assignment target.
    pub(crate) fn to_target(&self, expr: Expr) -> Result<Target, ParseError> {
        match expr {
            Expr::Name(name) => Ok(Target::Name(name)),
            Expr::Tuple(items) | Expr::List(items) => items
                .into_iter()
                .map(|item| self.to_target(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Target::Unpack),
            Expr::Subscript { value, index } => Ok(Target::Subscript {
                value: *value,
                index: *index,
            }),
            Expr::Attribute { value, attr } => Ok(Target::Attribute { value: *value, attr }),
            Expr::Call { .. } => Err(self.error(ParseErrorKind::InvalidTarget("function call"))),
            Expr::Int(_) | Expr::Float(_) | Expr::Str(_) | Expr::Bool(_) | Expr::None => {
                Err(self.error(ParseErrorKind::InvalidTarget("literal")))
            }
            _ => Err(self.error(ParseErrorKind::InvalidTarget("expression"))),
        }
    }
}
