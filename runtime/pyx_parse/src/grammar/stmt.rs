//! Statement and block parsing.

use std::sync::Arc;

use pyx_ir::{BinaryOp, ExceptHandler, Expr, FunctionDef, ImportName, Stmt, TokenKind};

use crate::{ParseError, ParseErrorKind, Parser};

impl Parser<'_> {
    /// Parse one statement line (or compound statement) into `out`.
    ///
    /// A line of `;`-separated simple statements contributes several.
    pub(crate) fn parse_statement(&mut self, out: &mut Vec<Stmt>) -> Result<(), ParseError> {
        self.nested(|parser| parser.parse_statement_inner(out))
    }

    fn parse_statement_inner(&mut self, out: &mut Vec<Stmt>) -> Result<(), ParseError> {
        let stmt = match self.cursor.current() {
            TokenKind::If => self.parse_if()?,
            TokenKind::While => self.parse_while()?,
            TokenKind::For => self.parse_for()?,
            TokenKind::Def => self.parse_def()?,
            TokenKind::Try => self.parse_try()?,
            _ => return self.parse_simple_line(out),
        };
        out.push(stmt);
        Ok(())
    }

    fn parse_simple_line(&mut self, out: &mut Vec<Stmt>) -> Result<(), ParseError> {
        loop {
            out.push(self.parse_simple_statement()?);
            if !self.cursor.eat(&TokenKind::Semicolon) {
                break;
            }
            if matches!(self.cursor.current(), TokenKind::Newline | TokenKind::Eof) {
                break;
            }
        }
        if self.cursor.eat(&TokenKind::Newline) || self.cursor.is_at_end() {
            Ok(())
        } else {
            Err(self.unexpected("end of statement"))
        }
    }

    fn parse_simple_statement(&mut self) -> Result<Stmt, ParseError> {
        match self.cursor.current() {
            TokenKind::Pass => {
                self.cursor.advance();
                Ok(Stmt::Pass)
            }
            TokenKind::Break => {
                if self.loop_depth == 0 {
                    return Err(self.error(ParseErrorKind::OutsideLoop("break")));
                }
                self.cursor.advance();
                Ok(Stmt::Break)
            }
            TokenKind::Continue => {
                if self.loop_depth == 0 {
                    return Err(self.error(ParseErrorKind::OutsideLoop("continue")));
                }
                self.cursor.advance();
                Ok(Stmt::Continue)
            }
            TokenKind::Return => {
                if self.function_depth == 0 {
                    return Err(self.error(ParseErrorKind::ReturnOutsideFunction));
                }
                self.cursor.advance();
                let value = self.parse_optional_testlist()?;
                Ok(Stmt::Return(value))
            }
            TokenKind::Raise => {
                self.cursor.advance();
                let value = self.parse_optional_testlist()?;
                Ok(Stmt::Raise(value))
            }
            TokenKind::Global => {
                self.cursor.advance();
                let mut names = vec![self.expect_ident()?];
                while self.cursor.eat(&TokenKind::Comma) {
                    names.push(self.expect_ident()?);
                }
                Ok(Stmt::Global(names))
            }
            TokenKind::Del => {
                self.cursor.advance();
                let mut targets = Vec::new();
                loop {
                    let expr = self.parse_test()?;
                    targets.push(self.to_target(expr)?);
                    if !self.cursor.eat(&TokenKind::Comma) {
                        break;
                    }
                }
                Ok(Stmt::Delete(targets))
            }
            TokenKind::Assert => {
                self.cursor.advance();
                let test = self.parse_test()?;
                let msg = if self.cursor.eat(&TokenKind::Comma) {
                    Some(self.parse_test()?)
                } else {
                    None
                };
                Ok(Stmt::Assert { test, msg })
            }
            TokenKind::Import => self.parse_import(),
            TokenKind::From => self.parse_import_from(),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_optional_testlist(&mut self) -> Result<Option<Expr>, ParseError> {
        if self.cursor.current().starts_expression() {
            Ok(Some(self.parse_testlist()?))
        } else {
            Ok(None)
        }
    }

    /// Expression statement, assignment chain or augmented assignment.
    fn parse_expression_statement(&mut self) -> Result<Stmt, ParseError> {
        let first = self.parse_testlist()?;

        if let Some(op) = self.eat_augmented_op() {
            let target = self.to_target(first)?;
            if matches!(target, pyx_ir::Target::Unpack(_)) {
                return Err(self.error(ParseErrorKind::InvalidTarget("tuple")));
            }
            let value = self.parse_testlist()?;
            return Ok(Stmt::AugAssign { target, op, value });
        }

        if !self.cursor.check(&TokenKind::Eq) {
            return Ok(Stmt::Expr(first));
        }

        let mut exprs = vec![first];
        while self.cursor.eat(&TokenKind::Eq) {
            exprs.push(self.parse_testlist()?);
        }
        let value = exprs.pop().unwrap_or(Expr::None);
        let targets = exprs
            .into_iter()
            .map(|expr| self.to_target(expr))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Stmt::Assign { targets, value })
    }

    fn eat_augmented_op(&mut self) -> Option<BinaryOp> {
        let op = match self.cursor.current() {
            TokenKind::PlusEq => BinaryOp::Add,
            TokenKind::MinusEq => BinaryOp::Sub,
            TokenKind::StarEq => BinaryOp::Mul,
            TokenKind::SlashEq => BinaryOp::Div,
            TokenKind::DoubleSlashEq => BinaryOp::FloorDiv,
            TokenKind::PercentEq => BinaryOp::Mod,
            TokenKind::DoubleStarEq => BinaryOp::Pow,
            _ => return None,
        };
        self.cursor.advance();
        Some(op)
    }

    fn parse_dotted_name(&mut self) -> Result<String, ParseError> {
        let mut name = self.expect_ident()?;
        while self.cursor.eat(&TokenKind::Dot) {
            name.push('.');
            name.push_str(&self.expect_ident()?);
        }
        Ok(name)
    }

    fn parse_alias(&mut self) -> Result<Option<String>, ParseError> {
        if self.cursor.eat(&TokenKind::As) {
            Ok(Some(self.expect_ident()?))
        } else {
            Ok(None)
        }
    }

    /// `import a.b [as c], ...`
    fn parse_import(&mut self) -> Result<Stmt, ParseError> {
        self.cursor.advance();
        let mut names = Vec::new();
        loop {
            let module = self.parse_dotted_name()?;
            let alias = self.parse_alias()?;
            names.push(ImportName { module, alias });
            if !self.cursor.eat(&TokenKind::Comma) {
                break;
            }
        }
        Ok(Stmt::Import(names))
    }

    /// `from a.b import (x [as y], ...)` or `from a import *`
    fn parse_import_from(&mut self) -> Result<Stmt, ParseError> {
        self.cursor.advance();
        let module = self.parse_dotted_name()?;
        self.expect(&TokenKind::Import, "'import'")?;
        if self.cursor.eat(&TokenKind::Star) {
            return Ok(Stmt::ImportFrom {
                module,
                names: vec![("*".to_string(), None)],
            });
        }
        let parenthesized = self.cursor.eat(&TokenKind::LParen);
        let mut names = Vec::new();
        loop {
            let name = self.expect_ident()?;
            let alias = self.parse_alias()?;
            names.push((name, alias));
            if !self.cursor.eat(&TokenKind::Comma) {
                break;
            }
            if parenthesized && self.cursor.check(&TokenKind::RParen) {
                break;
            }
        }
        if parenthesized {
            self.expect(&TokenKind::RParen, "')'")?;
        }
        Ok(Stmt::ImportFrom { module, names })
    }

    /// `':' (simple_line | NEWLINE INDENT stmt+ DEDENT)`
    fn parse_block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        self.expect(&TokenKind::Colon, "':'")?;
        let mut body = Vec::new();
        if !self.cursor.eat(&TokenKind::Newline) {
            self.parse_simple_line(&mut body)?;
            return Ok(body);
        }
        if !self.cursor.eat(&TokenKind::Indent) {
            return Err(self.error(ParseErrorKind::ExpectedIndent));
        }
        while !self.cursor.eat(&TokenKind::Dedent) {
            if self.cursor.is_at_end() {
                break;
            }
            self.parse_statement(&mut body)?;
        }
        Ok(body)
    }

    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        self.cursor.advance();
        let test = self.parse_test()?;
        let body = self.parse_block()?;
        let orelse = match self.cursor.current() {
            TokenKind::Elif => vec![self.parse_if()?],
            TokenKind::Else => {
                self.cursor.advance();
                self.parse_block()?
            }
            _ => Vec::new(),
        };
        Ok(Stmt::If { test, body, orelse })
    }

    fn parse_loop_body(&mut self) -> Result<Vec<Stmt>, ParseError> {
        self.loop_depth += 1;
        let body = self.parse_block();
        self.loop_depth -= 1;
        body
    }

    fn parse_loop_else(&mut self) -> Result<Vec<Stmt>, ParseError> {
        if self.cursor.eat(&TokenKind::Else) {
            self.parse_block()
        } else {
            Ok(Vec::new())
        }
    }

    fn parse_while(&mut self) -> Result<Stmt, ParseError> {
        self.cursor.advance();
        let test = self.parse_test()?;
        let body = self.parse_loop_body()?;
        let orelse = self.parse_loop_else()?;
        Ok(Stmt::While { test, body, orelse })
    }

    fn parse_for(&mut self) -> Result<Stmt, ParseError> {
        self.cursor.advance();
        let target = self.parse_target_list()?;
        self.expect(&TokenKind::In, "'in'")?;
        let iter = self.parse_testlist()?;
        let body = self.parse_loop_body()?;
        let orelse = self.parse_loop_else()?;
        Ok(Stmt::For {
            target,
            iter,
            body,
            orelse,
        })
    }

    fn parse_def(&mut self) -> Result<Stmt, ParseError> {
        self.cursor.advance();
        let name = self.expect_ident()?;
        self.expect(&TokenKind::LParen, "'('")?;
        let params = self.parse_parameters(&TokenKind::RParen)?;
        self.expect(&TokenKind::RParen, "')'")?;
        if self.cursor.eat(&TokenKind::Arrow) {
            // Return annotations are accepted and ignored.
            self.parse_test()?;
        }

        let saved_loops = std::mem::replace(&mut self.loop_depth, 0);
        self.function_depth += 1;
        let body = self.parse_block();
        self.function_depth -= 1;
        self.loop_depth = saved_loops;

        let def = FunctionDef::new(name, params, body?);
        Ok(Stmt::FunctionDef(Arc::new(def)))
    }

    fn parse_try(&mut self) -> Result<Stmt, ParseError> {
        self.cursor.advance();
        let body = self.parse_block()?;

        let mut handlers = Vec::new();
        while self.cursor.eat(&TokenKind::Except) {
            let (kind, name) = if self.cursor.check(&TokenKind::Colon) {
                (None, None)
            } else {
                let kind = self.parse_test()?;
                let name = self.parse_alias()?;
                (Some(kind), name)
            };
            let body = self.parse_block()?;
            handlers.push(ExceptHandler { kind, name, body });
        }

        let orelse = if !handlers.is_empty() && self.cursor.eat(&TokenKind::Else) {
            self.parse_block()?
        } else {
            Vec::new()
        };
        let finalbody = if self.cursor.eat(&TokenKind::Finally) {
            self.parse_block()?
        } else {
            Vec::new()
        };

        if handlers.is_empty() && finalbody.is_empty() {
            return Err(self.unexpected("'except' or 'finally'"));
        }
        Ok(Stmt::Try {
            body,
            handlers,
            orelse,
            finalbody,
        })
    }
}
