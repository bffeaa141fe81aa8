//! Expression parsing, one method per precedence level.
//!
//! Loosest to tightest: lambda / conditional, `or`, `and`, `not`,
//! comparisons, `+ -`, `* / // %`, unary `+ -`, `**`, then primaries with
//! their call, subscript and attribute trailers.

use std::sync::Arc;

use pyx_ir::{
    Argument, BinaryOp, BoolOp, CompareOp, Comprehension, Expr, FunctionDef, Param, Parameters,
    Stmt, Target, TokenKind, UnaryOp,
};
use tracing::trace;

use crate::{ParseError, ParseErrorKind, Parser};

impl Parser<'_> {
    /// `testlist: test (',' test)* [',']`; a comma makes a tuple.
    pub(crate) fn parse_testlist(&mut self) -> Result<Expr, ParseError> {
        let first = self.parse_test()?;
        if !self.cursor.check(&TokenKind::Comma) {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.cursor.eat(&TokenKind::Comma) {
            if !self.cursor.current().starts_expression() {
                break;
            }
            items.push(self.parse_test()?);
        }
        Ok(Expr::Tuple(items))
    }

    pub(crate) fn parse_test(&mut self) -> Result<Expr, ParseError> {
        self.nested(Self::parse_test_inner)
    }

    fn parse_test_inner(&mut self) -> Result<Expr, ParseError> {
        if self.cursor.check(&TokenKind::Lambda) {
            return self.parse_lambda();
        }
        let body = self.parse_or_test()?;
        if !self.cursor.eat(&TokenKind::If) {
            return Ok(body);
        }
        let test = self.parse_or_test()?;
        self.expect(&TokenKind::Else, "'else'")?;
        let orelse = self.parse_test()?;
        Ok(Expr::IfExp {
            test: Box::new(test),
            body: Box::new(body),
            orelse: Box::new(orelse),
        })
    }

    fn parse_lambda(&mut self) -> Result<Expr, ParseError> {
        self.cursor.advance();
        let params = self.parse_parameters(&TokenKind::Colon)?;
        self.expect(&TokenKind::Colon, "':'")?;
        self.function_depth += 1;
        let body = self.parse_test();
        self.function_depth -= 1;
        let def = FunctionDef::new("<lambda>".to_string(), params, vec![Stmt::Return(Some(body?))]);
        Ok(Expr::Lambda(Arc::new(def)))
    }

    /// Parameter list up to (not including) `close`.
    pub(crate) fn parse_parameters(&mut self, close: &TokenKind) -> Result<Parameters, ParseError> {
        let mut params = Parameters::default();
        while !self.cursor.check(close) {
            if self.cursor.eat(&TokenKind::Star) {
                params.varargs = Some(self.expect_ident()?);
            } else {
                if params.varargs.is_some() {
                    return Err(self.unexpected(close_name(close)));
                }
                let name = self.expect_ident()?;
                let default = if self.cursor.eat(&TokenKind::Eq) {
                    Some(self.parse_test()?)
                } else {
                    None
                };
                let follows_default = params.positional.last().is_some_and(|p| p.default.is_some());
                if default.is_none() && follows_default {
                    return Err(self.error(ParseErrorKind::DefaultOrdering));
                }
                params.positional.push(Param { name, default });
            }
            if !self.cursor.eat(&TokenKind::Comma) {
                break;
            }
        }
        Ok(params)
    }

    fn parse_or_test(&mut self) -> Result<Expr, ParseError> {
        let first = self.parse_and_test()?;
        if !self.cursor.check(&TokenKind::Or) {
            return Ok(first);
        }
        let mut values = vec![first];
        while self.cursor.eat(&TokenKind::Or) {
            values.push(self.parse_and_test()?);
        }
        Ok(Expr::BoolOp {
            op: BoolOp::Or,
            values,
        })
    }

    fn parse_and_test(&mut self) -> Result<Expr, ParseError> {
        let first = self.parse_not_test()?;
        if !self.cursor.check(&TokenKind::And) {
            return Ok(first);
        }
        let mut values = vec![first];
        while self.cursor.eat(&TokenKind::And) {
            values.push(self.parse_not_test()?);
        }
        Ok(Expr::BoolOp {
            op: BoolOp::And,
            values,
        })
    }

    fn parse_not_test(&mut self) -> Result<Expr, ParseError> {
        if self.cursor.eat(&TokenKind::Not) {
            let operand = self.nested(Self::parse_not_test)?;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_arith()?;
        let mut ops = Vec::new();
        while let Some(op) = self.eat_compare_op() {
            ops.push((op, self.parse_arith()?));
        }
        if ops.is_empty() {
            Ok(left)
        } else {
            Ok(Expr::Compare {
                left: Box::new(left),
                ops,
            })
        }
    }

    fn eat_compare_op(&mut self) -> Option<CompareOp> {
        let op = match self.cursor.current() {
            TokenKind::EqEq => CompareOp::Eq,
            TokenKind::NotEq => CompareOp::NotEq,
            TokenKind::Lt => CompareOp::Lt,
            TokenKind::LtEq => CompareOp::LtEq,
            TokenKind::Gt => CompareOp::Gt,
            TokenKind::GtEq => CompareOp::GtEq,
            TokenKind::In => CompareOp::In,
            TokenKind::Not if matches!(self.cursor.nth(1), TokenKind::In) => {
                self.cursor.advance();
                CompareOp::NotIn
            }
            TokenKind::Is if matches!(self.cursor.nth(1), TokenKind::Not) => {
                self.cursor.advance();
                CompareOp::IsNot
            }
            TokenKind::Is => CompareOp::Is,
            _ => return None,
        };
        self.cursor.advance();
        Some(op)
    }

    /// Operator chains nest to the left, one tree level per operator.
    fn parse_arith(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_term()?;
        let mark = self.nesting;
        loop {
            let op = match self.cursor.current() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.cursor.advance();
            self.descend()?;
            let right = self.parse_term()?;
            left = binary(op, left, right);
        }
        self.nesting = mark;
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_factor()?;
        let mark = self.nesting;
        loop {
            let op = match self.cursor.current() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::DoubleSlash => BinaryOp::FloorDiv,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.cursor.advance();
            self.descend()?;
            let right = self.parse_factor()?;
            left = binary(op, left, right);
        }
        self.nesting = mark;
        Ok(left)
    }

    fn parse_factor(&mut self) -> Result<Expr, ParseError> {
        let op = match self.cursor.current() {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Plus => UnaryOp::Pos,
            _ => return self.parse_power(),
        };
        self.cursor.advance();
        let operand = self.nested(Self::parse_factor)?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    /// `power: primary ['**' factor]`; right-associative through `factor`.
    fn parse_power(&mut self) -> Result<Expr, ParseError> {
        let base = self.parse_primary()?;
        if self.cursor.eat(&TokenKind::DoubleStar) {
            let exponent = self.parse_factor()?;
            return Ok(binary(BinaryOp::Pow, base, exponent));
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_atom()?;
        let mark = self.nesting;
        loop {
            if matches!(
                self.cursor.current(),
                TokenKind::LParen | TokenKind::LBracket | TokenKind::Dot
            ) {
                self.descend()?;
            }
            match self.cursor.current() {
                TokenKind::LParen => {
                    self.cursor.advance();
                    let args = self.parse_call_args()?;
                    expr = Expr::Call {
                        func: Box::new(expr),
                        args,
                    };
                }
                TokenKind::LBracket => {
                    self.cursor.advance();
                    let index = self.parse_subscript()?;
                    self.expect(&TokenKind::RBracket, "']'")?;
                    expr = Expr::Subscript {
                        value: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                TokenKind::Dot => {
                    self.cursor.advance();
                    let attr = self.expect_ident()?;
                    expr = Expr::Attribute {
                        value: Box::new(expr),
                        attr,
                    };
                }
                _ => break,
            }
        }
        self.nesting = mark;
        Ok(expr)
    }

    fn parse_call_args(&mut self) -> Result<Vec<Argument>, ParseError> {
        let mut args = Vec::new();
        while !self.cursor.check(&TokenKind::RParen) {
            if self.cursor.eat(&TokenKind::Star) {
                args.push(Argument::Starred(self.parse_test()?));
            } else if matches!(self.cursor.current(), TokenKind::Ident(_))
                && matches!(self.cursor.nth(1), TokenKind::Eq)
            {
                let name = self.expect_ident()?;
                self.cursor.advance();
                args.push(Argument::Keyword(name, self.parse_test()?));
            } else {
                let value = self.parse_test()?;
                if args.is_empty() && self.cursor.check(&TokenKind::For) {
                    let generators = self.parse_comp_for()?;
                    args.push(Argument::Positional(Expr::ListComp {
                        element: Box::new(value),
                        generators,
                    }));
                    break;
                }
                args.push(Argument::Positional(value));
            }
            if !self.cursor.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen, "')'")?;
        Ok(args)
    }

    fn parse_subscript(&mut self) -> Result<Expr, ParseError> {
        let first = self.parse_slice_item()?;
        if !self.cursor.check(&TokenKind::Comma) {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.cursor.eat(&TokenKind::Comma) {
            if self.cursor.check(&TokenKind::RBracket) {
                break;
            }
            items.push(self.parse_slice_item()?);
        }
        Ok(Expr::Tuple(items))
    }

    fn parse_slice_item(&mut self) -> Result<Expr, ParseError> {
        let lower = if self.cursor.check(&TokenKind::Colon) {
            None
        } else {
            let expr = self.parse_test()?;
            if !self.cursor.check(&TokenKind::Colon) {
                return Ok(expr);
            }
            Some(Box::new(expr))
        };
        self.expect(&TokenKind::Colon, "':'")?;
        let upper = self.parse_slice_bound()?;
        let step = if self.cursor.eat(&TokenKind::Colon) {
            self.parse_slice_bound()?
        } else {
            None
        };
        Ok(Expr::Slice { lower, upper, step })
    }

    fn parse_slice_bound(&mut self) -> Result<Option<Box<Expr>>, ParseError> {
        if matches!(
            self.cursor.current(),
            TokenKind::Colon | TokenKind::Comma | TokenKind::RBracket
        ) {
            Ok(None)
        } else {
            Ok(Some(Box::new(self.parse_test()?)))
        }
    }

    fn parse_atom(&mut self) -> Result<Expr, ParseError> {
        trace!(line = self.cursor.line(), kind = %self.cursor.current(), "parse_atom");
        let expr = match self.cursor.current() {
            TokenKind::Int(n) => Expr::Int(*n),
            TokenKind::Float(x) => Expr::Float(*x),
            TokenKind::Str(_) => return Ok(self.parse_strings()),
            TokenKind::True => Expr::Bool(true),
            TokenKind::False => Expr::Bool(false),
            TokenKind::None => Expr::None,
            TokenKind::Ident(name) => Expr::Name(name.clone()),
            TokenKind::LParen => {
                self.cursor.advance();
                return self.parse_paren();
            }
            TokenKind::LBracket => {
                self.cursor.advance();
                return self.parse_list_display();
            }
            TokenKind::LBrace => {
                self.cursor.advance();
                return self.parse_brace_display();
            }
            _ => return Err(self.unexpected("an expression")),
        };
        self.cursor.advance();
        Ok(expr)
    }

    /// Adjacent string literals concatenate.
    fn parse_strings(&mut self) -> Expr {
        let mut text = String::new();
        while let TokenKind::Str(part) = self.cursor.current() {
            text.push_str(part);
            self.cursor.advance();
        }
        Expr::Str(text)
    }

    fn parse_paren(&mut self) -> Result<Expr, ParseError> {
        if self.cursor.eat(&TokenKind::RParen) {
            return Ok(Expr::Tuple(Vec::new()));
        }
        let first = self.parse_test()?;
        if self.cursor.check(&TokenKind::For) {
            let generators = self.parse_comp_for()?;
            self.expect(&TokenKind::RParen, "')'")?;
            return Ok(Expr::ListComp {
                element: Box::new(first),
                generators,
            });
        }
        if self.cursor.eat(&TokenKind::RParen) {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.cursor.eat(&TokenKind::Comma) {
            if self.cursor.check(&TokenKind::RParen) {
                break;
            }
            items.push(self.parse_test()?);
        }
        self.expect(&TokenKind::RParen, "')'")?;
        Ok(Expr::Tuple(items))
    }

    fn parse_list_display(&mut self) -> Result<Expr, ParseError> {
        if self.cursor.eat(&TokenKind::RBracket) {
            return Ok(Expr::List(Vec::new()));
        }
        let first = self.parse_test()?;
        if self.cursor.check(&TokenKind::For) {
            let generators = self.parse_comp_for()?;
            self.expect(&TokenKind::RBracket, "']'")?;
            return Ok(Expr::ListComp {
                element: Box::new(first),
                generators,
            });
        }
        let mut items = vec![first];
        while self.cursor.eat(&TokenKind::Comma) {
            if self.cursor.check(&TokenKind::RBracket) {
                break;
            }
            items.push(self.parse_test()?);
        }
        self.expect(&TokenKind::RBracket, "']'")?;
        Ok(Expr::List(items))
    }

    fn parse_brace_display(&mut self) -> Result<Expr, ParseError> {
        if self.cursor.eat(&TokenKind::RBrace) {
            return Ok(Expr::Dict(Vec::new()));
        }
        let first = self.parse_test()?;
        if self.cursor.eat(&TokenKind::Colon) {
            let mut entries = vec![(first, self.parse_test()?)];
            while self.cursor.eat(&TokenKind::Comma) {
                if self.cursor.check(&TokenKind::RBrace) {
                    break;
                }
                let key = self.parse_test()?;
                self.expect(&TokenKind::Colon, "':'")?;
                entries.push((key, self.parse_test()?));
            }
            self.expect(&TokenKind::RBrace, "'}'")?;
            return Ok(Expr::Dict(entries));
        }
        let mut items = vec![first];
        while self.cursor.eat(&TokenKind::Comma) {
            if self.cursor.check(&TokenKind::RBrace) {
                break;
            }
            items.push(self.parse_test()?);
        }
        self.expect(&TokenKind::RBrace, "'}'")?;
        Ok(Expr::Set(items))
    }

    /// One or more `for target in iter [if cond]*` clauses.
    fn parse_comp_for(&mut self) -> Result<Vec<Comprehension>, ParseError> {
        let mut generators = Vec::new();
        while self.cursor.eat(&TokenKind::For) {
            let target = self.parse_target_list()?;
            self.expect(&TokenKind::In, "'in'")?;
            let iter = self.parse_or_test()?;
            let mut conditions = Vec::new();
            while self.cursor.eat(&TokenKind::If) {
                conditions.push(self.parse_or_test()?);
            }
            generators.push(Comprehension {
                target,
                iter,
                conditions,
            });
        }
        Ok(generators)
    }

    /// Loop target: stops before `in`, so items parse below comparisons.
    pub(crate) fn parse_target_list(&mut self) -> Result<Target, ParseError> {
        let first = self.parse_arith()?;
        if !self.cursor.check(&TokenKind::Comma) {
            return self.to_target(first);
        }
        let mut items = vec![first];
        while self.cursor.eat(&TokenKind::Comma) {
            if self.cursor.check(&TokenKind::In) {
                break;
            }
            items.push(self.parse_arith()?);
        }
        self.to_target(Expr::Tuple(items))
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn close_name(close: &TokenKind) -> &'static str {
    match close {
        TokenKind::RParen => "')'",
        _ => "':'",
    }
}
