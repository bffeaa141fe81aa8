//! Pyx Lexer - tokenizer for the embedded scripting language.
//!
//! Converts source text into a flat token list. Line structure is made
//! explicit: the lexer emits `Newline` at the end of each logical line and
//! `Indent`/`Dedent` whenever the leading whitespace of a line changes.
//! Inside brackets, newlines and indentation are insignificant.
//!
//! # Rules
//!
//! - Blank lines and comment-only lines produce no tokens.
//! - A tab advances the indentation column to the next multiple of 8.
//! - A dedent must land exactly on an enclosing indentation level.
//! - The token stream always ends with `Newline`, any pending `Dedent`s,
//!   then `Eof` (the `Newline` is omitted for empty input).

mod cook_escape;
mod cursor;
mod lex_error;

pub use lex_error::{LexError, LexErrorKind};

use cursor::Cursor;
use pyx_ir::{Span, Token, TokenKind};

/// Tokenize `source`.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(source).run()
}

struct Lexer<'src> {
    cursor: Cursor<'src>,
    tokens: Vec<Token>,
    /// Indentation columns of the enclosing blocks; always starts with 0.
    indents: Vec<u32>,
    /// Open brackets, innermost last.
    brackets: Vec<(char, Span)>,
    at_line_start: bool,
}

impl<'src> Lexer<'src> {
    fn new(source: &'src str) -> Self {
        Lexer {
            cursor: Cursor::new(source),
            tokens: Vec::new(),
            indents: vec![0],
            brackets: Vec::new(),
            at_line_start: true,
        }
    }

    fn run(mut self) -> Result<Vec<Token>, LexError> {
        loop {
            if self.at_line_start && self.brackets.is_empty() {
                self.read_indentation()?;
                if self.at_line_start {
                    // Blank or comment-only line; `read_indentation` consumed it.
                    if self.cursor.is_eof() {
                        break;
                    }
                    continue;
                }
            }

            let Some(c) = self.cursor.current() else {
                break;
            };

            match c {
                ' ' | '\t' | '\x0c' | '\r' => {
                    self.cursor.bump();
                }
                '#' => self.skip_comment(),
                '\n' => {
                    let span = self.here();
                    self.cursor.bump();
                    if self.brackets.is_empty() {
                        self.push_newline(span);
                        self.at_line_start = true;
                    }
                }
                '\\' => self.line_continuation()?,
                '0'..='9' => self.number()?,
                '.' if self.cursor.peek().is_some_and(|n| n.is_ascii_digit()) => self.number()?,
                '\'' | '"' => self.string(false)?,
                c if is_ident_start(c) => self.ident_or_prefixed_string()?,
                _ => self.operator()?,
            }
        }
        self.finish()
    }

    /// Measure the indentation of a new line and emit layout tokens.
    ///
    /// Leaves `at_line_start` set when the line turned out to be blank.
    fn read_indentation(&mut self) -> Result<(), LexError> {
        let mut column: u32 = 0;
        loop {
            match self.cursor.current() {
                Some(' ') => column += 1,
                Some('\t') => column = (column / 8 + 1) * 8,
                Some('\x0c' | '\r') => {}
                _ => break,
            }
            self.cursor.bump();
        }

        match self.cursor.current() {
            None => return Ok(()),
            Some('#') => {
                self.skip_comment();
                if self.cursor.current() == Some('\n') {
                    self.cursor.bump();
                }
                return Ok(());
            }
            Some('\n') => {
                self.cursor.bump();
                return Ok(());
            }
            Some(_) => {}
        }

        self.at_line_start = false;
        let span = self.here();
        let current = self.indents.last().copied().unwrap_or(0);
        if column > current {
            self.indents.push(column);
            self.tokens.push(Token::new(TokenKind::Indent, span));
        } else if column < current {
            while self.indents.last().is_some_and(|&level| level > column) {
                self.indents.pop();
                self.tokens.push(Token::new(TokenKind::Dedent, span));
            }
            if self.indents.last().copied().unwrap_or(0) != column {
                return Err(LexError::new(LexErrorKind::InconsistentDedent, span));
            }
        }
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<Token>, LexError> {
        if let Some(&(open, span)) = self.brackets.last() {
            return Err(LexError::new(LexErrorKind::UnmatchedBracket(open), span));
        }
        let span = self.here();
        self.push_newline(span);
        while self.indents.len() > 1 {
            self.indents.pop();
            self.tokens.push(Token::new(TokenKind::Dedent, span));
        }
        self.tokens.push(Token::new(TokenKind::Eof, span));
        Ok(self.tokens)
    }

    /// `span` is where the line ended, before the `\n` was consumed.
    fn push_newline(&mut self, span: Span) {
        let needs_newline = self
            .tokens
            .last()
            .is_some_and(|t| !matches!(t.kind, TokenKind::Newline | TokenKind::Indent | TokenKind::Dedent));
        if needs_newline {
            self.tokens.push(Token::new(TokenKind::Newline, span));
        }
    }

    fn skip_comment(&mut self) {
        self.cursor.eat_while(|c| c != '\n');
    }

    fn line_continuation(&mut self) -> Result<(), LexError> {
        let span = self.here();
        self.cursor.bump();
        if self.cursor.current() == Some('\r') {
            self.cursor.bump();
        }
        if self.cursor.current() == Some('\n') {
            self.cursor.bump();
            Ok(())
        } else {
            Err(LexError::new(LexErrorKind::BadContinuation, span))
        }
    }

    fn number(&mut self) -> Result<(), LexError> {
        let start = self.cursor.pos();
        let line = self.cursor.line();

        if self.cursor.current() == Some('0') {
            let radix = match self.cursor.peek() {
                Some('x' | 'X') => Some(16),
                Some('o' | 'O') => Some(8),
                Some('b' | 'B') => Some(2),
                _ => None,
            };
            if let Some(radix) = radix {
                self.cursor.bump();
                self.cursor.bump();
                let digits_start = self.cursor.pos();
                self.cursor.eat_while(|c| c.is_ascii_alphanumeric() || c == '_');
                let digits = self
                    .cursor
                    .slice(digits_start, self.cursor.pos())
                    .replace('_', "");
                let span = self.span_from(start, line);
                let text = self.cursor.slice(start, self.cursor.pos());
                let value = i64::from_str_radix(&digits, radix).map_err(|err| {
                    let kind = if matches!(
                        err.kind(),
                        std::num::IntErrorKind::PosOverflow | std::num::IntErrorKind::NegOverflow
                    ) {
                        LexErrorKind::IntOverflow
                    } else {
                        LexErrorKind::InvalidNumber(text.to_string())
                    };
                    LexError::new(kind, span)
                })?;
                self.tokens.push(Token::new(TokenKind::Int(value), span));
                return Ok(());
            }
        }

        let mut is_float = false;
        self.cursor.eat_while(|c| c.is_ascii_digit() || c == '_');
        if self.cursor.current() == Some('.') {
            is_float = true;
            self.cursor.bump();
            self.cursor.eat_while(|c| c.is_ascii_digit() || c == '_');
        }
        if matches!(self.cursor.current(), Some('e' | 'E')) {
            let exponent_follows = match self.cursor.peek() {
                Some(d) if d.is_ascii_digit() => true,
                Some('+' | '-') => self.cursor.peek_nth(2).is_some_and(|d| d.is_ascii_digit()),
                _ => false,
            };
            if exponent_follows {
                is_float = true;
                self.cursor.bump();
                if matches!(self.cursor.current(), Some('+' | '-')) {
                    self.cursor.bump();
                }
                self.cursor.eat_while(|c| c.is_ascii_digit());
            }
        }

        let span = self.span_from(start, line);
        let text = self.cursor.slice(start, self.cursor.pos());
        if self.cursor.current().is_some_and(is_ident_continue) {
            self.cursor.eat_while(is_ident_continue);
            let text = self.cursor.slice(start, self.cursor.pos());
            return Err(LexError::new(
                LexErrorKind::InvalidNumber(text.to_string()),
                self.span_from(start, line),
            ));
        }

        let cleaned = text.replace('_', "");
        let kind = if is_float {
            let value = cleaned.parse::<f64>().map_err(|_| {
                LexError::new(LexErrorKind::InvalidNumber(text.to_string()), span)
            })?;
            TokenKind::Float(value)
        } else {
            let value = cleaned
                .parse::<i64>()
                .map_err(|_| LexError::new(LexErrorKind::IntOverflow, span))?;
            TokenKind::Int(value)
        };
        self.tokens.push(Token::new(kind, span));
        Ok(())
    }

    fn ident_or_prefixed_string(&mut self) -> Result<(), LexError> {
        if matches!(self.cursor.current(), Some('r' | 'R'))
            && matches!(self.cursor.peek(), Some('\'' | '"'))
        {
            self.cursor.bump();
            return self.string(true);
        }

        let start = self.cursor.pos();
        let line = self.cursor.line();
        self.cursor.eat_while(is_ident_continue);
        let text = self.cursor.slice(start, self.cursor.pos());
        let kind = TokenKind::keyword(text).unwrap_or_else(|| TokenKind::Ident(text.to_string()));
        let span = self.span_from(start, line);
        self.tokens.push(Token::new(kind, span));
        Ok(())
    }

    fn string(&mut self, raw: bool) -> Result<(), LexError> {
        let start = self.cursor.pos();
        let line = self.cursor.line();
        let Some(quote) = self.cursor.current() else {
            return Err(LexError::new(LexErrorKind::UnterminatedString, self.here()));
        };
        let triple: String = std::iter::repeat(quote).take(3).collect();
        let is_triple = self.cursor.eat_str(&triple);
        if !is_triple {
            self.cursor.bump();
        }

        let body_start = self.cursor.pos();
        let body_end = loop {
            let Some(c) = self.cursor.current() else {
                return Err(LexError::new(
                    LexErrorKind::UnterminatedString,
                    self.span_from(start, line),
                ));
            };
            if c == '\\' {
                self.cursor.bump();
                self.cursor.bump();
                continue;
            }
            if is_triple {
                let end = self.cursor.pos();
                if self.cursor.eat_str(&triple) {
                    break end;
                }
            } else if c == quote {
                let end = self.cursor.pos();
                self.cursor.bump();
                break end;
            } else if c == '\n' {
                return Err(LexError::new(
                    LexErrorKind::UnterminatedString,
                    self.span_from(start, line),
                ));
            }
            self.cursor.bump();
        };

        let body = self.cursor.slice(body_start, body_end);
        let text = if raw {
            body.to_string()
        } else {
            cook_escape::cook_string(body)
        };
        let span = self.span_from(start, line);
        self.tokens.push(Token::new(TokenKind::Str(text), span));
        Ok(())
    }

    fn operator(&mut self) -> Result<(), LexError> {
        const OPERATORS: &[(&str, TokenKind)] = &[
            ("**=", TokenKind::DoubleStarEq),
            ("//=", TokenKind::DoubleSlashEq),
            ("**", TokenKind::DoubleStar),
            ("//", TokenKind::DoubleSlash),
            ("==", TokenKind::EqEq),
            ("!=", TokenKind::NotEq),
            ("<=", TokenKind::LtEq),
            (">=", TokenKind::GtEq),
            ("+=", TokenKind::PlusEq),
            ("-=", TokenKind::MinusEq),
            ("*=", TokenKind::StarEq),
            ("/=", TokenKind::SlashEq),
            ("%=", TokenKind::PercentEq),
            ("->", TokenKind::Arrow),
            ("+", TokenKind::Plus),
            ("-", TokenKind::Minus),
            ("*", TokenKind::Star),
            ("/", TokenKind::Slash),
            ("%", TokenKind::Percent),
            ("<", TokenKind::Lt),
            (">", TokenKind::Gt),
            ("=", TokenKind::Eq),
            ("(", TokenKind::LParen),
            (")", TokenKind::RParen),
            ("[", TokenKind::LBracket),
            ("]", TokenKind::RBracket),
            ("{", TokenKind::LBrace),
            ("}", TokenKind::RBrace),
            (",", TokenKind::Comma),
            (":", TokenKind::Colon),
            (".", TokenKind::Dot),
            (";", TokenKind::Semicolon),
        ];

        let start = self.cursor.pos();
        let line = self.cursor.line();
        for (text, kind) in OPERATORS {
            if self.cursor.eat_str(text) {
                let span = self.span_from(start, line);
                self.track_bracket(text, span)?;
                self.tokens.push(Token::new(kind.clone(), span));
                return Ok(());
            }
        }

        let c = self.cursor.current().unwrap_or('\0');
        let span = self.here();
        Err(LexError::new(LexErrorKind::InvalidCharacter(c), span))
    }

    fn track_bracket(&mut self, text: &str, span: Span) -> Result<(), LexError> {
        match text {
            "(" | "[" | "{" => {
                let open = text.chars().next().unwrap_or('(');
                self.brackets.push((open, span));
            }
            ")" | "]" | "}" => {
                let close = text.chars().next().unwrap_or(')');
                let expected = match close {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                match self.brackets.pop() {
                    Some((open, _)) if open == expected => {}
                    _ => return Err(LexError::new(LexErrorKind::UnmatchedBracket(close), span)),
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn here(&self) -> Span {
        let pos = offset(self.cursor.pos());
        Span::new(pos, pos, self.cursor.line())
    }

    fn span_from(&self, start: usize, line: u32) -> Span {
        Span::new(offset(start), offset(self.cursor.pos()), line)
    }
}

/// Source offsets saturate at `u32::MAX`; scripts are far smaller.
fn offset(pos: usize) -> u32 {
    u32::try_from(pos).unwrap_or(u32::MAX)
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}
