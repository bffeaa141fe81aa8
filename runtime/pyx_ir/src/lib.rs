//! Pyx IR - shared syntax types for the embedded scripting engine.
//!
//! The lexer produces [`Token`]s, the parser produces a [`Code`] object
//! (an expression or a statement block, depending on the [`CompileMode`]),
//! and the evaluator walks that tree directly.

mod ast;
mod span;
mod token;

pub use ast::{
    Argument, BinaryOp, BoolOp, Code, CodeBody, CompareOp, Comprehension, ExceptHandler, Expr,
    FunctionDef, ImportName, Param, Parameters, Stmt, Target, UnaryOp,
};
pub use span::Span;
pub use token::{Token, TokenKind};

/// How source text is compiled.
///
/// Mirrors the three start symbols of the engine's grammar: a lone
/// expression, a file of statements, and an interactive statement block.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CompileMode {
    /// A single expression; evaluating it yields a value.
    Eval,
    /// A statement block read from a file or a module.
    Exec,
    /// An interactive statement block: expression statements echo their
    /// `repr` to the print sink when the value is not `None`.
    Single,
}

impl CompileMode {
    /// Short name used in diagnostics.
    pub fn as_str(self) -> &'static str {
        match self {
            CompileMode::Eval => "eval",
            CompileMode::Exec => "exec",
            CompileMode::Single => "single",
        }
    }
}
