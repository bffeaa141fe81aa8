//! Syntax tree of the scripting language.
//!
//! The tree is evaluated directly by `pyx_eval`. Function bodies are held
//! behind `Arc` so function values can outlive the [`Code`] object that
//! defined them.

use std::sync::Arc;

use crate::CompileMode;

/// Binary arithmetic operators.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

impl BinaryOp {
    pub fn as_symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::FloorDiv => "//",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "**",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Pos,
    Not,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BoolOp {
    And,
    Or,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    In,
    NotIn,
    Is,
    IsNot,
}

/// An expression node.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    None,
    Name(String),
    List(Vec<Expr>),
    Tuple(Vec<Expr>),
    Set(Vec<Expr>),
    Dict(Vec<(Expr, Expr)>),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `a and b and c`: evaluated left to right with short-circuit.
    BoolOp {
        op: BoolOp,
        values: Vec<Expr>,
    },
    /// `a < b <= c`: chained comparison, each operand evaluated once.
    Compare {
        left: Box<Expr>,
        ops: Vec<(CompareOp, Expr)>,
    },
    Call {
        func: Box<Expr>,
        args: Vec<Argument>,
    },
    Attribute {
        value: Box<Expr>,
        attr: String,
    },
    Subscript {
        value: Box<Expr>,
        index: Box<Expr>,
    },
    /// Only valid as a subscript index.
    Slice {
        lower: Option<Box<Expr>>,
        upper: Option<Box<Expr>>,
        step: Option<Box<Expr>>,
    },
    IfExp {
        test: Box<Expr>,
        body: Box<Expr>,
        orelse: Box<Expr>,
    },
    Lambda(Arc<FunctionDef>),
    /// List comprehension; generator expressions are parsed into this too.
    ListComp {
        element: Box<Expr>,
        generators: Vec<Comprehension>,
    },
}

/// One `for target in iter if cond...` clause of a comprehension.
#[derive(Clone, Debug, PartialEq)]
pub struct Comprehension {
    pub target: Target,
    pub iter: Expr,
    pub conditions: Vec<Expr>,
}

/// A call argument.
#[derive(Clone, Debug, PartialEq)]
pub enum Argument {
    Positional(Expr),
    /// `*iterable`, spliced positionally.
    Starred(Expr),
    Keyword(String, Expr),
}

/// Assignment target.
#[derive(Clone, Debug, PartialEq)]
pub enum Target {
    Name(String),
    /// `a, b = ...` and `[a, b] = ...`.
    Unpack(Vec<Target>),
    Subscript { value: Expr, index: Expr },
    Attribute { value: Expr, attr: String },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub name: String,
    pub default: Option<Expr>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Parameters {
    pub positional: Vec<Param>,
    /// Name bound to surplus positional arguments (`*args`).
    pub varargs: Option<String>,
}

impl Parameters {
    /// Number of parameters without a default value.
    pub fn required(&self) -> usize {
        self.positional
            .iter()
            .filter(|p| p.default.is_none())
            .count()
    }
}

/// A `def` or `lambda`.
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub params: Parameters,
    pub body: Vec<Stmt>,
    /// Names declared `global` anywhere in the body (nested defs excluded).
    pub globals: Vec<String>,
}

impl FunctionDef {
    /// Build a definition, collecting its `global` declarations.
    pub fn new(name: String, params: Parameters, body: Vec<Stmt>) -> Self {
        let mut globals = Vec::new();
        collect_globals(&body, &mut globals);
        FunctionDef {
            name,
            params,
            body,
            globals,
        }
    }
}

fn collect_globals(body: &[Stmt], out: &mut Vec<String>) {
    for stmt in body {
        match stmt {
            Stmt::Global(names) => {
                for name in names {
                    if !out.contains(name) {
                        out.push(name.clone());
                    }
                }
            }
            Stmt::If { body, orelse, .. }
            | Stmt::While { body, orelse, .. }
            | Stmt::For { body, orelse, .. } => {
                collect_globals(body, out);
                collect_globals(orelse, out);
            }
            Stmt::Try {
                body,
                handlers,
                orelse,
                finalbody,
            } => {
                collect_globals(body, out);
                for handler in handlers {
                    collect_globals(&handler.body, out);
                }
                collect_globals(orelse, out);
                collect_globals(finalbody, out);
            }
            _ => {}
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ImportName {
    pub module: String,
    pub alias: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExceptHandler {
    /// Exception type expression; `None` catches everything.
    pub kind: Option<Expr>,
    pub name: Option<String>,
    pub body: Vec<Stmt>,
}

/// A statement node.
#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    Expr(Expr),
    /// `a = b = value`.
    Assign {
        targets: Vec<Target>,
        value: Expr,
    },
    AugAssign {
        target: Target,
        op: BinaryOp,
        value: Expr,
    },
    /// `elif` chains nest as a single `If` inside `orelse`.
    If {
        test: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
    },
    While {
        test: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
    },
    For {
        target: Target,
        iter: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
    },
    Break,
    Continue,
    Pass,
    Return(Option<Expr>),
    FunctionDef(Arc<FunctionDef>),
    Import(Vec<ImportName>),
    ImportFrom {
        module: String,
        names: Vec<(String, Option<String>)>,
    },
    Global(Vec<String>),
    Delete(Vec<Target>),
    Raise(Option<Expr>),
    Try {
        body: Vec<Stmt>,
        handlers: Vec<ExceptHandler>,
        orelse: Vec<Stmt>,
        finalbody: Vec<Stmt>,
    },
    Assert {
        test: Expr,
        msg: Option<Expr>,
    },
}

/// What a compiled [`Code`] object runs.
#[derive(Clone, Debug, PartialEq)]
pub enum CodeBody {
    Expression(Expr),
    Statements(Vec<Stmt>),
}

/// Result of compiling source text.
#[derive(Clone, Debug, PartialEq)]
pub struct Code {
    pub mode: CompileMode,
    /// Name reported in diagnostics (file path or namespace name).
    pub filename: String,
    pub body: CodeBody,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_def_collects_nested_globals() {
        let body = vec![
            Stmt::Global(vec!["counter".into()]),
            Stmt::If {
                test: Expr::Bool(true),
                body: vec![Stmt::Global(vec!["total".into(), "counter".into()])],
                orelse: vec![],
            },
        ];
        let def = FunctionDef::new("f".into(), Parameters::default(), body);
        assert_eq!(def.globals, vec!["counter".to_string(), "total".to_string()]);
    }

    #[test]
    fn required_params_skip_defaults() {
        let params = Parameters {
            positional: vec![
                Param {
                    name: "a".into(),
                    default: None,
                },
                Param {
                    name: "b".into(),
                    default: Some(Expr::Int(1)),
                },
            ],
            varargs: None,
        };
        assert_eq!(params.required(), 1);
    }
}
