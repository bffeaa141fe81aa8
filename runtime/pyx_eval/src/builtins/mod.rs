//! The `builtins` namespace: functions, type objects and exception classes.
//!
//! - `basic`: `print`, `len`, `repr` and the numeric helpers
//! - `iteration`: functions consuming iterables (`sorted`, `zip`, `sum`, ...)
//! - `reflection`: `eval`, `exec`, `globals`, `getattr` and friends
//! - `construct`: calling a type object (`int("3")`, `list(...)`)
//!
//! Functions that produce iterators in other dialects (`map`, `zip`,
//! `enumerate`, `reversed`) return lists here.

mod construct;
mod basic;
mod iteration;
mod reflection;

use std::sync::Arc;

pub(crate) use basic::float_to_int;
pub use construct::construct;

use crate::errors::{EvalResult, ExceptionKind};
use crate::interpreter::{Args, Interpreter};
use crate::value::{DictValue, NativeFn, TypeKind, Value};

type BuiltinFn = fn(&mut Interpreter<'_>, Args) -> EvalResult;

const FUNCTIONS: &[(&str, BuiltinFn)] = &[
    ("abs", basic::abs),
    ("all", iteration::all),
    ("any", iteration::any),
    ("callable", reflection::callable),
    ("chr", basic::chr),
    ("divmod", basic::divmod),
    ("enumerate", iteration::enumerate),
    ("eval", reflection::eval),
    ("exec", reflection::exec),
    ("filter", iteration::filter),
    ("getattr", reflection::getattr),
    ("globals", reflection::globals),
    ("hasattr", reflection::hasattr),
    ("isinstance", reflection::isinstance),
    ("len", basic::len),
    ("locals", reflection::locals),
    ("map", iteration::map),
    ("max", iteration::max),
    ("min", iteration::min),
    ("ord", basic::ord),
    ("pow", basic::pow),
    ("print", basic::print),
    ("repr", basic::repr),
    ("reversed", iteration::reversed),
    ("round", basic::round),
    ("setattr", reflection::setattr),
    ("sorted", iteration::sorted),
    ("sum", iteration::sum),
    ("zip", iteration::zip),
];

const TYPES: &[TypeKind] = &[
    TypeKind::Bool,
    TypeKind::Int,
    TypeKind::Float,
    TypeKind::Str,
    TypeKind::List,
    TypeKind::Tuple,
    TypeKind::Dict,
    TypeKind::Set,
    TypeKind::Range,
    TypeKind::Type,
];

/// Wrap a plain function as a builtin value.
pub fn native(name: &str, func: BuiltinFn) -> Value {
    let func: NativeFn = Arc::new(func);
    Value::builtin(name, func)
}

/// Build the `builtins` namespace.
pub fn install(dict: &mut DictValue) {
    dict.set_str("__name__", Value::str("builtins"));
    for (name, func) in FUNCTIONS {
        dict.set_str(name, native(name, *func));
    }
    for kind in TYPES {
        dict.set_str(kind.name(), Value::Type(*kind));
    }
    for kind in ExceptionKind::ALL {
        dict.set_str(kind.name(), Value::ExceptionType(kind));
    }
}
