//! Method dispatch for built-in types.
//!
//! The type set is fixed, so dispatch is a `match` on the receiver rather
//! than a table of trait objects. Attribute lookup of a method name yields
//! a [`BoundMethod`](crate::value::BoundMethod); calling it lands here.
//!
//! - [`strings`]: `str` methods
//! - [`collections`]: `list`, `dict` and `set` methods
//! - [`helpers`]: argument extraction shared by both

mod collections;
mod helpers;
mod strings;

pub(crate) use collections::{pairs_of, sort_values};

use crate::errors::{no_attribute, EvalResult};
use crate::interpreter::{Args, Interpreter};
use crate::value::Value;

/// Method names per receiver type, used for attribute lookup.
pub const STR_METHODS: &[&str] = &[
    "count",
    "endswith",
    "find",
    "format",
    "isalpha",
    "isdigit",
    "join",
    "lower",
    "lstrip",
    "replace",
    "rstrip",
    "split",
    "startswith",
    "strip",
    "upper",
];

pub const LIST_METHODS: &[&str] = &[
    "append", "clear", "copy", "count", "extend", "index", "insert", "pop", "remove", "reverse",
    "sort",
];

pub const DICT_METHODS: &[&str] = &[
    "clear",
    "copy",
    "get",
    "items",
    "keys",
    "pop",
    "setdefault",
    "update",
    "values",
];

pub const SET_METHODS: &[&str] = &[
    "add",
    "clear",
    "difference",
    "discard",
    "intersection",
    "remove",
    "union",
];

/// Whether `receiver.name` is a built-in method.
pub fn has_method(receiver: &Value, name: &str) -> bool {
    let table = match receiver {
        Value::Str(_) => STR_METHODS,
        Value::List(_) => LIST_METHODS,
        Value::Dict(_) => DICT_METHODS,
        Value::Set(_) => SET_METHODS,
        _ => return false,
    };
    table.contains(&name)
}

/// Call built-in method `name` on `receiver`.
pub fn call_method(
    interp: &mut Interpreter<'_>,
    receiver: &Value,
    name: &str,
    args: Args,
) -> EvalResult {
    match receiver {
        Value::Str(s) => strings::dispatch(interp, s, name, args),
        Value::List(_) => collections::dispatch_list(interp, receiver, name, args),
        Value::Dict(_) => collections::dispatch_dict(interp, receiver, name, args),
        Value::Set(_) => collections::dispatch_set(interp, receiver, name, args),
        _ => Err(no_attribute(receiver, name)),
    }
}
