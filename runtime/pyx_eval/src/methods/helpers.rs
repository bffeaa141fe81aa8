//! Argument extraction for method dispatch.

use crate::errors::{wrong_arg_type, PyException};
use crate::interpreter::Args;
use crate::value::Value;

/// Positional argument `index` as a string.
pub(super) fn str_arg<'a>(method: &str, args: &'a Args, index: usize) -> Result<&'a str, PyException> {
    match args.get(index) {
        Some(Value::Str(s)) => Ok(s),
        Some(other) => Err(wrong_arg_type(method, "str", other)),
        None => Err(wrong_arg_type(method, "str", &Value::None)),
    }
}

/// Optional positional argument `index` as a string; `None` counts as absent.
pub(super) fn opt_str_arg<'a>(
    method: &str,
    args: &'a Args,
    index: usize,
) -> Result<Option<&'a str>, PyException> {
    match args.get(index) {
        None | Some(Value::None) => Ok(None),
        Some(_) => str_arg(method, args, index).map(Some),
    }
}

/// Optional positional argument `index` as an integer.
pub(super) fn opt_int_arg(method: &str, args: &Args, index: usize) -> Result<Option<i64>, PyException> {
    match args.get(index) {
        None => Ok(None),
        Some(value) => value
            .as_int()
            .map(Some)
            .ok_or_else(|| wrong_arg_type(method, "int", value)),
    }
}

/// Positional argument `index`, cloned.
pub(super) fn arg(args: &Args, index: usize) -> Value {
    args.get(index).cloned().unwrap_or(Value::None)
}
