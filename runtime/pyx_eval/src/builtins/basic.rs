//! Output, sizes and numeric helpers.

use pyx_ir::BinaryOp;

use crate::errors::{type_error, value_error, wrong_arg_type, EvalResult, PyException};
use crate::interpreter::{Args, Interpreter};
use crate::operators;
use crate::value::Value;

pub(super) fn print(interp: &mut Interpreter<'_>, mut args: Args) -> EvalResult {
    let sep = text_keyword(&mut args, "sep", " ")?;
    let end = text_keyword(&mut args, "end", "\n")?;
    args.expect("print", 0, usize::MAX)?;
    let mut line = args
        .positional
        .iter()
        .map(Value::to_str)
        .collect::<Vec<_>>()
        .join(&sep);
    line.push_str(&end);
    interp.engine().print_handler().print(&line);
    Ok(Value::None)
}

fn text_keyword(args: &mut Args, name: &str, default: &str) -> Result<String, PyException> {
    match args.take_keyword(name) {
        None | Some(Value::None) => Ok(default.to_string()),
        Some(Value::Str(s)) => Ok(s.to_string()),
        Some(other) => Err(type_error(format!(
            "{name} must be None or a string, not {}",
            other.type_name()
        ))),
    }
}

pub(super) fn len(_: &mut Interpreter<'_>, args: Args) -> EvalResult {
    args.expect("len", 1, 1)?;
    let value = &args.positional[0];
    let n = match value {
        Value::Str(s) => s.chars().count(),
        Value::List(items) => items.read().len(),
        Value::Tuple(items) => items.len(),
        Value::Dict(dict) => dict.read().len(),
        Value::Set(set) => set.read().len(),
        Value::Range(range) => range.len(),
        _ => {
            return Err(type_error(format!(
                "object of type '{}' has no len()",
                value.type_name()
            )))
        }
    };
    Ok(Value::Int(i64::try_from(n).unwrap_or(i64::MAX)))
}

pub(super) fn repr(_: &mut Interpreter<'_>, args: Args) -> EvalResult {
    args.expect("repr", 1, 1)?;
    Ok(Value::str(args.positional[0].repr()))
}

pub(super) fn abs(_: &mut Interpreter<'_>, args: Args) -> EvalResult {
    args.expect("abs", 1, 1)?;
    match &args.positional[0] {
        Value::Float(x) => Ok(Value::Float(x.abs())),
        other => match other.as_int() {
            Some(n) => n
                .checked_abs()
                .map(Value::Int)
                .ok_or_else(|| crate::errors::integer_overflow("abs")),
            None => Err(type_error(format!(
                "bad operand type for abs(): '{}'",
                other.type_name()
            ))),
        },
    }
}

pub(super) fn round(_: &mut Interpreter<'_>, args: Args) -> EvalResult {
    args.expect("round", 1, 2)?;
    let value = &args.positional[0];
    let digits = match args.get(1) {
        None | Some(Value::None) => None,
        Some(d) => Some(d.as_int().ok_or_else(|| wrong_arg_type("round", "int", d))?),
    };
    if let Some(n) = value.as_int() {
        return Ok(Value::Int(n));
    }
    let Value::Float(x) = value else {
        return Err(type_error(format!(
            "type {} doesn't define __round__ method",
            value.type_name()
        )));
    };
    match digits {
        None => float_to_int(x.round_ties_even()),
        Some(d) => {
            let scale = 10f64.powi(i32::try_from(d).unwrap_or(i32::MAX));
            Ok(Value::Float((x * scale).round_ties_even() / scale))
        }
    }
}

/// Convert a float with no fractional part to `int`.
#[allow(clippy::cast_possible_truncation, reason = "range checked above")]
pub(crate) fn float_to_int(x: f64) -> EvalResult {
    if x.is_nan() {
        return Err(value_error("cannot convert float NaN to integer"));
    }
    let message = if x.is_infinite() {
        "cannot convert float infinity to integer"
    } else if x >= 9.223_372_036_854_775_807e18 || x < -9.223_372_036_854_775_808e18 {
        "int too large to convert"
    } else {
        return Ok(Value::Int(x.trunc() as i64));
    };
    Err(PyException::new(
        crate::errors::ExceptionKind::OverflowError,
        message,
    ))
}

pub(super) fn pow(_: &mut Interpreter<'_>, args: Args) -> EvalResult {
    args.expect("pow", 2, 2)?;
    operators::binary(BinaryOp::Pow, &args.positional[0], &args.positional[1])
}

pub(super) fn divmod(_: &mut Interpreter<'_>, args: Args) -> EvalResult {
    args.expect("divmod", 2, 2)?;
    let (a, b) = (&args.positional[0], &args.positional[1]);
    let quotient = operators::binary(BinaryOp::FloorDiv, a, b)?;
    let remainder = operators::binary(BinaryOp::Mod, a, b)?;
    Ok(Value::tuple(vec![quotient, remainder]))
}

pub(super) fn ord(_: &mut Interpreter<'_>, args: Args) -> EvalResult {
    args.expect("ord", 1, 1)?;
    let value = &args.positional[0];
    let s = value
        .as_str()
        .ok_or_else(|| wrong_arg_type("ord", "str", value))?;
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(Value::Int(i64::from(u32::from(c)))),
        _ => Err(type_error(format!(
            "ord() expected a character, but string of length {} found",
            s.chars().count()
        ))),
    }
}

pub(super) fn chr(_: &mut Interpreter<'_>, args: Args) -> EvalResult {
    args.expect("chr", 1, 1)?;
    let value = &args.positional[0];
    let n = value
        .as_int()
        .ok_or_else(|| wrong_arg_type("chr", "int", value))?;
    u32::try_from(n)
        .ok()
        .and_then(char::from_u32)
        .map(|c| Value::str(c.to_string()))
        .ok_or_else(|| value_error("chr() arg not in range(0x110000)"))
}
