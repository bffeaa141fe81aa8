//! Binary, unary and comparison operators.
//!
//! Integer arithmetic is checked: overflow raises `OverflowError` rather
//! than wrapping. `bool` participates in arithmetic as `0`/`1`.

use std::cmp::Ordering;

use pyx_ir::{BinaryOp, CompareOp, UnaryOp};
use pyx_stack::ensure_sufficient_stack;

use crate::errors::{
    bad_operand_for_unary, division_by_zero, ExceptionKind, float_division_by_zero, integer_overflow,
    modulo_by_zero, not_comparable, type_error, unsupported_operands, value_error, EvalResult,
    PyException,
};
use crate::value::Value;

pub fn binary(op: BinaryOp, left: &Value, right: &Value) -> EvalResult {
    if let (Some(a), Some(b)) = (left.as_int(), right.as_int()) {
        return int_binary(op, a, b);
    }
    if let (Some(a), Some(b)) = (left.as_float(), right.as_float()) {
        return float_binary(op, a, b);
    }
    match (op, left, right) {
        (BinaryOp::Add, Value::Str(a), Value::Str(b)) => Ok(Value::str(format!("{a}{b}"))),
        (BinaryOp::Add, Value::List(a), Value::List(b)) => {
            let mut items = a.read().clone();
            items.extend(b.read().iter().cloned());
            Ok(Value::list(items))
        }
        (BinaryOp::Add, Value::Tuple(a), Value::Tuple(b)) => {
            let mut items = a.to_vec();
            items.extend(b.iter().cloned());
            Ok(Value::tuple(items))
        }
        (BinaryOp::Mul, Value::Str(s), n) | (BinaryOp::Mul, n, Value::Str(s)) if n.as_int().is_some() => {
            let count = repeat_count(n)?;
            Ok(Value::str(s.repeat(count)))
        }
        (BinaryOp::Mul, Value::List(items), n) | (BinaryOp::Mul, n, Value::List(items))
            if n.as_int().is_some() =>
        {
            let items = items.read().clone();
            Ok(Value::list(repeat_items(&items, repeat_count(n)?)))
        }
        (BinaryOp::Mul, Value::Tuple(items), n) | (BinaryOp::Mul, n, Value::Tuple(items))
            if n.as_int().is_some() =>
        {
            Ok(Value::tuple(repeat_items(items, repeat_count(n)?)))
        }
        (BinaryOp::Mod, Value::Str(template), args) => percent_format(template, args),
        _ => Err(unsupported_operands(op.as_symbol(), left, right)),
    }
}

fn repeat_count(n: &Value) -> Result<usize, PyException> {
    let n = n.as_int().unwrap_or(0).max(0);
    usize::try_from(n).map_err(|_| integer_overflow("repeat"))
}

fn repeat_items(items: &[Value], count: usize) -> Vec<Value> {
    let mut out = Vec::with_capacity(items.len().saturating_mul(count));
    for _ in 0..count {
        out.extend(items.iter().cloned());
    }
    out
}

fn int_binary(op: BinaryOp, a: i64, b: i64) -> EvalResult {
    let overflow = || integer_overflow(op.as_symbol());
    let n = match op {
        BinaryOp::Add => a.checked_add(b).ok_or_else(overflow)?,
        BinaryOp::Sub => a.checked_sub(b).ok_or_else(overflow)?,
        BinaryOp::Mul => a.checked_mul(b).ok_or_else(overflow)?,
        BinaryOp::Div => {
            if b == 0 {
                return Err(division_by_zero());
            }
            return Ok(Value::Float(a as f64 / b as f64));
        }
        BinaryOp::FloorDiv => {
            if b == 0 {
                return Err(modulo_by_zero());
            }
            let q = a.checked_div(b).ok_or_else(overflow)?;
            if a % b != 0 && ((a < 0) != (b < 0)) {
                q - 1
            } else {
                q
            }
        }
        BinaryOp::Mod => {
            if b == 0 {
                return Err(modulo_by_zero());
            }
            let r = a.checked_rem(b).ok_or_else(overflow)?;
            if r != 0 && ((r < 0) != (b < 0)) {
                r + b
            } else {
                r
            }
        }
        BinaryOp::Pow => {
            if b < 0 {
                return float_binary(op, a as f64, b as f64);
            }
            let exp = u32::try_from(b).map_err(|_| overflow())?;
            a.checked_pow(exp).ok_or_else(overflow)?
        }
    };
    Ok(Value::Int(n))
}

fn float_binary(op: BinaryOp, a: f64, b: f64) -> EvalResult {
    let x = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => {
            if b == 0.0 {
                return Err(float_division_by_zero());
            }
            a / b
        }
        BinaryOp::FloorDiv => {
            if b == 0.0 {
                return Err(float_division_by_zero());
            }
            (a / b).floor()
        }
        BinaryOp::Mod => {
            if b == 0.0 {
                return Err(PyException::new(
                    ExceptionKind::ZeroDivisionError,
                    "float modulo",
                ));
            }
            let r = a % b;
            if r != 0.0 && ((r < 0.0) != (b < 0.0)) {
                r + b
            } else {
                r
            }
        }
        BinaryOp::Pow => {
            if a == 0.0 && b < 0.0 {
                return Err(PyException::new(
                    ExceptionKind::ZeroDivisionError,
                    "0.0 cannot be raised to a negative power",
                ));
            }
            if a < 0.0 && b.fract() != 0.0 {
                return Err(value_error("math domain error"));
            }
            a.powf(b)
        }
    };
    Ok(Value::Float(x))
}

pub fn unary(op: UnaryOp, operand: &Value) -> EvalResult {
    match op {
        UnaryOp::Not => Ok(Value::Bool(!operand.is_truthy())),
        UnaryOp::Neg => match operand {
            Value::Float(x) => Ok(Value::Float(-x)),
            other => match other.as_int() {
                Some(n) => n
                    .checked_neg()
                    .map(Value::Int)
                    .ok_or_else(|| integer_overflow("-")),
                None => Err(bad_operand_for_unary("-", operand)),
            },
        },
        UnaryOp::Pos => match operand {
            Value::Float(x) => Ok(Value::Float(*x)),
            other => other
                .as_int()
                .map(Value::Int)
                .ok_or_else(|| bad_operand_for_unary("+", operand)),
        },
    }
}

pub fn compare(op: CompareOp, left: &Value, right: &Value) -> Result<bool, PyException> {
    let symbol = match op {
        CompareOp::Eq => return Ok(left.equals(right)),
        CompareOp::NotEq => return Ok(!left.equals(right)),
        CompareOp::Is => return Ok(left.is_identical(right)),
        CompareOp::IsNot => return Ok(!left.is_identical(right)),
        CompareOp::In => return contains(right, left),
        CompareOp::NotIn => return contains(right, left).map(|found| !found),
        CompareOp::Lt => "<",
        CompareOp::LtEq => "<=",
        CompareOp::Gt => ">",
        CompareOp::GtEq => ">=",
    };
    let ordering = order(left, right).ok_or_else(|| not_comparable(symbol, left, right))?;
    Ok(match op {
        CompareOp::Lt => ordering == Some(Ordering::Less),
        CompareOp::LtEq => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
        CompareOp::Gt => ordering == Some(Ordering::Greater),
        _ => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
    })
}

/// Ordering between two values.
///
/// Outer `None`: the types are not orderable. Inner `None`: orderable but
/// unordered (NaN).
fn order(left: &Value, right: &Value) -> Option<Option<Ordering>> {
    if let (Some(a), Some(b)) = (left.as_int(), right.as_int()) {
        return Some(Some(a.cmp(&b)));
    }
    if let (Some(a), Some(b)) = (left.as_float(), right.as_float()) {
        return Some(a.partial_cmp(&b));
    }
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => Some(Some((**a).cmp(&**b))),
        (Value::List(a), Value::List(b)) => {
            let (a, b) = (a.read().clone(), b.read().clone());
            order_seq(&a, &b)
        }
        (Value::Tuple(a), Value::Tuple(b)) => order_seq(a, b),
        _ => None,
    }
}

fn order_seq(a: &[Value], b: &[Value]) -> Option<Option<Ordering>> {
    ensure_sufficient_stack(|| {
        for (x, y) in a.iter().zip(b) {
            if !x.equals(y) {
                return order(x, y);
            }
        }
        Some(Some(a.len().cmp(&b.len())))
    })
}

/// Total ordering used by `sorted`, `min` and `max`.
pub fn compare_values(left: &Value, right: &Value) -> Result<Ordering, PyException> {
    match order(left, right) {
        Some(ordering) => Ok(ordering.unwrap_or(Ordering::Equal)),
        None => Err(not_comparable("<", left, right)),
    }
}

/// `needle in container`
pub fn contains(container: &Value, needle: &Value) -> Result<bool, PyException> {
    match container {
        Value::Str(haystack) => match needle {
            Value::Str(n) => Ok(haystack.contains(&**n)),
            _ => Err(type_error(format!(
                "'in <string>' requires string as left operand, not {}",
                needle.type_name()
            ))),
        },
        Value::List(items) => Ok(items.read().clone().iter().any(|v| v.equals(needle))),
        Value::Tuple(items) => Ok(items.iter().any(|v| v.equals(needle))),
        Value::Dict(dict) => dict.read().contains(needle),
        Value::Set(set) => set.read().contains(needle),
        Value::Range(range) => Ok(needle.as_int().is_some_and(|n| range.contains(n))),
        _ => Err(type_error(format!(
            "argument of type '{}' is not iterable",
            container.type_name()
        ))),
    }
}

/// printf-style `str % args` with `%s %r %d %i %f %%` and an optional
/// precision (`%.2f`).
fn percent_format(template: &str, args: &Value) -> EvalResult {
    let args: Vec<Value> = match args {
        Value::Tuple(items) => items.to_vec(),
        other => vec![other.clone()],
    };
    let mut args = args.into_iter();
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        let mut precision = None;
        if chars.peek() == Some(&'.') {
            chars.next();
            let mut digits = String::new();
            while let Some(d) = chars.peek().filter(|d| d.is_ascii_digit()) {
                digits.push(*d);
                chars.next();
            }
            precision = digits.parse::<usize>().ok();
        }
        let Some(spec) = chars.next() else {
            return Err(value_error("incomplete format"));
        };
        if spec == '%' {
            out.push('%');
            continue;
        }
        let arg = args
            .next()
            .ok_or_else(|| type_error("not enough arguments for format string"))?;
        match spec {
            's' => out.push_str(&arg.to_str()),
            'r' => out.push_str(&arg.repr()),
            'd' | 'i' => match (&arg, arg.as_int()) {
                (_, Some(n)) => out.push_str(&n.to_string()),
                (Value::Float(x), _) => out.push_str(&format!("{}", x.trunc())),
                _ => {
                    return Err(type_error(format!(
                        "%{spec} format: a real number is required, not {}",
                        arg.type_name()
                    )))
                }
            },
            'f' => {
                let x = arg.as_float().ok_or_else(|| {
                    type_error(format!("must be real number, not {}", arg.type_name()))
                })?;
                out.push_str(&format!("{x:.*}", precision.unwrap_or(6)));
            }
            other => {
                return Err(value_error(format!(
                    "unsupported format character '{other}'"
                )))
            }
        }
    }
    if args.next().is_some() {
        return Err(type_error(
            "not all arguments converted during string formatting",
        ));
    }
    Ok(Value::str(out))
}

#[cfg(test)]
mod tests;
