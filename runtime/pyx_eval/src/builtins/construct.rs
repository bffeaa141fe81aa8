//! Calling built-in type objects.

use super::basic::float_to_int;
use crate::errors::{type_error, value_error, wrong_arg_type, EvalResult};
use crate::interpreter::{Args, Interpreter};
use crate::methods::pairs_of;
use crate::value::{DictValue, RangeValue, SetValue, TypeKind, Value};

/// `kind(*args)`.
pub fn construct(interp: &mut Interpreter<'_>, kind: TypeKind, mut args: Args) -> EvalResult {
    let name = kind.name();
    match kind {
        TypeKind::Bool => {
            args.expect(name, 0, 1)?;
            Ok(Value::Bool(args.get(0).is_some_and(Value::is_truthy)))
        }
        TypeKind::Int => {
            let base = args.take_keyword("base");
            args.expect(name, 0, 2)?;
            let base = base.or_else(|| args.get(1).cloned());
            match args.get(0) {
                None => Ok(Value::Int(0)),
                Some(value) => to_int(value, base.as_ref()),
            }
        }
        TypeKind::Float => {
            args.expect(name, 0, 1)?;
            match args.get(0) {
                None => Ok(Value::Float(0.0)),
                Some(value) => to_float(value),
            }
        }
        TypeKind::Str => {
            args.expect(name, 0, 1)?;
            Ok(Value::str(args.get(0).map(Value::to_str).unwrap_or_default()))
        }
        TypeKind::List => {
            args.expect(name, 0, 1)?;
            let items = match args.get(0) {
                Some(iterable) => interp.collect(iterable)?,
                None => Vec::new(),
            };
            Ok(Value::list(items))
        }
        TypeKind::Tuple => {
            args.expect(name, 0, 1)?;
            match args.get(0) {
                Some(Value::Tuple(items)) => Ok(Value::Tuple(items.clone())),
                Some(iterable) => Ok(Value::tuple(interp.collect(iterable)?)),
                None => Ok(Value::tuple(Vec::new())),
            }
        }
        TypeKind::Dict => {
            let keywords = std::mem::take(&mut args.keywords);
            args.expect(name, 0, 1)?;
            let mut dict = DictValue::new();
            if let Some(source) = args.get(0) {
                for (k, v) in pairs_of(interp, source)? {
                    dict.insert(k, v)?;
                }
            }
            for (k, v) in keywords {
                dict.set_str(&k, v);
            }
            Ok(Value::dict(dict))
        }
        TypeKind::Set => {
            args.expect(name, 0, 1)?;
            let mut set = SetValue::new();
            if let Some(iterable) = args.get(0) {
                for item in interp.collect(iterable)? {
                    set.insert(item)?;
                }
            }
            Ok(Value::set(set))
        }
        TypeKind::Range => range(&args),
        TypeKind::Type => {
            args.expect(name, 1, 1)?;
            Ok(match &args.positional[0] {
                Value::Exception(exc) => Value::ExceptionType(exc.kind),
                other => Value::Type(other.type_kind()),
            })
        }
        _ => Err(type_error(format!("cannot create '{name}' instances"))),
    }
}

fn range(args: &Args) -> EvalResult {
    args.expect("range", 1, 3)?;
    let mut bounds = [0i64; 3];
    for (slot, value) in bounds.iter_mut().zip(&args.positional) {
        *slot = value.as_int().ok_or_else(|| {
            type_error(format!(
                "'{}' object cannot be interpreted as an integer",
                value.type_name()
            ))
        })?;
    }
    let (start, stop, step) = match args.len() {
        1 => (0, bounds[0], 1),
        2 => (bounds[0], bounds[1], 1),
        _ => (bounds[0], bounds[1], bounds[2]),
    };
    if step == 0 {
        return Err(value_error("range() arg 3 must not be zero"));
    }
    Ok(Value::Range(RangeValue { start, stop, step }))
}

fn to_int(value: &Value, base: Option<&Value>) -> EvalResult {
    let base = match base {
        None => None,
        Some(b) => Some(b.as_int().ok_or_else(|| wrong_arg_type("int", "int", b))?),
    };
    match (value, base) {
        (Value::Str(s), base) => parse_int(s, base.unwrap_or(10)),
        (_, Some(_)) => Err(type_error("int() can't convert non-string with explicit base")),
        (Value::Float(x), None) => float_to_int(*x),
        (other, None) => other.as_int().map(Value::Int).ok_or_else(|| {
            type_error(format!(
                "int() argument must be a string or a number, not '{}'",
                other.type_name()
            ))
        }),
    }
}

fn parse_int(text: &str, base: i64) -> EvalResult {
    let invalid = || value_error(format!("invalid literal for int() with base {base}: {}", crate::format::repr_str(text)));
    let radix = u32::try_from(base)
        .ok()
        .filter(|b| (2..=36).contains(b))
        .ok_or_else(|| value_error("int() base must be >= 2 and <= 36"))?;
    let trimmed = text.trim();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let digits = match radix {
        16 => strip_radix_prefix(digits, "0x"),
        8 => strip_radix_prefix(digits, "0o"),
        2 => strip_radix_prefix(digits, "0b"),
        _ => digits,
    };
    if digits.is_empty() || digits.starts_with('_') || digits.ends_with('_') || digits.contains("__") {
        return Err(invalid());
    }
    let cleaned: String = digits.chars().filter(|c| *c != '_').collect();
    let magnitude = i64::from_str_radix(&cleaned, radix).map_err(|_| invalid())?;
    Ok(Value::Int(if negative { -magnitude } else { magnitude }))
}

fn strip_radix_prefix<'a>(digits: &'a str, prefix: &str) -> &'a str {
    let lower = digits.get(..2).map(str::to_ascii_lowercase);
    match lower {
        Some(p) if p == prefix => &digits[2..],
        _ => digits,
    }
}

fn to_float(value: &Value) -> EvalResult {
    if let Value::Str(s) = value {
        let trimmed = s.trim();
        let parsed = match trimmed.to_ascii_lowercase().as_str() {
            "inf" | "+inf" | "infinity" | "+infinity" => Some(f64::INFINITY),
            "-inf" | "-infinity" => Some(f64::NEG_INFINITY),
            "nan" | "+nan" | "-nan" => Some(f64::NAN),
            _ => trimmed.replace('_', "").parse::<f64>().ok(),
        };
        return parsed.map(Value::Float).ok_or_else(|| {
            value_error(format!(
                "could not convert string to float: {}",
                crate::format::repr_str(s)
            ))
        });
    }
    value.as_float().map(Value::Float).ok_or_else(|| {
        type_error(format!(
            "float() argument must be a string or a real number, not '{}'",
            value.type_name()
        ))
    })
}
