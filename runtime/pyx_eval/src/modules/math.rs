//! The `math` module.

use std::f64::consts;

use crate::builtins::{float_to_int, native};
use crate::errors::{type_error, value_error, EvalResult, PyException};
use crate::interpreter::{Args, Interpreter};
use crate::value::{new_dict, DictValue, SharedDict, Value};

pub(crate) fn module() -> SharedDict {
    let mut dict = DictValue::new();
    dict.set_str("__name__", Value::str("math"));
    dict.set_str("pi", Value::Float(consts::PI));
    dict.set_str("e", Value::Float(consts::E));
    dict.set_str("tau", Value::Float(consts::TAU));
    dict.set_str("inf", Value::Float(f64::INFINITY));
    dict.set_str("nan", Value::Float(f64::NAN));

    let functions: &[(&str, fn(&mut Interpreter<'_>, Args) -> EvalResult)] = &[
        ("sqrt", sqrt),
        ("floor", floor),
        ("ceil", ceil),
        ("trunc", trunc),
        ("fabs", |_, a| unary("fabs", &a, f64::abs)),
        ("sin", |_, a| unary("sin", &a, f64::sin)),
        ("cos", |_, a| unary("cos", &a, f64::cos)),
        ("tan", |_, a| unary("tan", &a, f64::tan)),
        ("atan", |_, a| unary("atan", &a, f64::atan)),
        ("exp", |_, a| unary("exp", &a, f64::exp)),
        ("atan2", |_, a| binary("atan2", &a, f64::atan2)),
        ("hypot", |_, a| binary("hypot", &a, f64::hypot)),
        ("pow", |_, a| binary("pow", &a, f64::powf)),
        ("log", log),
        ("log10", log10),
        ("isnan", |_, a| predicate("isnan", &a, f64::is_nan)),
        ("isinf", |_, a| predicate("isinf", &a, f64::is_infinite)),
    ];
    for (name, func) in functions {
        dict.set_str(name, native(name, *func));
    }
    new_dict(dict)
}

fn float_arg(function: &str, args: &Args, index: usize) -> Result<f64, PyException> {
    let value = args.get(index);
    value.and_then(Value::as_float).ok_or_else(|| {
        type_error(format!(
            "{function}() must be real number, not {}",
            value.map_or("NoneType", Value::type_name)
        ))
    })
}

fn unary(function: &str, args: &Args, op: fn(f64) -> f64) -> EvalResult {
    args.expect(function, 1, 1)?;
    Ok(Value::Float(op(float_arg(function, args, 0)?)))
}

fn binary(function: &str, args: &Args, op: fn(f64, f64) -> f64) -> EvalResult {
    args.expect(function, 2, 2)?;
    let (a, b) = (float_arg(function, args, 0)?, float_arg(function, args, 1)?);
    Ok(Value::Float(op(a, b)))
}

fn predicate(function: &str, args: &Args, test: fn(f64) -> bool) -> EvalResult {
    args.expect(function, 1, 1)?;
    Ok(Value::Bool(test(float_arg(function, args, 0)?)))
}

fn domain_error() -> PyException {
    value_error("math domain error")
}

fn sqrt(_: &mut Interpreter<'_>, args: Args) -> EvalResult {
    args.expect("sqrt", 1, 1)?;
    let x = float_arg("sqrt", &args, 0)?;
    if x < 0.0 {
        return Err(domain_error());
    }
    Ok(Value::Float(x.sqrt()))
}

/// `floor`, `ceil` and `trunc` return `int`.
fn integral(function: &str, args: &Args, op: fn(f64) -> f64) -> EvalResult {
    args.expect(function, 1, 1)?;
    if let Some(n) = args.positional[0].as_int() {
        return Ok(Value::Int(n));
    }
    float_to_int(op(float_arg(function, args, 0)?))
}

fn floor(_: &mut Interpreter<'_>, args: Args) -> EvalResult {
    integral("floor", &args, f64::floor)
}

fn ceil(_: &mut Interpreter<'_>, args: Args) -> EvalResult {
    integral("ceil", &args, f64::ceil)
}

fn trunc(_: &mut Interpreter<'_>, args: Args) -> EvalResult {
    integral("trunc", &args, f64::trunc)
}

fn log(_: &mut Interpreter<'_>, args: Args) -> EvalResult {
    args.expect("log", 1, 2)?;
    let x = float_arg("log", &args, 0)?;
    if x <= 0.0 {
        return Err(domain_error());
    }
    match args.get(1) {
        None => Ok(Value::Float(x.ln())),
        Some(_) => {
            let base = float_arg("log", &args, 1)?;
            if base <= 0.0 || base == 1.0 {
                return Err(domain_error());
            }
            Ok(Value::Float(x.ln() / base.ln()))
        }
    }
}

fn log10(_: &mut Interpreter<'_>, args: Args) -> EvalResult {
    args.expect("log10", 1, 1)?;
    let x = float_arg("log10", &args, 0)?;
    if x <= 0.0 {
        return Err(domain_error());
    }
    Ok(Value::Float(x.log10()))
}
