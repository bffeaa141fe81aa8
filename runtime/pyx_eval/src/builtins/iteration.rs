//! Builtins consuming iterables.

use std::cmp::Ordering;

use pyx_ir::BinaryOp;

use crate::errors::{type_error, value_error, EvalResult, PyException};
use crate::interpreter::{Args, Interpreter};
use crate::methods::sort_values;
use crate::operators::{self, compare_values};
use crate::value::Value;

pub(super) fn all(interp: &mut Interpreter<'_>, args: Args) -> EvalResult {
    args.expect("all", 1, 1)?;
    let mut items = interp.iterate(&args.positional[0])?;
    Ok(Value::Bool(items.all(|v| v.is_truthy())))
}

pub(super) fn any(interp: &mut Interpreter<'_>, args: Args) -> EvalResult {
    args.expect("any", 1, 1)?;
    let mut items = interp.iterate(&args.positional[0])?;
    Ok(Value::Bool(items.any(|v| v.is_truthy())))
}

pub(super) fn enumerate(interp: &mut Interpreter<'_>, mut args: Args) -> EvalResult {
    let start = args.take_keyword("start");
    args.expect("enumerate", 1, 2)?;
    let start = match start.as_ref().or(args.get(1)) {
        None => 0,
        Some(v) => v
            .as_int()
            .ok_or_else(|| type_error(format!("'{}' object cannot be interpreted as an integer", v.type_name())))?,
    };
    let items = interp.collect(&args.positional[0])?;
    let mut out = Vec::with_capacity(items.len());
    let mut index = start;
    for item in items {
        out.push(Value::tuple(vec![Value::Int(index), item]));
        index = index.saturating_add(1);
    }
    Ok(Value::list(out))
}

pub(super) fn zip(interp: &mut Interpreter<'_>, args: Args) -> EvalResult {
    args.expect("zip", 0, usize::MAX)?;
    let mut columns = Vec::with_capacity(args.len());
    for iterable in &args.positional {
        columns.push(interp.collect(iterable)?);
    }
    let rows = columns.iter().map(Vec::len).min().unwrap_or(0);
    let out = (0..rows)
        .map(|row| Value::tuple(columns.iter().map(|col| col[row].clone()).collect()))
        .collect();
    Ok(Value::list(out))
}

pub(super) fn map(interp: &mut Interpreter<'_>, args: Args) -> EvalResult {
    args.expect("map", 2, usize::MAX)?;
    let func = args.positional[0].clone();
    let mut columns = Vec::with_capacity(args.len() - 1);
    for iterable in &args.positional[1..] {
        columns.push(interp.collect(iterable)?);
    }
    let rows = columns.iter().map(Vec::len).min().unwrap_or(0);
    let mut out = Vec::with_capacity(rows);
    for row in 0..rows {
        let call_args = columns.iter().map(|col| col[row].clone()).collect();
        out.push(interp.call_positional(&func, call_args)?);
    }
    Ok(Value::list(out))
}

pub(super) fn filter(interp: &mut Interpreter<'_>, args: Args) -> EvalResult {
    args.expect("filter", 2, 2)?;
    let func = args.positional[0].clone();
    let mut out = Vec::new();
    for item in interp.collect(&args.positional[1])? {
        let keep = if func.is_none() {
            item.is_truthy()
        } else {
            interp.call_positional(&func, vec![item.clone()])?.is_truthy()
        };
        if keep {
            out.push(item);
        }
    }
    Ok(Value::list(out))
}

pub(super) fn reversed(interp: &mut Interpreter<'_>, args: Args) -> EvalResult {
    args.expect("reversed", 1, 1)?;
    let value = &args.positional[0];
    if matches!(value, Value::Set(_) | Value::Dict(_)) {
        return Err(type_error(format!(
            "'{}' object is not reversible",
            value.type_name()
        )));
    }
    let mut items = interp.collect(value)?;
    items.reverse();
    Ok(Value::list(items))
}

pub(super) fn sorted(interp: &mut Interpreter<'_>, mut args: Args) -> EvalResult {
    let key = args.take_keyword("key").filter(|k| !k.is_none());
    let reverse = args.take_keyword("reverse").is_some_and(|r| r.is_truthy());
    args.expect("sorted", 1, 1)?;
    let items = interp.collect(&args.positional[0])?;
    Ok(Value::list(sort_values(interp, items, key.as_ref(), reverse)?))
}

pub(super) fn sum(interp: &mut Interpreter<'_>, mut args: Args) -> EvalResult {
    let start = args.take_keyword("start");
    args.expect("sum", 1, 2)?;
    let mut total = start.or_else(|| args.get(1).cloned()).unwrap_or(Value::Int(0));
    if matches!(total, Value::Str(_)) {
        return Err(type_error("sum() can't sum strings [use ''.join(seq) instead]"));
    }
    for item in interp.iterate(&args.positional[0])? {
        total = operators::binary(BinaryOp::Add, &total, &item)?;
    }
    Ok(total)
}

pub(super) fn min(interp: &mut Interpreter<'_>, args: Args) -> EvalResult {
    extreme(interp, args, "min", Ordering::Less)
}

pub(super) fn max(interp: &mut Interpreter<'_>, args: Args) -> EvalResult {
    extreme(interp, args, "max", Ordering::Greater)
}

/// `min`/`max`: over one iterable or over several positional arguments,
/// with optional `key=` and `default=`. Ties keep the first candidate.
fn extreme(interp: &mut Interpreter<'_>, mut args: Args, name: &str, wanted: Ordering) -> EvalResult {
    let key = args.take_keyword("key").filter(|k| !k.is_none());
    let default = args.take_keyword("default");
    args.expect(name, 1, usize::MAX)?;
    let candidates = if args.len() == 1 {
        interp.collect(&args.positional[0])?
    } else {
        if default.is_some() {
            return Err(type_error(format!(
                "Cannot specify a default for {name}() with multiple positional arguments"
            )));
        }
        args.positional
    };

    let mut best: Option<(Value, Value)> = None;
    for item in candidates {
        let k = match &key {
            Some(func) => interp.call_positional(func, vec![item.clone()])?,
            None => item.clone(),
        };
        let replace = match &best {
            None => true,
            Some((best_key, _)) => compare_values(&k, best_key)? == wanted,
        };
        if replace {
            best = Some((k, item));
        }
    }
    match (best, default) {
        (Some((_, item)), _) => Ok(item),
        (None, Some(default)) => Ok(default),
        (None, None) => Err(empty_sequence(name)),
    }
}

fn empty_sequence(name: &str) -> PyException {
    value_error(format!("{name}() arg is an empty sequence"))
}

