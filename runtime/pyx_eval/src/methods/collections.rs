//! `list`, `dict` and `set` methods.
//!
//! Every method takes the container lock for one operation only. Anything
//! that calls back into the interpreter (`sort(key=...)`, `extend` over an
//! arbitrary iterable) works on a snapshot.

use std::cmp::Ordering;

use super::helpers::{arg, opt_int_arg};
use crate::errors::{
    index_out_of_range, key_not_found, no_attribute, type_error, value_error, EvalResult,
    ExceptionKind, PyException,
};
use crate::interpreter::{Args, Interpreter};
use crate::operators::compare_values;
use crate::value::{SetValue, Value};

pub(super) fn dispatch_list(
    interp: &mut Interpreter<'_>,
    receiver: &Value,
    method: &str,
    mut args: Args,
) -> EvalResult {
    let Value::List(list) = receiver else {
        return Err(no_attribute(receiver, method));
    };
    match method {
        "append" => {
            args.expect(method, 1, 1)?;
            list.write().push(arg(&args, 0));
            Ok(Value::None)
        }
        "extend" => {
            args.expect(method, 1, 1)?;
            let items = interp.collect(&args.positional[0])?;
            list.write().extend(items);
            Ok(Value::None)
        }
        "insert" => {
            args.expect(method, 2, 2)?;
            let index = opt_int_arg(method, &args, 0)?.unwrap_or(0);
            let mut items = list.write();
            let at = clamp_index(index, items.len());
            items.insert(at, arg(&args, 1));
            Ok(Value::None)
        }
        "pop" => {
            args.expect(method, 0, 1)?;
            let index = opt_int_arg(method, &args, 0)?.unwrap_or(-1);
            let mut items = list.write();
            if items.is_empty() {
                return Err(PyException::new(ExceptionKind::IndexError, "pop from empty list"));
            }
            let len = i64::try_from(items.len()).unwrap_or(i64::MAX);
            let at = if index < 0 { index + len } else { index };
            if !(0..len).contains(&at) {
                return Err(index_out_of_range("pop"));
            }
            Ok(items.remove(usize::try_from(at).unwrap_or_default()))
        }
        "remove" => {
            args.expect(method, 1, 1)?;
            let needle = arg(&args, 0);
            let snapshot = list.read().clone();
            let Some(at) = snapshot.iter().position(|v| v.equals(&needle)) else {
                return Err(value_error("list.remove(x): x not in list"));
            };
            let mut items = list.write();
            if at < items.len() {
                items.remove(at);
            }
            Ok(Value::None)
        }
        "index" => {
            args.expect(method, 1, 1)?;
            let needle = arg(&args, 0);
            let snapshot = list.read().clone();
            snapshot
                .iter()
                .position(|v| v.equals(&needle))
                .map(|at| Value::Int(i64::try_from(at).unwrap_or(i64::MAX)))
                .ok_or_else(|| value_error(format!("{} is not in list", needle.repr())))
        }
        "count" => {
            args.expect(method, 1, 1)?;
            let needle = arg(&args, 0);
            let snapshot = list.read().clone();
            let n = snapshot.iter().filter(|v| v.equals(&needle)).count();
            Ok(Value::Int(i64::try_from(n).unwrap_or(i64::MAX)))
        }
        "clear" => {
            args.expect(method, 0, 0)?;
            list.write().clear();
            Ok(Value::None)
        }
        "reverse" => {
            args.expect(method, 0, 0)?;
            list.write().reverse();
            Ok(Value::None)
        }
        "copy" => {
            args.expect(method, 0, 0)?;
            Ok(Value::list(list.read().clone()))
        }
        "sort" => {
            let key = args.take_keyword("key").filter(|k| !k.is_none());
            let reverse = args.take_keyword("reverse").is_some_and(|r| r.is_truthy());
            args.expect(method, 0, 0)?;
            let snapshot = list.read().clone();
            let sorted = sort_values(interp, snapshot, key.as_ref(), reverse)?;
            *list.write() = sorted;
            Ok(Value::None)
        }
        _ => Err(no_attribute(receiver, method)),
    }
}

/// Clamp an insertion index the way `list.insert` does.
fn clamp_index(index: i64, len: usize) -> usize {
    let len_i = i64::try_from(len).unwrap_or(i64::MAX);
    let at = if index < 0 { (index + len_i).max(0) } else { index.min(len_i) };
    usize::try_from(at).unwrap_or(len)
}

/// Stable sort with an optional key function, as `sorted()` and
/// `list.sort()` do. The first comparison error aborts the sort.
pub(crate) fn sort_values(
    interp: &mut Interpreter<'_>,
    items: Vec<Value>,
    key: Option<&Value>,
    reverse: bool,
) -> Result<Vec<Value>, PyException> {
    let mut keyed = Vec::with_capacity(items.len());
    for item in items {
        let k = match key {
            Some(func) => interp.call_positional(func, vec![item.clone()])?,
            None => item.clone(),
        };
        keyed.push((k, item));
    }

    let mut failure = None;
    keyed.sort_by(|(a, _), (b, _)| {
        if failure.is_some() {
            return Ordering::Equal;
        }
        let ordering = if reverse {
            compare_values(b, a)
        } else {
            compare_values(a, b)
        };
        ordering.unwrap_or_else(|err| {
            failure = Some(err);
            Ordering::Equal
        })
    });
    match failure {
        Some(err) => Err(err),
        None => Ok(keyed.into_iter().map(|(_, item)| item).collect()),
    }
}

pub(super) fn dispatch_dict(
    interp: &mut Interpreter<'_>,
    receiver: &Value,
    method: &str,
    mut args: Args,
) -> EvalResult {
    let Value::Dict(dict) = receiver else {
        return Err(no_attribute(receiver, method));
    };
    if method == "update" {
        let keywords = std::mem::take(&mut args.keywords);
        args.expect(method, 0, 1)?;
        if let Some(other) = args.get(0) {
            let pairs = pairs_of(interp, other)?;
            let mut target = dict.write();
            for (k, v) in pairs {
                target.insert(k, v)?;
            }
        }
        let mut target = dict.write();
        for (k, v) in keywords {
            target.set_str(&k, v);
        }
        return Ok(Value::None);
    }

    match method {
        "keys" => {
            args.expect(method, 0, 0)?;
            Ok(Value::list(dict.read().keys()))
        }
        "values" => {
            args.expect(method, 0, 0)?;
            Ok(Value::list(dict.read().values()))
        }
        "items" => {
            args.expect(method, 0, 0)?;
            let items = dict.read().items();
            Ok(Value::list(
                items
                    .into_iter()
                    .map(|(k, v)| Value::tuple(vec![k, v]))
                    .collect(),
            ))
        }
        "get" => {
            args.expect(method, 1, 2)?;
            let found = dict.read().get(&args.positional[0])?;
            Ok(found.unwrap_or_else(|| arg(&args, 1)))
        }
        "pop" => {
            args.expect(method, 1, 2)?;
            let key = &args.positional[0];
            let removed = dict.write().remove(key)?;
            match (removed, args.get(1)) {
                (Some(value), _) => Ok(value),
                (None, Some(default)) => Ok(default.clone()),
                (None, None) => Err(key_not_found(key)),
            }
        }
        "setdefault" => {
            args.expect(method, 1, 2)?;
            let key = args.positional[0].clone();
            let mut target = dict.write();
            if let Some(existing) = target.get(&key)? {
                return Ok(existing);
            }
            let default = arg(&args, 1);
            target.insert(key, default.clone())?;
            Ok(default)
        }
        "clear" => {
            args.expect(method, 0, 0)?;
            dict.write().clear();
            Ok(Value::None)
        }
        "copy" => {
            args.expect(method, 0, 0)?;
            Ok(Value::dict(dict.read().clone()))
        }
        _ => Err(no_attribute(receiver, method)),
    }
}

/// Key/value pairs of a mapping or of an iterable of pairs.
pub(crate) fn pairs_of(
    interp: &mut Interpreter<'_>,
    source: &Value,
) -> Result<Vec<(Value, Value)>, PyException> {
    if let Value::Dict(dict) = source {
        return Ok(dict.read().items());
    }
    let mut pairs = Vec::new();
    for (index, item) in interp.collect(source)?.into_iter().enumerate() {
        let pair = interp.collect(&item).map_err(|_| {
            type_error(format!(
                "cannot convert dictionary update sequence element #{index} to a sequence"
            ))
        })?;
        match <[Value; 2]>::try_from(pair) {
            Ok([k, v]) => pairs.push((k, v)),
            Err(pair) => {
                return Err(value_error(format!(
                    "dictionary update sequence element #{index} has length {}; 2 is required",
                    pair.len()
                )))
            }
        }
    }
    Ok(pairs)
}

pub(super) fn dispatch_set(
    interp: &mut Interpreter<'_>,
    receiver: &Value,
    method: &str,
    args: Args,
) -> EvalResult {
    let Value::Set(set) = receiver else {
        return Err(no_attribute(receiver, method));
    };
    match method {
        "add" => {
            args.expect(method, 1, 1)?;
            set.write().insert(arg(&args, 0))?;
            Ok(Value::None)
        }
        "remove" => {
            args.expect(method, 1, 1)?;
            let key = &args.positional[0];
            if set.write().remove(key)? {
                Ok(Value::None)
            } else {
                Err(key_not_found(key))
            }
        }
        "discard" => {
            args.expect(method, 1, 1)?;
            set.write().remove(&args.positional[0])?;
            Ok(Value::None)
        }
        "clear" => {
            args.expect(method, 0, 0)?;
            set.write().clear();
            Ok(Value::None)
        }
        "union" | "intersection" | "difference" => {
            args.expect(method, 1, 1)?;
            let other = set_of(interp, &args.positional[0])?;
            let mine = set.read().clone();
            let mut out = SetValue::new();
            match method {
                "union" => {
                    for v in mine.values().into_iter().chain(other.values()) {
                        out.insert(v)?;
                    }
                }
                "intersection" => {
                    for v in mine.values() {
                        if other.contains(&v)? {
                            out.insert(v)?;
                        }
                    }
                }
                _ => {
                    for v in mine.values() {
                        if !other.contains(&v)? {
                            out.insert(v)?;
                        }
                    }
                }
            }
            Ok(Value::set(out))
        }
        _ => Err(no_attribute(receiver, method)),
    }
}

fn set_of(interp: &mut Interpreter<'_>, source: &Value) -> Result<SetValue, PyException> {
    let mut out = SetValue::new();
    for item in interp.collect(source)? {
        out.insert(item)?;
    }
    Ok(out)
}
