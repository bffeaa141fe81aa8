//! Attribute access, subscripts and slices.

use super::Interpreter;
use crate::errors::{
    index_out_of_range, key_not_found, no_attribute, not_subscriptable, type_error, value_error,
    EvalResult, PyException,
};
use crate::methods;
use crate::value::Value;

impl Interpreter<'_> {
    /// `value.attr`
    pub fn get_attr(&mut self, value: &Value, attr: &str) -> EvalResult {
        match value {
            Value::Module(module) => {
                let found = module.dict.read().get_str(attr);
                found.ok_or_else(|| no_attribute(value, attr))
            }
            Value::Exception(exc) if attr == "args" => {
                if exc.message.is_empty() {
                    Ok(Value::tuple(Vec::new()))
                } else {
                    Ok(Value::tuple(vec![Value::str(exc.message.as_str())]))
                }
            }
            Value::Function(function) if attr == "__name__" => {
                Ok(Value::str(function.def.name.as_str()))
            }
            Value::Builtin(builtin) if attr == "__name__" => Ok(Value::str(builtin.name.as_str())),
            Value::Type(kind) if attr == "__name__" => Ok(Value::str(kind.name())),
            Value::ExceptionType(kind) if attr == "__name__" => Ok(Value::str(kind.name())),
            _ if methods::has_method(value, attr) => Ok(Value::bound_method(value.clone(), attr)),
            _ => Err(no_attribute(value, attr)),
        }
    }

    /// `value.attr = new`; only modules accept attribute assignment.
    pub fn set_attr(&mut self, value: &Value, attr: &str, new: Value) -> Result<(), PyException> {
        match value {
            Value::Module(module) => {
                module.dict.write().set_str(attr, new);
                Ok(())
            }
            _ => Err(no_attribute(value, attr)),
        }
    }

    pub(crate) fn del_attr(&mut self, value: &Value, attr: &str) -> Result<(), PyException> {
        let removed = match value {
            Value::Module(module) => module.dict.write().remove_str(attr).is_some(),
            _ => false,
        };
        if removed {
            Ok(())
        } else {
            Err(no_attribute(value, attr))
        }
    }

    /// `value[index]`
    pub fn get_item(&mut self, value: &Value, index: &Value) -> EvalResult {
        match value {
            Value::List(items) => {
                let items = items.read();
                let i = sequence_index(index, items.len(), "list")?;
                Ok(items[i].clone())
            }
            Value::Tuple(items) => {
                let i = sequence_index(index, items.len(), "tuple")?;
                Ok(items[i].clone())
            }
            Value::Str(s) => {
                let chars: Vec<char> = s.chars().collect();
                let i = sequence_index(index, chars.len(), "string")?;
                Ok(Value::str(chars[i].to_string()))
            }
            Value::Range(range) => {
                let i = sequence_index(index, range.len(), "range object")?;
                range
                    .get(i)
                    .map(Value::Int)
                    .ok_or_else(|| index_out_of_range("range object"))
            }
            Value::Dict(dict) => {
                let found = dict.read().get(index)?;
                found.ok_or_else(|| key_not_found(index))
            }
            _ => Err(not_subscriptable(value)),
        }
    }

    /// `value[lower:upper:step]`; absent bounds are `None`.
    pub fn get_slice(
        &mut self,
        value: &Value,
        lower: &Value,
        upper: &Value,
        step: &Value,
    ) -> EvalResult {
        let pick = |len: usize| slice_indices(len, lower, upper, step);
        match value {
            Value::List(items) => {
                let items = items.read();
                let picked = pick(items.len())?.into_iter().map(|i| items[i].clone()).collect();
                Ok(Value::list(picked))
            }
            Value::Tuple(items) => {
                let picked = pick(items.len())?.into_iter().map(|i| items[i].clone()).collect();
                Ok(Value::tuple(picked))
            }
            Value::Str(s) => {
                let chars: Vec<char> = s.chars().collect();
                let picked: String = pick(chars.len())?.into_iter().map(|i| chars[i]).collect();
                Ok(Value::str(picked))
            }
            Value::Range(range) => {
                let picked = pick(range.len())?
                    .into_iter()
                    .filter_map(|i| range.get(i).map(Value::Int))
                    .collect();
                Ok(Value::list(picked))
            }
            _ => Err(not_subscriptable(value)),
        }
    }

    /// `value[index] = new`
    pub fn set_item(&mut self, value: &Value, index: Value, new: Value) -> Result<(), PyException> {
        match value {
            Value::List(items) => {
                let mut items = items.write();
                let i = sequence_index(&index, items.len(), "list assignment")?;
                items[i] = new;
                Ok(())
            }
            Value::Dict(dict) => dict.write().insert(index, new),
            _ => Err(type_error(format!(
                "'{}' object does not support item assignment",
                value.type_name()
            ))),
        }
    }

    pub(crate) fn del_item(&mut self, value: &Value, index: &Value) -> Result<(), PyException> {
        match value {
            Value::List(items) => {
                let mut items = items.write();
                let i = sequence_index(index, items.len(), "list assignment")?;
                items.remove(i);
                Ok(())
            }
            Value::Dict(dict) => match dict.write().remove(index)? {
                Some(_) => Ok(()),
                None => Err(key_not_found(index)),
            },
            _ => Err(type_error(format!(
                "'{}' object doesn't support item deletion",
                value.type_name()
            ))),
        }
    }
}

/// Resolve a possibly negative index against `len`.
pub(crate) fn sequence_index(index: &Value, len: usize, what: &str) -> Result<usize, PyException> {
    let Some(raw) = index.as_int() else {
        let container = what.split(' ').next().unwrap_or(what);
        return Err(type_error(format!(
            "{container} indices must be integers or slices, not {}",
            index.type_name()
        )));
    };
    let len_i = i64::try_from(len).unwrap_or(i64::MAX);
    let resolved = if raw < 0 { raw + len_i } else { raw };
    if resolved < 0 || resolved >= len_i {
        return Err(index_out_of_range(what));
    }
    usize::try_from(resolved).map_err(|_| index_out_of_range(what))
}

/// Indices selected by a slice over a sequence of length `len`.
pub(crate) fn slice_indices(
    len: usize,
    lower: &Value,
    upper: &Value,
    step: &Value,
) -> Result<Vec<usize>, PyException> {
    let bound = |v: &Value| -> Result<Option<i64>, PyException> {
        match v {
            Value::None => Ok(None),
            other => other.as_int().map(Some).ok_or_else(|| {
                type_error("slice indices must be integers or None")
            }),
        }
    };
    let step = bound(step)?.unwrap_or(1);
    if step == 0 {
        return Err(value_error("slice step cannot be zero"));
    }
    let len = i64::try_from(len).unwrap_or(i64::MAX);

    let clamp = |index: i64, low: i64, high: i64| -> i64 {
        let index = if index < 0 { index + len } else { index };
        index.clamp(low, high)
    };
    let (start, stop) = if step > 0 {
        (
            bound(lower)?.map_or(0, |i| clamp(i, 0, len)),
            bound(upper)?.map_or(len, |i| clamp(i, 0, len)),
        )
    } else {
        (
            bound(lower)?.map_or(len - 1, |i| clamp(i, -1, len - 1)),
            bound(upper)?.map_or(-1, |i| clamp(i, -1, len - 1)),
        )
    };

    let mut out = Vec::new();
    let mut i = start;
    while (step > 0 && i < stop) || (step < 0 && i > stop) {
        if let Ok(index) = usize::try_from(i) {
            out.push(index);
        }
        i = match i.checked_add(step) {
            Some(next) => next,
            None => break,
        };
    }
    Ok(out)
}
