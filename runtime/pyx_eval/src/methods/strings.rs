//! `str` methods.

use super::helpers::{opt_int_arg, opt_str_arg, str_arg};
use crate::errors::{no_attribute, type_error, value_error, EvalResult, PyException};
use crate::interpreter::{Args, Interpreter};
use crate::value::{Heap, Value};

pub(super) fn dispatch(
    interp: &mut Interpreter<'_>,
    s: &Heap<str>,
    method: &str,
    mut args: Args,
) -> EvalResult {
    if method == "format" {
        return format(s, args);
    }
    if method == "split" {
        let sep = args.take_keyword("sep");
        let maxsplit = args.take_keyword("maxsplit");
        if let Some(sep) = sep {
            args.positional.insert(0, sep);
        }
        if let Some(maxsplit) = maxsplit {
            if args.positional.is_empty() {
                args.positional.push(Value::None);
            }
            args.positional.push(maxsplit);
        }
    }

    match method {
        "upper" => {
            args.expect(method, 0, 0)?;
            Ok(Value::str(s.to_uppercase()))
        }
        "lower" => {
            args.expect(method, 0, 0)?;
            Ok(Value::str(s.to_lowercase()))
        }
        "strip" | "lstrip" | "rstrip" => {
            args.expect(method, 0, 1)?;
            let chars = opt_str_arg(method, &args, 0)?;
            let matches = |c: char| match chars {
                Some(set) => set.contains(c),
                None => c.is_whitespace(),
            };
            let out = match method {
                "strip" => s.trim_matches(matches),
                "lstrip" => s.trim_start_matches(matches),
                _ => s.trim_end_matches(matches),
            };
            Ok(Value::str(out))
        }
        "split" => {
            args.expect(method, 0, 2)?;
            let sep = opt_str_arg(method, &args, 0)?;
            let maxsplit = opt_int_arg(method, &args, 1)?.unwrap_or(-1);
            split(s, sep, maxsplit)
        }
        "join" => {
            args.expect(method, 1, 1)?;
            let items = interp.collect(&args.positional[0])?;
            let mut parts = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                match item.as_str() {
                    Some(part) => parts.push(part),
                    None => {
                        return Err(type_error(format!(
                            "sequence item {index}: expected str instance, {} found",
                            item.type_name()
                        )))
                    }
                }
            }
            Ok(Value::str(parts.join(&**s)))
        }
        "replace" => {
            args.expect(method, 2, 3)?;
            let old = str_arg(method, &args, 0)?;
            let new = str_arg(method, &args, 1)?;
            let out = match opt_int_arg(method, &args, 2)? {
                Some(count) if count >= 0 => {
                    s.replacen(old, new, usize::try_from(count).unwrap_or(usize::MAX))
                }
                _ => s.replace(old, new),
            };
            Ok(Value::str(out))
        }
        "startswith" | "endswith" => {
            args.expect(method, 1, 1)?;
            let candidates: Vec<&str> = match &args.positional[0] {
                Value::Tuple(items) => items.iter().filter_map(Value::as_str).collect(),
                _ => vec![str_arg(method, &args, 0)?],
            };
            let hit = candidates.iter().any(|prefix| {
                if method == "startswith" {
                    s.starts_with(prefix)
                } else {
                    s.ends_with(prefix)
                }
            });
            Ok(Value::Bool(hit))
        }
        "find" => {
            args.expect(method, 1, 1)?;
            let needle = str_arg(method, &args, 0)?;
            let index = s
                .find(needle)
                .map_or(-1, |byte| char_count(&s[..byte]));
            Ok(Value::Int(index))
        }
        "count" => {
            args.expect(method, 1, 1)?;
            let needle = str_arg(method, &args, 0)?;
            let n = if needle.is_empty() {
                s.chars().count() + 1
            } else {
                s.matches(needle).count()
            };
            Ok(Value::Int(i64::try_from(n).unwrap_or(i64::MAX)))
        }
        "isdigit" => {
            args.expect(method, 0, 0)?;
            Ok(Value::Bool(!s.is_empty() && s.chars().all(|c| c.is_ascii_digit())))
        }
        "isalpha" => {
            args.expect(method, 0, 0)?;
            Ok(Value::Bool(!s.is_empty() && s.chars().all(char::is_alphabetic)))
        }
        _ => Err(no_attribute(&Value::Str(s.clone()), method)),
    }
}

fn char_count(s: &str) -> i64 {
    i64::try_from(s.chars().count()).unwrap_or(i64::MAX)
}

fn split(s: &str, sep: Option<&str>, maxsplit: i64) -> EvalResult {
    let limit = usize::try_from(maxsplit).ok();
    let parts: Vec<Value> = match sep {
        Some("") => return Err(value_error("empty separator")),
        Some(sep) => match limit {
            Some(n) => s.splitn(n + 1, sep).map(Value::str).collect(),
            None => s.split(sep).map(Value::str).collect(),
        },
        None => split_whitespace(s, limit),
    };
    Ok(Value::list(parts))
}

/// Whitespace split with an optional split limit; the remainder keeps its
/// interior whitespace.
fn split_whitespace(s: &str, limit: Option<usize>) -> Vec<Value> {
    let mut parts = Vec::new();
    let mut rest = s.trim_start();
    while !rest.is_empty() {
        if limit.is_some_and(|n| parts.len() >= n) {
            parts.push(Value::str(rest.trim_end()));
            break;
        }
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        parts.push(Value::str(&rest[..end]));
        rest = rest[end..].trim_start();
    }
    parts
}

/// `str.format` with positional (`{}`, `{0}`) and keyword (`{name}`)
/// fields. A field may carry a `:.Nf` precision or a `:d` spec.
fn format(template: &str, mut args: Args) -> EvalResult {
    let keywords = std::mem::take(&mut args.keywords);
    let mut out = String::with_capacity(template.len());
    let mut auto_index = 0;
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut field = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(ch) => field.push(ch),
                        None => return Err(value_error("expected '}' before end of string")),
                    }
                }
                let (name, spec) = match field.split_once(':') {
                    Some((name, spec)) => (name, spec),
                    None => (field.as_str(), ""),
                };
                let value = if name.is_empty() {
                    let value = args.get(auto_index).cloned();
                    auto_index += 1;
                    value.ok_or_else(|| format_index_error(auto_index - 1))?
                } else if let Ok(index) = name.parse::<usize>() {
                    args.get(index)
                        .cloned()
                        .ok_or_else(|| format_index_error(index))?
                } else {
                    keywords
                        .iter()
                        .find(|(k, _)| k == name)
                        .map(|(_, v)| v.clone())
                        .ok_or_else(|| {
                            PyException::new(crate::errors::ExceptionKind::KeyError, name)
                        })?
                };
                out.push_str(&apply_spec(&value, spec)?);
            }
            '}' => return Err(value_error("single '}' encountered in format string")),
            other => out.push(other),
        }
    }
    Ok(Value::str(out))
}

fn format_index_error(index: usize) -> PyException {
    PyException::new(
        crate::errors::ExceptionKind::IndexError,
        format!("Replacement index {index} out of range for positional args tuple"),
    )
}

fn apply_spec(value: &Value, spec: &str) -> Result<String, PyException> {
    if spec.is_empty() {
        return Ok(value.to_str());
    }
    if spec == "d" {
        return value
            .as_int()
            .map(|n| n.to_string())
            .ok_or_else(|| value_error(format!("Unknown format code 'd' for object of type '{}'", value.type_name())));
    }
    if let Some(precision) = spec
        .strip_prefix('.')
        .and_then(|rest| rest.strip_suffix('f'))
        .and_then(|digits| digits.parse::<usize>().ok())
    {
        let x = value.as_float().ok_or_else(|| {
            value_error(format!(
                "Unknown format code 'f' for object of type '{}'",
                value.type_name()
            ))
        })?;
        return Ok(format!("{x:.precision$}"));
    }
    Err(value_error(format!("Invalid format specifier '{spec}'")))
}
