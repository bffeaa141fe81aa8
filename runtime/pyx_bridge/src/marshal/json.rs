//! JSON text for `eval_to_json`.
//!
//! The output reads like the engine's own `json.dumps` defaults would:
//! `", "` and `": "` separators, non-ASCII escaped as `\uXXXX`, floats in
//! `repr` form. Failures are engine exceptions, reported like any other
//! script error.

use std::io;

use pyx_eval::{float_repr, ExceptionKind, Heap, PyException, Value};
use pyx_stack::ensure_sufficient_stack;
use serde::Serialize;
use serde_json::ser::Formatter;
use serde_json::{Map, Number};

/// Deepest container nesting that is encoded.
pub const MAX_JSON_DEPTH: usize = 1_000;

/// Encode `value` as JSON text.
pub fn to_json(value: &Value) -> Result<String, PyException> {
    let mut path = Vec::new();
    let json = encode(value, &mut path)?;
    let mut out = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, ScriptFormatter);
    json.serialize(&mut serializer)
        .map_err(|err| PyException::new(ExceptionKind::ValueError, err.to_string()))?;
    String::from_utf8(out).map_err(|err| PyException::new(ExceptionKind::ValueError, err.to_string()))
}

/// `path` holds the addresses of the containers being encoded, for cycle
/// detection.
fn encode(value: &Value, path: &mut Vec<usize>) -> Result<serde_json::Value, PyException> {
    Ok(match value {
        Value::None => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(n) => serde_json::Value::from(*n),
        Value::Float(x) => serde_json::Value::Number(finite(*x)?),
        Value::Str(s) => serde_json::Value::String(s.to_string()),
        Value::List(items) => {
            let items = items.read().clone();
            nested(value, path, |path| array(&items, path))?
        }
        Value::Tuple(items) => nested(value, path, |path| array(items, path))?,
        Value::Dict(dict) => {
            let entries = dict.read().items();
            nested(value, path, |path| {
                let mut object = Map::new();
                for (key, item) in &entries {
                    object.insert(key_text(key)?, encode(item, path)?);
                }
                Ok(serde_json::Value::Object(object))
            })?
        }
        other => {
            return Err(PyException::new(
                ExceptionKind::TypeError,
                format!("Object of type {} is not JSON serializable", other.type_name()),
            ))
        }
    })
}

fn array(items: &[Value], path: &mut Vec<usize>) -> Result<serde_json::Value, PyException> {
    items
        .iter()
        .map(|item| encode(item, path))
        .collect::<Result<Vec<_>, _>>()
        .map(serde_json::Value::Array)
}

/// Encode the children of the container `value` one level deeper.
fn nested(
    value: &Value,
    path: &mut Vec<usize>,
    encode_children: impl FnOnce(&mut Vec<usize>) -> Result<serde_json::Value, PyException>,
) -> Result<serde_json::Value, PyException> {
    let address = match value {
        Value::List(items) => Heap::addr(items),
        Value::Tuple(items) => Heap::addr(items),
        Value::Dict(dict) => Heap::addr(dict),
        _ => 0,
    };
    if path.contains(&address) {
        return Err(PyException::new(
            ExceptionKind::ValueError,
            "Circular reference detected",
        ));
    }
    if path.len() >= MAX_JSON_DEPTH {
        return Err(PyException::new(
            ExceptionKind::RecursionError,
            "maximum recursion depth exceeded while encoding a JSON object",
        ));
    }
    path.push(address);
    let result = ensure_sufficient_stack(|| encode_children(path));
    path.pop();
    result
}

fn finite(x: f64) -> Result<Number, PyException> {
    Number::from_f64(x).ok_or_else(|| {
        PyException::new(
            ExceptionKind::ValueError,
            format!("Out of range float values are not JSON compliant: {}", float_repr(x)),
        )
    })
}

/// Object keys: strings as they are, scalars in their JSON spelling.
fn key_text(key: &Value) -> Result<String, PyException> {
    Ok(match key {
        Value::Str(s) => s.to_string(),
        Value::Int(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::None => "null".to_string(),
        Value::Float(x) => {
            finite(*x)?;
            float_repr(*x)
        }
        other => {
            return Err(PyException::new(
                ExceptionKind::TypeError,
                format!(
                    "keys must be str, int, float, bool or None, not {}",
                    other.type_name()
                ),
            ))
        }
    })
}

/// Spacing, escaping and float spelling of the engine's `json.dumps`.
struct ScriptFormatter;

impl Formatter for ScriptFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    fn write_f64<W>(&mut self, writer: &mut W, value: f64) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(float_repr(value).as_bytes())
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if fragment.is_ascii() {
            return writer.write_all(fragment.as_bytes());
        }
        let mut bytes = [0u8; 4];
        let mut units = [0u16; 2];
        for c in fragment.chars() {
            if c.is_ascii() {
                writer.write_all(c.encode_utf8(&mut bytes).as_bytes())?;
            } else {
                for unit in c.encode_utf16(&mut units) {
                    write!(writer, "\\u{unit:04x}")?;
                }
            }
        }
        Ok(())
    }
}
