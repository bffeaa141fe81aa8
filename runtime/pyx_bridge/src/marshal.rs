//! Conversion between atoms and engine values.
//!
//! Inbound, atoms become scalars (`int`, `float`, `str`) or a `list` of
//! them. Outbound, scalars become one atom, sequences become one message
//! and dicts are flattened to `key : value...` runs by a helper that runs
//! inside the engine, in the caller's namespace. [`to_json`] renders a
//! whole value as one JSON symbol instead.

mod json;

pub use json::{to_json, MAX_JSON_DEPTH};

use pyx_eval::{CompileMode, Interpreter, SharedDict, Value};
use tracing::warn;

use crate::atom::{Atom, AtomBuf};
use crate::error::ConversionError;

/// Outcome of converting a value for output.
#[derive(Clone, Debug, PartialEq)]
pub enum Conversion {
    /// Emit these atoms on the value outlet.
    Value(AtomBuf),
    /// The value was `None`: nothing to emit.
    NoValue,
}

const OUT_DICT_HELPER: &str = "\
def __pyx_out_dict(arg):
    res = []
    for k, v in arg.items():
        res.append(k)
        res.append(':')
        if type(v) in [list, set, tuple]:
            for i in v:
                res.append(i)
        else:
            res.append(v)
    return res
";

/// Convert one atom. `Nothing` maps to `None`.
pub fn to_value(atom: &Atom) -> Result<Value, ConversionError> {
    Ok(match atom {
        Atom::Int(n) => Value::Int(*n),
        Atom::Float(x) => Value::Float(*x),
        Atom::Symbol(s) => Value::str(s.as_str()),
        Atom::Nothing => Value::None,
    })
}

/// Convert `atoms[start..]`, skipping atoms that have no value.
pub(crate) fn atoms_to_values(atoms: &[Atom], start: usize) -> Vec<Value> {
    let mut values = Vec::with_capacity(atoms.len().saturating_sub(start));
    for (index, atom) in atoms.iter().enumerate().skip(start) {
        match atom {
            Atom::Nothing => warn!(index, "skipping atom of unknown type"),
            atom => values.push(to_value(atom).unwrap_or(Value::None)),
        }
    }
    values
}

/// Convert `atoms[start..]` into a list value.
pub fn atoms_to_list(atoms: &[Atom], start: usize) -> Value {
    Value::list(atoms_to_values(atoms, start))
}

/// Convert a result value into atoms for the value outlet.
///
/// `globals` is the namespace dict flattening runs in.
pub fn from_value(
    interp: &mut Interpreter<'_>,
    globals: &SharedDict,
    value: &Value,
) -> Result<Conversion, ConversionError> {
    let atom = match value {
        Value::None => return Ok(Conversion::NoValue),
        Value::Bool(b) => Atom::Int(i64::from(*b)),
        Value::Int(n) => Atom::Int(*n),
        Value::Float(x) => Atom::Float(*x),
        Value::Str(s) => Atom::symbol(&**s),
        Value::List(items) => {
            let items = items.read().clone();
            return sequence(&items).map(Conversion::Value);
        }
        Value::Tuple(items) => return sequence(items).map(Conversion::Value),
        Value::Range(range) => {
            if range.is_empty() {
                return Err(ConversionError::EmptySequence);
            }
            let atoms = (0..range.len())
                .filter_map(|index| range.get(index))
                .map(Atom::Int)
                .collect();
            return Ok(Conversion::Value(atoms));
        }
        Value::Dict(_) => {
            let flat = flatten_dict(interp, globals, value)?;
            return from_value(interp, globals, &flat);
        }
        other => return Err(ConversionError::Unsupported(other.type_name().to_string())),
    };
    let mut atoms = AtomBuf::new();
    atoms.push(atom);
    Ok(Conversion::Value(atoms))
}

/// Elements of a sequence as one message. Elements without an atom form
/// (nested containers, `None`, functions) are dropped with a warning.
fn sequence(items: &[Value]) -> Result<AtomBuf, ConversionError> {
    let mut atoms = AtomBuf::new();
    for (index, item) in items.iter().enumerate() {
        match item {
            Value::Bool(b) => atoms.push(Atom::Int(i64::from(*b))),
            Value::Int(n) => atoms.push(Atom::Int(*n)),
            Value::Float(x) => atoms.push(Atom::Float(*x)),
            Value::Str(s) => atoms.push(Atom::symbol(&**s)),
            other => warn!(index, type_name = other.type_name(), "dropping sequence element"),
        }
    }
    if atoms.is_empty() {
        return Err(ConversionError::EmptySequence);
    }
    Ok(atoms)
}

fn flatten_dict(
    interp: &mut Interpreter<'_>,
    globals: &SharedDict,
    dict: &Value,
) -> Result<Value, ConversionError> {
    let code = interp
        .engine()
        .compile(OUT_DICT_HELPER, "<pyx>", CompileMode::Exec)
        .map_err(ConversionError::Flatten)?;
    interp.run_code(&code, globals).map_err(ConversionError::Flatten)?;
    let helper = globals
        .read()
        .get_str("__pyx_out_dict")
        .unwrap_or(Value::None);
    interp
        .call_positional(&helper, vec![dict.clone()])
        .map_err(ConversionError::Flatten)
}

#[cfg(test)]
mod tests;
