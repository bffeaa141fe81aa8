//! Hashed containers: `dict` and `set`.
//!
//! Entries are kept in insertion order. Keys are stored twice: once as a
//! [`HashKey`] for lookup and once as the original [`Value`] so iteration
//! returns the key the script inserted (`1` stays `1`, `True` stays `True`).

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

use super::{Heap, Value};
use crate::errors::{unhashable, PyException};

/// Hashable projection of a value.
///
/// Numbers that compare equal share a key (`1`, `1.0` and `True`).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum HashKey {
    None,
    Int(i64),
    Float(u64),
    Str(String),
    Tuple(Vec<HashKey>),
    /// Types and exception classes, by name.
    Class(&'static str),
    /// Functions, modules and other identity-compared values.
    Identity(usize),
}

impl HashKey {
    /// Key for `value`, or `TypeError` for mutable containers.
    pub fn of(value: &Value) -> Result<HashKey, PyException> {
        let key = match value {
            Value::None => HashKey::None,
            Value::Bool(b) => HashKey::Int(i64::from(*b)),
            Value::Int(n) => HashKey::Int(*n),
            Value::Float(x) => float_key(*x),
            Value::Str(s) => HashKey::Str(s.to_string()),
            Value::Tuple(items) => HashKey::Tuple(
                items
                    .iter()
                    .map(HashKey::of)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            Value::Range(r) => HashKey::Tuple(vec![
                HashKey::Class("range"),
                HashKey::Int(r.start),
                HashKey::Int(r.stop),
                HashKey::Int(r.step),
            ]),
            Value::Type(kind) => HashKey::Class(kind.name()),
            Value::ExceptionType(kind) => HashKey::Class(kind.name()),
            Value::Function(f) => HashKey::Identity(Heap::addr(f)),
            Value::Builtin(f) => HashKey::Identity(Heap::addr(f)),
            Value::BoundMethod(m) => HashKey::Identity(Heap::addr(m)),
            Value::Module(m) => HashKey::Identity(Heap::addr(m)),
            Value::Exception(e) => HashKey::Identity(Heap::addr(e)),
            Value::List(_) | Value::Dict(_) | Value::Set(_) => return Err(unhashable(value)),
        };
        Ok(key)
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::float_cmp,
    reason = "integral floats hash like the equal integer"
)]
fn float_key(x: f64) -> HashKey {
    if x.fract() == 0.0 && x >= i64::MIN as f64 && x < i64::MAX as f64 {
        HashKey::Int(x as i64)
    } else {
        HashKey::Float(x.to_bits())
    }
}

type Entries<V> = IndexMap<HashKey, V, FxBuildHasher>;

/// Contents of a `dict`.
#[derive(Clone, Debug, Default)]
pub struct DictValue {
    entries: Entries<(Value, Value)>,
}

impl DictValue {
    pub fn new() -> Self {
        DictValue::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &Value) -> Result<Option<Value>, PyException> {
        let hk = HashKey::of(key)?;
        Ok(self.entries.get(&hk).map(|(_, v)| v.clone()))
    }

    pub fn contains(&self, key: &Value) -> Result<bool, PyException> {
        Ok(self.entries.contains_key(&HashKey::of(key)?))
    }

    pub fn insert(&mut self, key: Value, value: Value) -> Result<(), PyException> {
        let hk = HashKey::of(&key)?;
        match self.entries.get_mut(&hk) {
            // An existing key keeps its original spelling.
            Some(slot) => slot.1 = value,
            None => {
                self.entries.insert(hk, (key, value));
            }
        }
        Ok(())
    }

    pub fn remove(&mut self, key: &Value) -> Result<Option<Value>, PyException> {
        let hk = HashKey::of(key)?;
        Ok(self.entries.shift_remove(&hk).map(|(_, v)| v))
    }

    /// Lookup by string key; the common case for namespaces.
    pub fn get_str(&self, name: &str) -> Option<Value> {
        self.entries
            .get(&HashKey::Str(name.to_string()))
            .map(|(_, v)| v.clone())
    }

    pub fn set_str(&mut self, name: &str, value: Value) {
        let hk = HashKey::Str(name.to_string());
        match self.entries.get_mut(&hk) {
            Some(slot) => slot.1 = value,
            None => {
                self.entries.insert(hk, (Value::str(name), value));
            }
        }
    }

    pub fn remove_str(&mut self, name: &str) -> Option<Value> {
        self.entries
            .shift_remove(&HashKey::Str(name.to_string()))
            .map(|(_, v)| v)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn keys(&self) -> Vec<Value> {
        self.entries.values().map(|(k, _)| k.clone()).collect()
    }

    pub fn values(&self) -> Vec<Value> {
        self.entries.values().map(|(_, v)| v.clone()).collect()
    }

    pub fn items(&self) -> Vec<(Value, Value)> {
        self.entries.values().cloned().collect()
    }

    /// Remove and return the most recently inserted entry.
    pub fn pop_last(&mut self) -> Option<(Value, Value)> {
        self.entries.pop().map(|(_, entry)| entry)
    }

    /// Empty the dict, moving keys and values into `out`.
    pub(crate) fn drain_into(&mut self, out: &mut Vec<Value>) {
        for (_, (key, value)) in self.entries.drain(..) {
            out.push(key);
            out.push(value);
        }
    }
}

/// Contents of a `set`.
#[derive(Clone, Debug, Default)]
pub struct SetValue {
    entries: Entries<Value>,
}

impl SetValue {
    pub fn new() -> Self {
        SetValue::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, value: &Value) -> Result<bool, PyException> {
        Ok(self.entries.contains_key(&HashKey::of(value)?))
    }

    /// Insert `value`; returns whether it was new.
    pub fn insert(&mut self, value: Value) -> Result<bool, PyException> {
        let hk = HashKey::of(&value)?;
        if self.entries.contains_key(&hk) {
            return Ok(false);
        }
        self.entries.insert(hk, value);
        Ok(true)
    }

    pub fn remove(&mut self, value: &Value) -> Result<bool, PyException> {
        let hk = HashKey::of(value)?;
        Ok(self.entries.shift_remove(&hk).is_some())
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn pop(&mut self) -> Option<Value> {
        self.entries.pop().map(|(_, v)| v)
    }

    pub fn values(&self) -> Vec<Value> {
        self.entries.values().cloned().collect()
    }

    pub(crate) fn drain_into(&mut self, out: &mut Vec<Value>) {
        out.extend(self.entries.drain(..).map(|(_, value)| value));
    }
}
