//! Runtime values of the engine.
//!
//! `Value` is cheap to clone: scalars are inline, everything else is a
//! [`Heap`] handle. Mutable containers (`list`, `dict`, `set`) sit behind a
//! `parking_lot::RwLock` so values can be shared by every namespace of the
//! process-wide engine. Locks are only ever held for the duration of a
//! single container operation, never across evaluation.

mod composite;
mod dict;
mod heap;

use parking_lot::RwLock;

pub use composite::{
    BoundMethod, BuiltinFunction, FunctionValue, ModuleValue, NativeFn, RangeValue, TypeKind,
};
pub use dict::{DictValue, HashKey, SetValue};
pub use heap::{Heap, Reclaim};

use crate::errors::{ExceptionKind, PyException};
use crate::format;

pub type SharedList = Heap<RwLock<Vec<Value>>>;
pub type SharedDict = Heap<RwLock<DictValue>>;
pub type SharedSet = Heap<RwLock<SetValue>>;

#[derive(Clone, Debug)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Heap<str>),
    List(SharedList),
    Tuple(Heap<Vec<Value>>),
    Dict(SharedDict),
    Set(SharedSet),
    Range(RangeValue),
    Function(Heap<FunctionValue>),
    Builtin(Heap<BuiltinFunction>),
    BoundMethod(Heap<BoundMethod>),
    Module(Heap<ModuleValue>),
    Type(TypeKind),
    ExceptionType(ExceptionKind),
    Exception(Heap<PyException>),
}

// Factory methods

impl Value {
    #[inline]
    pub fn str(s: impl Into<Heap<str>>) -> Value {
        Value::Str(s.into())
    }

    pub fn list(items: Vec<Value>) -> Value {
        Value::List(Heap::new(RwLock::new(items)))
    }

    pub fn tuple(items: Vec<Value>) -> Value {
        Value::Tuple(Heap::new(items))
    }

    pub fn dict(dict: DictValue) -> Value {
        Value::Dict(new_dict(dict))
    }

    pub fn set(set: SetValue) -> Value {
        Value::Set(Heap::new(RwLock::new(set)))
    }

    pub fn exception(exc: PyException) -> Value {
        Value::Exception(Heap::new(exc))
    }

    pub fn function(function: FunctionValue) -> Value {
        Value::Function(Heap::new(function))
    }

    pub fn builtin(name: impl Into<String>, func: NativeFn) -> Value {
        Value::Builtin(Heap::new(BuiltinFunction {
            name: name.into(),
            func,
        }))
    }

    pub fn bound_method(receiver: Value, name: impl Into<String>) -> Value {
        Value::BoundMethod(Heap::new(BoundMethod {
            receiver,
            name: name.into(),
        }))
    }

    pub fn module(name: impl Into<String>, dict: SharedDict) -> Value {
        Value::Module(Heap::new(ModuleValue {
            name: name.into(),
            dict,
        }))
    }
}

/// A fresh shared dict, e.g. for a module namespace.
pub fn new_dict(dict: DictValue) -> SharedDict {
    Heap::new(RwLock::new(dict))
}

// Introspection

impl Value {
    pub fn type_kind(&self) -> TypeKind {
        match self {
            Value::None => TypeKind::NoneType,
            Value::Bool(_) => TypeKind::Bool,
            Value::Int(_) => TypeKind::Int,
            Value::Float(_) => TypeKind::Float,
            Value::Str(_) => TypeKind::Str,
            Value::List(_) => TypeKind::List,
            Value::Tuple(_) => TypeKind::Tuple,
            Value::Dict(_) => TypeKind::Dict,
            Value::Set(_) => TypeKind::Set,
            Value::Range(_) => TypeKind::Range,
            Value::Function(_) => TypeKind::Function,
            Value::Builtin(_) => TypeKind::BuiltinFunction,
            Value::BoundMethod(_) => TypeKind::Method,
            Value::Module(_) => TypeKind::Module,
            Value::Type(_) | Value::ExceptionType(_) => TypeKind::Type,
            // Exceptions report their own class name; see `type_name`.
            Value::Exception(_) => TypeKind::Type,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Exception(exc) => exc.kind.name(),
            other => other.type_kind().name(),
        }
    }

    /// Truth value testing.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(x) => *x != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.read().is_empty(),
            Value::Tuple(items) => !items.is_empty(),
            Value::Dict(dict) => !dict.read().is_empty(),
            Value::Set(set) => !set.read().is_empty(),
            Value::Range(r) => !r.is_empty(),
            _ => true,
        }
    }

    #[inline]
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// Integer view of `int` and `bool`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    /// Float view of any number.
    #[allow(clippy::cast_precision_loss, reason = "int to float promotion")]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(x) => Some(*x),
            Value::Int(n) => Some(*n as f64),
            Value::Bool(b) => Some(f64::from(u8::from(*b))),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Whether the value is callable.
    pub fn is_callable(&self) -> bool {
        matches!(
            self,
            Value::Function(_)
                | Value::Builtin(_)
                | Value::BoundMethod(_)
                | Value::Type(_)
                | Value::ExceptionType(_)
        )
    }

    /// `repr(value)`.
    pub fn repr(&self) -> String {
        format::repr(self)
    }

    /// `str(value)`.
    pub fn to_str(&self) -> String {
        match self {
            Value::Str(s) => s.to_string(),
            Value::Exception(exc) => exc.message.clone(),
            other => other.repr(),
        }
    }

    /// Identity comparison (`is`).
    pub fn is_identical(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => Heap::ptr_eq(a, b) || **a == **b,
            (Value::List(a), Value::List(b)) => Heap::ptr_eq(a, b),
            (Value::Tuple(a), Value::Tuple(b)) => Heap::ptr_eq(a, b),
            (Value::Dict(a), Value::Dict(b)) => Heap::ptr_eq(a, b),
            (Value::Set(a), Value::Set(b)) => Heap::ptr_eq(a, b),
            (Value::Range(a), Value::Range(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Heap::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => Heap::ptr_eq(a, b),
            (Value::BoundMethod(a), Value::BoundMethod(b)) => Heap::ptr_eq(a, b),
            (Value::Module(a), Value::Module(b)) => Heap::ptr_eq(a, b),
            (Value::Type(a), Value::Type(b)) => a == b,
            (Value::ExceptionType(a), Value::ExceptionType(b)) => a == b,
            (Value::Exception(a), Value::Exception(b)) => Heap::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Equality (`==`).
    #[allow(clippy::float_cmp, reason = "language equality is exact")]
    pub fn equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => **a == **b,
            (Value::List(a), Value::List(b)) => {
                if Heap::ptr_eq(a, b) {
                    return true;
                }
                let (a, b) = (a.read().clone(), b.read().clone());
                seq_equals(&a, &b)
            }
            (Value::Tuple(a), Value::Tuple(b)) => seq_equals(a, b),
            (Value::Dict(a), Value::Dict(b)) => {
                if Heap::ptr_eq(a, b) {
                    return true;
                }
                let left = a.read().items();
                let right = b.read().clone();
                left.len() == right.len()
                    && left.iter().all(|(k, v)| {
                        matches!(right.get(k), Ok(Some(other)) if v.equals(&other))
                    })
            }
            (Value::Set(a), Value::Set(b)) => {
                let left = a.read().values();
                let right = b.read().clone();
                left.len() == right.len() && left.iter().all(|v| right.contains(v).unwrap_or(false))
            }
            (Value::Range(a), Value::Range(b)) => a == b,
            (Value::Exception(a), Value::Exception(b)) => Heap::ptr_eq(a, b),
            (a, b) => {
                if let (Some(x), Some(y)) = (a.as_int(), b.as_int()) {
                    return x == y;
                }
                if let (Some(x), Some(y)) = (a.as_float(), b.as_float()) {
                    return x == y;
                }
                a.is_identical(b)
            }
        }
    }
}

fn seq_equals(a: &[Value], b: &[Value]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.equals(y))
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        self.equals(other)
    }
}

#[cfg(test)]
mod tests;
