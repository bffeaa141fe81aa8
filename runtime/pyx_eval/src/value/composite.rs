//! Compound value payloads: functions, modules, ranges and type objects.

use std::fmt;
use std::sync::Arc;

use pyx_ir::FunctionDef;

use super::SharedDict;
use crate::environment::LocalScope;
use crate::interpreter::{Args, Interpreter};
use crate::EvalResult;

/// Signature of natively implemented callables.
pub type NativeFn = Arc<dyn Fn(&mut Interpreter<'_>, Args) -> EvalResult + Send + Sync>;

/// A function defined by `def` or `lambda`.
pub struct FunctionValue {
    pub def: Arc<FunctionDef>,
    /// Values of the trailing parameters that have defaults, evaluated
    /// once at definition time.
    pub defaults: Vec<super::Value>,
    /// Globals of the defining module.
    pub globals: SharedDict,
    /// Locals of the enclosing function, if any; read through for free names.
    pub closure: Option<LocalScope>,
}

impl fmt::Debug for FunctionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<function {}>", self.def.name)
    }
}

/// A natively implemented function (builtins, `math`, registered modules).
pub struct BuiltinFunction {
    pub name: String,
    pub func: NativeFn,
}

impl fmt::Debug for BuiltinFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<built-in function {}>", self.name)
    }
}

/// A method of a built-in type bound to its receiver (`items.append`).
#[derive(Debug)]
pub struct BoundMethod {
    pub receiver: super::Value,
    pub name: String,
}

/// A module: a name plus its globals dict.
#[derive(Debug)]
pub struct ModuleValue {
    pub name: String,
    pub dict: SharedDict,
}

/// `range(start, stop, step)`; `step` is never zero.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RangeValue {
    pub start: i64,
    pub stop: i64,
    pub step: i64,
}

impl RangeValue {
    pub fn len(&self) -> usize {
        let span = if self.step > 0 {
            i128::from(self.stop) - i128::from(self.start)
        } else {
            i128::from(self.start) - i128::from(self.stop)
        };
        if span <= 0 {
            return 0;
        }
        let step = i128::from(self.step).abs();
        usize::try_from((span + step - 1) / step).unwrap_or(usize::MAX)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element at `index` (already normalized to be non-negative).
    pub fn get(&self, index: usize) -> Option<i64> {
        if index >= self.len() {
            return None;
        }
        let offset = i64::try_from(index).ok()?.checked_mul(self.step)?;
        self.start.checked_add(offset)
    }

    pub fn contains(&self, n: i64) -> bool {
        let in_bounds = if self.step > 0 {
            n >= self.start && n < self.stop
        } else {
            n <= self.start && n > self.stop
        };
        in_bounds && (i128::from(n) - i128::from(self.start)) % i128::from(self.step) == 0
    }
}

/// Built-in type objects.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeKind {
    NoneType,
    Bool,
    Int,
    Float,
    Str,
    List,
    Tuple,
    Dict,
    Set,
    Range,
    Function,
    BuiltinFunction,
    Method,
    Module,
    Type,
}

impl TypeKind {
    pub fn name(self) -> &'static str {
        match self {
            TypeKind::NoneType => "NoneType",
            TypeKind::Bool => "bool",
            TypeKind::Int => "int",
            TypeKind::Float => "float",
            TypeKind::Str => "str",
            TypeKind::List => "list",
            TypeKind::Tuple => "tuple",
            TypeKind::Dict => "dict",
            TypeKind::Set => "set",
            TypeKind::Range => "range",
            TypeKind::Function => "function",
            TypeKind::BuiltinFunction => "builtin_function_or_method",
            TypeKind::Method => "method",
            TypeKind::Module => "module",
            TypeKind::Type => "type",
        }
    }

    /// `isinstance` relation between built-in types.
    pub fn is_subtype_of(self, base: TypeKind) -> bool {
        self == base || (self == TypeKind::Bool && base == TypeKind::Int)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_len_and_get() {
        let r = RangeValue {
            start: 10,
            stop: 0,
            step: -3,
        };
        assert_eq!(r.len(), 4);
        assert_eq!(r.get(3), Some(1));
        assert_eq!(r.get(4), None);
        assert!(r.contains(4));
        assert!(!r.contains(5));
    }

    #[test]
    fn empty_ranges() {
        let r = RangeValue {
            start: 5,
            stop: 5,
            step: 1,
        };
        assert!(r.is_empty());
        let r = RangeValue {
            start: 0,
            stop: 5,
            step: -1,
        };
        assert_eq!(r.len(), 0);
    }
}
