//! Exceptions raised by the engine.
//!
//! Exceptions are ordinary values: a [`PyException`] carries its
//! [`ExceptionKind`] and message, propagates through `Result`, and can be
//! caught, bound to a name and re-raised by scripts. Factory functions
//! (e.g. [`division_by_zero`]) are the preferred way to build them so the
//! message wording stays in one place.

use std::fmt;

use crate::format::repr_str;
use crate::Value;

/// Result of evaluating an expression.
pub type EvalResult = Result<Value, PyException>;

/// Built-in exception classes.
///
/// The hierarchy is flat under `Exception`, except that `RecursionError`
/// is also a `RuntimeError`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ExceptionKind {
    Exception,
    TypeError,
    ValueError,
    NameError,
    ZeroDivisionError,
    KeyError,
    IndexError,
    AttributeError,
    ImportError,
    RuntimeError,
    SyntaxError,
    OverflowError,
    AssertionError,
    RecursionError,
    StopIteration,
}

impl ExceptionKind {
    pub const ALL: [ExceptionKind; 15] = [
        ExceptionKind::Exception,
        ExceptionKind::TypeError,
        ExceptionKind::ValueError,
        ExceptionKind::NameError,
        ExceptionKind::ZeroDivisionError,
        ExceptionKind::KeyError,
        ExceptionKind::IndexError,
        ExceptionKind::AttributeError,
        ExceptionKind::ImportError,
        ExceptionKind::RuntimeError,
        ExceptionKind::SyntaxError,
        ExceptionKind::OverflowError,
        ExceptionKind::AssertionError,
        ExceptionKind::RecursionError,
        ExceptionKind::StopIteration,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ExceptionKind::Exception => "Exception",
            ExceptionKind::TypeError => "TypeError",
            ExceptionKind::ValueError => "ValueError",
            ExceptionKind::NameError => "NameError",
            ExceptionKind::ZeroDivisionError => "ZeroDivisionError",
            ExceptionKind::KeyError => "KeyError",
            ExceptionKind::IndexError => "IndexError",
            ExceptionKind::AttributeError => "AttributeError",
            ExceptionKind::ImportError => "ImportError",
            ExceptionKind::RuntimeError => "RuntimeError",
            ExceptionKind::SyntaxError => "SyntaxError",
            ExceptionKind::OverflowError => "OverflowError",
            ExceptionKind::AssertionError => "AssertionError",
            ExceptionKind::RecursionError => "RecursionError",
            ExceptionKind::StopIteration => "StopIteration",
        }
    }

    /// Whether an `except base:` clause catches this kind.
    pub fn is_subclass_of(self, base: ExceptionKind) -> bool {
        self == base
            || base == ExceptionKind::Exception
            || (self == ExceptionKind::RecursionError && base == ExceptionKind::RuntimeError)
    }
}

impl fmt::Display for ExceptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A raised exception.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct PyException {
    pub kind: ExceptionKind,
    pub message: String,
}

impl PyException {
    pub fn new(kind: ExceptionKind, message: impl Into<String>) -> Self {
        PyException {
            kind,
            message: message.into(),
        }
    }

    /// `Kind('message')`, or `Kind()` when there is no message.
    pub fn repr(&self) -> String {
        if self.message.is_empty() {
            format!("{}()", self.kind)
        } else {
            format!("{}({})", self.kind, repr_str(&self.message))
        }
    }

    #[inline]
    pub fn is(&self, kind: ExceptionKind) -> bool {
        self.kind.is_subclass_of(kind)
    }
}

// Factories

#[cold]
pub fn type_error(message: impl Into<String>) -> PyException {
    PyException::new(ExceptionKind::TypeError, message)
}

#[cold]
pub fn value_error(message: impl Into<String>) -> PyException {
    PyException::new(ExceptionKind::ValueError, message)
}

#[cold]
pub fn runtime_error(message: impl Into<String>) -> PyException {
    PyException::new(ExceptionKind::RuntimeError, message)
}

#[cold]
pub fn import_error(message: impl Into<String>) -> PyException {
    PyException::new(ExceptionKind::ImportError, message)
}

#[cold]
pub fn undefined_variable(name: &str) -> PyException {
    PyException::new(ExceptionKind::NameError, format!("name '{name}' is not defined"))
}

#[cold]
pub fn division_by_zero() -> PyException {
    PyException::new(ExceptionKind::ZeroDivisionError, "division by zero")
}

#[cold]
pub fn modulo_by_zero() -> PyException {
    PyException::new(
        ExceptionKind::ZeroDivisionError,
        "integer division or modulo by zero",
    )
}

#[cold]
pub fn float_division_by_zero() -> PyException {
    PyException::new(ExceptionKind::ZeroDivisionError, "float division by zero")
}

#[cold]
pub fn integer_overflow(operation: &str) -> PyException {
    PyException::new(
        ExceptionKind::OverflowError,
        format!("integer overflow in {operation}"),
    )
}

#[cold]
pub fn unsupported_operands(op: &str, left: &Value, right: &Value) -> PyException {
    type_error(format!(
        "unsupported operand type(s) for {op}: '{}' and '{}'",
        left.type_name(),
        right.type_name()
    ))
}

#[cold]
pub fn bad_operand_for_unary(op: &str, operand: &Value) -> PyException {
    type_error(format!(
        "bad operand type for unary {op}: '{}'",
        operand.type_name()
    ))
}

#[cold]
pub fn not_comparable(op: &str, left: &Value, right: &Value) -> PyException {
    type_error(format!(
        "'{op}' not supported between instances of '{}' and '{}'",
        left.type_name(),
        right.type_name()
    ))
}

#[cold]
pub fn not_callable(value: &Value) -> PyException {
    type_error(format!("'{}' object is not callable", value.type_name()))
}

#[cold]
pub fn not_iterable(value: &Value) -> PyException {
    type_error(format!("'{}' object is not iterable", value.type_name()))
}

#[cold]
pub fn not_subscriptable(value: &Value) -> PyException {
    type_error(format!("'{}' object is not subscriptable", value.type_name()))
}

#[cold]
pub fn unhashable(value: &Value) -> PyException {
    type_error(format!("unhashable type: '{}'", value.type_name()))
}

#[cold]
pub fn no_attribute(value: &Value, attr: &str) -> PyException {
    let message = match value {
        Value::Module(module) => format!("module '{}' has no attribute '{attr}'", module.name),
        _ => format!("'{}' object has no attribute '{attr}'", value.type_name()),
    };
    PyException::new(ExceptionKind::AttributeError, message)
}

#[cold]
pub fn index_out_of_range(type_name: &str) -> PyException {
    PyException::new(
        ExceptionKind::IndexError,
        format!("{type_name} index out of range"),
    )
}

#[cold]
pub fn key_not_found(key: &Value) -> PyException {
    PyException::new(ExceptionKind::KeyError, key.to_str())
}

#[cold]
pub fn wrong_arg_count(name: &str, expected: &str, got: usize) -> PyException {
    type_error(format!(
        "{name}() takes {expected} argument{} ({got} given)",
        if expected == "1" || expected == "exactly 1" { "" } else { "s" }
    ))
}

#[cold]
pub fn wrong_arg_type(name: &str, expected: &str, got: &Value) -> PyException {
    type_error(format!(
        "{name}() argument must be {expected}, not '{}'",
        got.type_name()
    ))
}

#[cold]
pub fn unexpected_keyword(name: &str, keyword: &str) -> PyException {
    type_error(format!(
        "{name}() got an unexpected keyword argument '{keyword}'"
    ))
}

#[cold]
pub fn recursion_limit() -> PyException {
    PyException::new(
        ExceptionKind::RecursionError,
        "maximum recursion depth exceeded",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repr_quotes_message() {
        assert_eq!(division_by_zero().repr(), "ZeroDivisionError('division by zero')");
        assert_eq!(PyException::new(ExceptionKind::ValueError, "").repr(), "ValueError()");
        assert_eq!(
            PyException::new(ExceptionKind::ValueError, "it's").repr(),
            "ValueError(\"it's\")"
        );
    }

    #[test]
    fn hierarchy() {
        assert!(ExceptionKind::RecursionError.is_subclass_of(ExceptionKind::RuntimeError));
        assert!(ExceptionKind::KeyError.is_subclass_of(ExceptionKind::Exception));
        assert!(!ExceptionKind::KeyError.is_subclass_of(ExceptionKind::IndexError));
    }
}
