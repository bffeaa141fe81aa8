//! Bridge failures.
//!
//! Every operation a host object performs ends in one [`BridgeError`] or a
//! success; the reporter turns the error into a console diagnostic and a
//! bang on the failure outlet.

use std::fmt;
use std::io;
use std::path::PathBuf;

use pyx_eval::PyException;
use thiserror::Error;

use crate::host::DispatchError;
use crate::runtime::EngineInitError;

/// A value that has no atom representation.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConversionError {
    #[error("cannot convert '{0}' to atoms")]
    Unsupported(String),
    #[error("empty sequence has no atoms")]
    EmptySequence,
    /// Flattening a dict inside the engine raised.
    #[error("dict flattening failed: {}", .0.repr())]
    Flatten(PyException),
}

/// Which compile attempt failed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Form {
    Expression,
    Statement,
}

impl fmt::Display for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Form::Expression => "expression",
            Form::Statement => "statement",
        })
    }
}

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Conversion(#[from] ConversionError),
    #[error("{form} compile failed: {repr}")]
    Compile { form: Form, repr: String },
    /// An exception escaped the script; holds its `repr`.
    #[error("{0}")]
    Runtime(String),
    #[error("import {module} failed: {repr}")]
    Import { module: String, repr: String },
    #[error("{0}")]
    PathResolution(String),
    #[error("{0}")]
    ArgumentShape(String),
    #[error("no object named '{0}' in the registry")]
    RegistryLookup(String),
    #[error("send to '{target}' failed: {source}")]
    Dispatch {
        target: String,
        #[source]
        source: DispatchError,
    },
    #[error(transparent)]
    EngineInit(#[from] EngineInitError),
    #[error("engine unavailable: start-up failed")]
    EngineUnavailable,
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl BridgeError {
    /// Wrap an exception raised while running code.
    #[cold]
    pub fn runtime(exc: &PyException) -> Self {
        BridgeError::Runtime(exc.repr())
    }

    /// Wrap a failed compile.
    #[cold]
    pub fn compile(form: Form, exc: &PyException) -> Self {
        BridgeError::Compile {
            form,
            repr: exc.repr(),
        }
    }

    #[cold]
    pub fn shape(message: impl Into<String>) -> Self {
        BridgeError::ArgumentShape(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyx_eval::ExceptionKind;

    #[test]
    fn messages_carry_exception_repr() {
        let exc = PyException::new(ExceptionKind::ZeroDivisionError, "division by zero");
        assert_eq!(
            BridgeError::runtime(&exc).to_string(),
            "ZeroDivisionError('division by zero')"
        );
        let syntax = PyException::new(ExceptionKind::SyntaxError, "invalid syntax (x, line 1)");
        assert_eq!(
            BridgeError::compile(Form::Statement, &syntax).to_string(),
            "statement compile failed: SyntaxError('invalid syntax (x, line 1)')"
        );
    }

    #[test]
    fn conversion_errors_name_the_type() {
        let err = BridgeError::from(ConversionError::Unsupported("function".into()));
        assert_eq!(err.to_string(), "cannot convert 'function' to atoms");
    }
}
