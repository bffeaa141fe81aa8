//! Modules implemented in Rust and registered by the embedding host.

use std::fmt;
use std::sync::Arc;

use crate::errors::EvalResult;
use crate::interpreter::{Args, Interpreter};
use crate::value::{new_dict, DictValue, NativeFn, SharedDict, Value};

/// Blueprint of a native module.
///
/// Registered with [`EngineConfig::native_module`](crate::EngineConfig::native_module)
/// and instantiated the first time a script imports it.
///
/// ```ignore
/// let api = NativeModule::new("api")
///     .function("post", |interp, args| { /* ... */ Ok(Value::None) })
///     .constant("VERSION", Value::Int(1));
/// ```
#[derive(Clone)]
pub struct NativeModule {
    name: String,
    functions: Vec<(String, NativeFn)>,
    constants: Vec<(String, Value)>,
}

impl NativeModule {
    pub fn new(name: impl Into<String>) -> Self {
        NativeModule {
            name: name.into(),
            functions: Vec::new(),
            constants: Vec::new(),
        }
    }

    #[must_use]
    pub fn function<F>(mut self, name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&mut Interpreter<'_>, Args) -> EvalResult + Send + Sync + 'static,
    {
        self.functions.push((name.into(), Arc::new(func)));
        self
    }

    #[must_use]
    pub fn constant(mut self, name: impl Into<String>, value: Value) -> Self {
        self.constants.push((name.into(), value));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Build a fresh module namespace from the blueprint.
    pub(crate) fn instantiate(&self) -> SharedDict {
        let mut dict = DictValue::new();
        dict.set_str("__name__", Value::str(self.name.as_str()));
        for (name, func) in &self.functions {
            let qualified = format!("{}.{name}", self.name);
            dict.set_str(name, Value::builtin(qualified, func.clone()));
        }
        for (name, value) in &self.constants {
            dict.set_str(name, value.clone());
        }
        new_dict(dict)
    }
}

impl fmt::Debug for NativeModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeModule")
            .field("name", &self.name)
            .field("functions", &self.functions.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
