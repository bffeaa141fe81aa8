//! Snippet evaluation for unit tests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use pyx_ir::CompileMode;

use crate::errors::PyException;
use crate::print_handler::{buffer_handler, SharedPrintHandler};
use crate::value::{SharedDict, Value};
use crate::{Engine, EngineConfig};

/// An engine whose output is captured in a buffer.
pub(crate) fn engine() -> (Engine, SharedPrintHandler) {
    let output = buffer_handler();
    let engine = Engine::new(EngineConfig::new().print_handler(output.clone()));
    (engine, output)
}

/// Evaluate an expression in a fresh `__main__`.
pub(crate) fn eval(source: &str) -> Value {
    let (engine, _) = engine();
    let globals = engine.add_module("__main__");
    match engine.run_string(source, "<test>", CompileMode::Eval, &globals) {
        Ok(value) => value,
        Err(err) => panic!("{source:?} raised {err}"),
    }
}

/// Evaluate an expression that must raise.
pub(crate) fn eval_err(source: &str) -> PyException {
    let (engine, _) = engine();
    let globals = engine.add_module("__main__");
    match engine.run_string(source, "<test>", CompileMode::Eval, &globals) {
        Ok(value) => panic!("{source:?} returned {value:?}, expected an exception"),
        Err(err) => err,
    }
}

/// Execute statements in a fresh `__main__`, returning the engine, the
/// module globals and everything printed.
pub(crate) fn exec(source: &str) -> (Engine, SharedDict, String) {
    let (engine, output) = engine();
    let globals = engine.add_module("__main__");
    if let Err(err) = engine.run_string(source, "<test>", CompileMode::Exec, &globals) {
        panic!("script raised {err}:\n{source}");
    }
    let printed = output.get_output();
    (engine, globals, printed)
}

/// Execute statements that must raise.
pub(crate) fn exec_err(source: &str) -> PyException {
    let (engine, _) = engine();
    let globals = engine.add_module("__main__");
    engine
        .run_string(source, "<test>", CompileMode::Exec, &globals)
        .expect_err("script should raise")
}

/// Global `name` of a module dict.
pub(crate) fn global(globals: &SharedDict, name: &str) -> Value {
    globals
        .read()
        .get_str(name)
        .unwrap_or_else(|| panic!("global {name:?} is not defined"))
}
