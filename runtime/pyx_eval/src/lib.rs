//! Pyx Eval - tree-walking interpreter for the embedded scripting language.
//!
//! # Architecture
//!
//! - [`Engine`]: process-wide state (builtins, `sys.modules`, `sys.path`,
//!   native modules). One per process is the intended use.
//! - [`Interpreter`]: short-lived evaluation context over an engine.
//! - [`Value`]: runtime values; containers are shared and lock-protected,
//!   so values can cross threads together with the engine.
//! - `operators`, `methods`, `builtins`: enum-dispatched operations on the
//!   fixed set of built-in types.
//! - `modules`: the import system, `math`, `sys` and host-registered
//!   [`NativeModule`]s.
//!
//! # Example
//!
//! ```ignore
//! let engine = Engine::new(EngineConfig::new());
//! let globals = engine.add_module("__main__");
//! let value = engine.run_string("1 + 2", "<string>", CompileMode::Eval, &globals)?;
//! assert_eq!(value, Value::Int(3));
//! ```

mod builtins;
mod engine;
mod environment;
pub mod errors;
mod format;
pub mod interpreter;
mod methods;
mod modules;
pub mod operators;
mod print_handler;
#[cfg(test)]
mod test_helpers;
pub mod value;

pub use engine::{Engine, EngineConfig, DEFAULT_RECURSION_LIMIT};
pub use environment::{LocalScope, Scope};
pub use errors::{EvalResult, ExceptionKind, PyException};
pub use format::{float_repr, repr_str};
pub use interpreter::{Args, Interpreter};
pub use modules::NativeModule;
pub use print_handler::{
    buffer_handler, line_handler, silent_handler, stdout_handler, PrintHandlerImpl,
    SharedPrintHandler,
};
pub use pyx_ir::CompileMode;
pub use value::{DictValue, Heap, SetValue, SharedDict, SharedList, Value};
