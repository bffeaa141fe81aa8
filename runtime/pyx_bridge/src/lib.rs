//! Pyx Bridge - embeds the pyx engine in a message-passing host.
//!
//! # Architecture
//!
//! - [`Runtime`]: the process-wide engine, started by the first live
//!   [`Namespace`] and finalized when the last one is released.
//! - [`ScriptObject`]: one host object; owns a namespace and answers host
//!   messages (`eval`, `exec`, `call`, `send`, ...).
//! - `exec`: the invocation modes, each a short critical section on the
//!   engine lock.
//! - `marshal`: atoms in, atoms out.
//! - `report`: one outlet event per request, diagnostics to the console.
//! - `registry`: name → object table for `send`.
//! - `host`: the traits a host implements.
//!
//! # Example
//!
//! ```ignore
//! let runtime = Runtime::new(RuntimeConfig::new());
//! let object = ScriptObject::new(&runtime, host, ObjectConfig::new());
//! object.handle("eval", &parse_atoms("2 ** 10"));  // value outlet: 1024
//! ```

mod atom;
mod config;
mod error;
pub mod exec;
pub mod host;
pub mod marshal;
mod namespace;
mod object;
mod registry;
mod report;
mod runtime;

pub use atom::{atoms_to_text, parse_atoms, Atom, AtomBuf, INLINE_ATOMS};
pub use config::{ConfigError, ObjectConfig};
pub use error::{BridgeError, ConversionError, Form};
pub use exec::{Mode, Outcome};
pub use host::{
    Console, DispatchError, FileLocator, HomeLocator, Host, MessageReceiver, Outlets,
    PatcherGraph, Scheduler,
};
pub use marshal::Conversion;
pub use namespace::{Namespace, Session};
pub use object::ScriptObject;
pub use registry::Registry;
pub use report::{truncate, Reporter, MAX_DIAGNOSTIC_CHARS};
pub use runtime::{EngineInitError, Runtime, RuntimeConfig, MAIN_NAME, OBJ_NAME_VAR};
