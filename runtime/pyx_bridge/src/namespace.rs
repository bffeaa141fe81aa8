//! Per-object namespaces.

use std::fmt;
use std::sync::Arc;

use parking_lot::MappedMutexGuard;
use pyx_eval::{Engine, Interpreter, SharedDict};

use crate::error::BridgeError;
use crate::runtime::Runtime;

/// The globals of one script object inside the shared engine.
///
/// Registered in the engine's module table under its name, so other
/// namespaces can `import` it. Released on [`destroy`](Self::destroy) or
/// drop; releasing the last namespace finalizes the engine.
pub struct Namespace {
    runtime: Arc<Runtime>,
    name: String,
    /// `None` when the engine failed to start.
    globals: Option<SharedDict>,
    generation: u64,
    released: bool,
}

impl Namespace {
    pub(crate) fn new(
        runtime: Arc<Runtime>,
        name: String,
        globals: Option<SharedDict>,
        generation: u64,
    ) -> Self {
        Namespace {
            runtime,
            name,
            globals,
            generation,
            released: false,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn runtime(&self) -> &Arc<Runtime> {
        &self.runtime
    }

    /// Engine generation this namespace was created in.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether every request fails because the engine couldn't start.
    #[inline]
    pub fn is_degraded(&self) -> bool {
        self.globals.is_none()
    }

    pub fn globals(&self) -> Option<&SharedDict> {
        self.globals.as_ref()
    }

    /// Lock the engine for one operation on this namespace.
    pub fn enter(&self) -> Result<Session<'_>, BridgeError> {
        let globals = self.globals.as_ref().ok_or(BridgeError::EngineUnavailable)?;
        let engine = self
            .runtime
            .lock_engine()
            .ok_or(BridgeError::EngineUnavailable)?;
        Ok(Session {
            engine,
            globals,
            name: &self.name,
        })
    }

    /// Release the namespace now rather than at drop.
    pub fn destroy(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.runtime.release_namespace(&self.name, self.globals.take());
    }
}

impl Drop for Namespace {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Namespace")
            .field("name", &self.name)
            .field("generation", &self.generation)
            .field("degraded", &self.is_degraded())
            .finish_non_exhaustive()
    }
}

/// The engine lock held for one operation, plus the namespace it targets.
/// Dropping the session releases the lock.
pub struct Session<'a> {
    engine: MappedMutexGuard<'a, Engine>,
    globals: &'a SharedDict,
    name: &'a str,
}

impl<'a> Session<'a> {
    #[inline]
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    #[inline]
    pub fn globals(&self) -> &'a SharedDict {
        self.globals
    }

    #[inline]
    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn interpreter(&self) -> Interpreter<'_> {
        Interpreter::new(&self.engine)
    }
}
