//! RAII frame guard for the interpreter.
//!
//! Entering a frame (a module body, a function call, `eval`/`exec`) goes
//! through [`Interpreter::enter_frame`], which checks the recursion limit,
//! bumps the call depth and records the frame's globals and locals. The
//! returned guard derefs to the interpreter and undoes both on drop, on
//! every exit path including `?` early returns.

use std::ops::{Deref, DerefMut};

use super::Interpreter;
use crate::environment::LocalScope;
use crate::errors::{recursion_limit, PyException};
use crate::value::SharedDict;

/// Interpreter inside an entered frame. Leaves the frame when dropped.
pub struct ScopedInterpreter<'guard, 'e> {
    interpreter: &'guard mut Interpreter<'e>,
}

impl Drop for ScopedInterpreter<'_, '_> {
    fn drop(&mut self) {
        self.interpreter.depth = self.interpreter.depth.saturating_sub(1);
        self.interpreter.contexts.pop();
    }
}

impl<'e> Deref for ScopedInterpreter<'_, 'e> {
    type Target = Interpreter<'e>;

    fn deref(&self) -> &Self::Target {
        self.interpreter
    }
}

impl DerefMut for ScopedInterpreter<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.interpreter
    }
}

impl<'e> Interpreter<'e> {
    /// Enter a frame, failing with `RecursionError` past the engine's limit.
    pub fn enter_frame(
        &mut self,
        globals: SharedDict,
        locals: Option<LocalScope>,
    ) -> Result<ScopedInterpreter<'_, 'e>, PyException> {
        if self.depth >= self.engine.recursion_limit() {
            return Err(recursion_limit());
        }
        self.depth += 1;
        self.contexts.push((globals, locals));
        Ok(ScopedInterpreter { interpreter: self })
    }

    /// Current frame depth.
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }
}
