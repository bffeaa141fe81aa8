//! Tree-walking interpreter.
//!
//! An [`Interpreter`] is a short-lived evaluation context over an
//! [`Engine`]: create one per top-level request, run code through it,
//! drop it. All persistent state (modules, builtins, `sys.path`) lives in
//! the engine; the interpreter only tracks the call depth, the frames
//! currently executing and the exceptions being handled.
//!
//! Evaluation is split by concern:
//! - `expr`: expressions and comprehensions
//! - `stmt`: statements, blocks, `try`
//! - `call`: calling values and binding arguments
//! - `access`: attributes, subscripts and slices
//! - `scope_guard`: RAII frame entry that enforces the recursion limit

mod access;
mod call;
mod expr;
mod scope_guard;
mod stmt;

use pyx_ir::{Code, CodeBody};
use tracing::trace;

pub use call::Args;
pub use scope_guard::ScopedInterpreter;

use crate::environment::LocalScope;
use crate::errors::{not_iterable, EvalResult, PyException};
use crate::value::{RangeValue, SharedDict, Value};
use crate::Engine;

/// Outcome of executing a statement.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Flow {
    Normal,
    Break,
    Continue,
    Return(Value),
}

/// Name resolution context of the code being executed.
pub(crate) struct Frame<'f> {
    pub(crate) globals: SharedDict,
    /// `None` at module level, where locals are the globals.
    pub(crate) locals: Option<LocalScope>,
    /// Names declared `global` in the executing function.
    pub(crate) global_names: &'f [String],
    /// Echo the `repr` of expression statements (interactive mode).
    pub(crate) echo: bool,
}

impl Frame<'_> {
    #[allow(dead_code)]
    pub(crate) fn module(globals: SharedDict, echo: bool) -> Frame<'static> {
        Frame {
            globals,
            locals: None,
            global_names: &[],
            echo,
        }
    }
}

/// Evaluation context over an [`Engine`].
pub struct Interpreter<'e> {
    engine: &'e Engine,
    depth: usize,
    /// Exceptions being handled, innermost last; bare `raise` re-raises the top.
    handling: Vec<PyException>,
    /// Globals and locals of the executing frames, innermost last.
    contexts: Vec<(SharedDict, Option<LocalScope>)>,
}

impl<'e> Interpreter<'e> {
    pub fn new(engine: &'e Engine) -> Self {
        Interpreter {
            engine,
            depth: 0,
            handling: Vec::new(),
            contexts: Vec::new(),
        }
    }

    #[inline]
    pub fn engine(&self) -> &'e Engine {
        self.engine
    }

    /// Run compiled code with `globals` as the module namespace.
    ///
    /// Expression code returns its value; statement code returns `None`.
    pub fn run_code(&mut self, code: &Code, globals: &SharedDict) -> EvalResult {
        self.run_code_in(code, globals, None)
    }

    /// Run compiled code with explicit locals (used by `eval`/`exec`
    /// called from inside a function).
    pub fn run_code_in(
        &mut self,
        code: &Code,
        globals: &SharedDict,
        locals: Option<LocalScope>,
    ) -> EvalResult {
        trace!(filename = %code.filename, mode = code.mode.as_str(), "run_code");
        let echo = code.mode == pyx_ir::CompileMode::Single;
        let frame = Frame {
            globals: globals.clone(),
            locals: locals.clone(),
            global_names: &[],
            echo,
        };
        let mut scoped = self.enter_frame(globals.clone(), locals)?;
        match &code.body {
            CodeBody::Expression(expr) => scoped.eval_expr(expr, &frame),
            CodeBody::Statements(body) => match scoped.exec_block(body, &frame)? {
                Flow::Return(value) => Ok(value),
                Flow::Normal | Flow::Break | Flow::Continue => Ok(Value::None),
            },
        }
    }

    /// Globals of the innermost executing frame.
    pub fn current_globals(&self) -> Option<SharedDict> {
        self.contexts.last().map(|(globals, _)| globals.clone())
    }

    /// Locals of the innermost executing frame (`None` at module level).
    pub fn current_locals(&self) -> Option<LocalScope> {
        self.contexts.last().and_then(|(_, locals)| locals.clone())
    }

    /// Iterate over a value. Containers are snapshotted, so the loop body
    /// may mutate the container without holding its lock.
    pub fn iterate(&mut self, value: &Value) -> Result<ValueIter, PyException> {
        let items = match value {
            Value::List(items) => items.read().clone(),
            Value::Tuple(items) => items.to_vec(),
            Value::Str(s) => s.chars().map(|c| Value::str(c.to_string())).collect(),
            Value::Dict(dict) => dict.read().keys(),
            Value::Set(set) => set.read().values(),
            Value::Range(r) => return Ok(ValueIter::range(*r)),
            _ => return Err(not_iterable(value)),
        };
        Ok(ValueIter::Items(items.into_iter()))
    }

    /// Collect an iterable into a vector.
    pub fn collect(&mut self, value: &Value) -> Result<Vec<Value>, PyException> {
        Ok(self.iterate(value)?.collect())
    }
}

/// Iterator over the elements of an iterable value.
pub enum ValueIter {
    Items(std::vec::IntoIter<Value>),
    Range { range: RangeValue, index: usize },
}

impl ValueIter {
    fn range(range: RangeValue) -> Self {
        ValueIter::Range { range, index: 0 }
    }
}

impl Iterator for ValueIter {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        match self {
            ValueIter::Items(items) => items.next(),
            ValueIter::Range { range, index } => {
                let value = range.get(*index)?;
                *index += 1;
                Some(Value::Int(value))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            ValueIter::Items(items) => items.size_hint(),
            ValueIter::Range { range, index } => {
                let remaining = range.len().saturating_sub(*index);
                (remaining, Some(remaining))
            }
        }
    }
}
