//! Running requests against a namespace.
//!
//! Each function here is one invocation mode. It locks the engine through
//! the namespace's [`Session`], runs, marshals the result and releases the
//! lock before returning. Nothing is emitted here: the caller hands the
//! [`Outcome`] (or error) to the reporter.

use std::fmt;
use std::path::Path;

use pyx_eval::{CompileMode, ExceptionKind, PyException, Value};
use tracing::{debug, trace};

use crate::atom::{Atom, AtomBuf};
use crate::error::{BridgeError, Form};
use crate::marshal::{atoms_to_values, from_value, to_json, Conversion};
use crate::namespace::{Namespace, Session};

/// Invocation modes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Mode {
    Evaluate,
    EvaluateToJson,
    Execute,
    ExecuteFile,
    Call,
    Assign,
    Pipe,
    Code,
    Import,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Evaluate => "eval",
            Mode::EvaluateToJson => "eval_to_json",
            Mode::Execute => "exec",
            Mode::ExecuteFile => "execfile",
            Mode::Call => "call",
            Mode::Assign => "assign",
            Mode::Pipe => "pipe",
            Mode::Code => "code",
            Mode::Import => "import",
        })
    }
}

/// Which outlet a successful request fires.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Value(AtomBuf),
    Success,
}

impl Outcome {
    fn from_conversion(conversion: Conversion) -> Self {
        match conversion {
            Conversion::Value(atoms) => Outcome::Value(atoms),
            Conversion::NoValue => Outcome::Success,
        }
    }
}

const PIPE_HELPER: &str = "\
def __pyx_pipe(arg):
    args = arg.split()
    val = eval(args[0])
    for f in args[1:]:
        val = eval(f)(val)
    return val
";

/// Evaluate `text` as an expression and marshal the result.
pub fn evaluate(ns: &Namespace, text: &str) -> Result<Outcome, BridgeError> {
    let session = ns.enter()?;
    trace!(namespace = session.name(), text, "eval");
    let code = session
        .engine()
        .compile(text, session.name(), CompileMode::Eval)
        .map_err(|exc| BridgeError::compile(Form::Expression, &exc))?;
    let mut interp = session.interpreter();
    let value = interp
        .run_code(&code, session.globals())
        .map_err(|exc| BridgeError::runtime(&exc))?;
    let conversion = from_value(&mut interp, session.globals(), &value)?;
    Ok(Outcome::from_conversion(conversion))
}

/// Evaluate `text` as an expression and emit its JSON text as one symbol.
pub fn evaluate_to_json(ns: &Namespace, text: &str) -> Result<Outcome, BridgeError> {
    let session = ns.enter()?;
    trace!(namespace = session.name(), text, "eval_to_json");
    let code = session
        .engine()
        .compile(text, session.name(), CompileMode::Eval)
        .map_err(|exc| BridgeError::compile(Form::Expression, &exc))?;
    let value = session
        .interpreter()
        .run_code(&code, session.globals())
        .map_err(|exc| BridgeError::runtime(&exc))?;
    let json = to_json(&value).map_err(|exc| BridgeError::runtime(&exc))?;
    let mut atoms = AtomBuf::new();
    atoms.push(Atom::Symbol(json));
    Ok(Outcome::Value(atoms))
}

/// Execute `text` as interactive statements.
pub fn execute(ns: &Namespace, text: &str) -> Result<Outcome, BridgeError> {
    let session = ns.enter()?;
    trace!(namespace = session.name(), text, "exec");
    run_statements(&session, text, session.name(), CompileMode::Single)?;
    Ok(Outcome::Success)
}

/// Run the contents of `path` as a module body in the namespace.
pub fn execute_file(ns: &Namespace, path: &Path) -> Result<Outcome, BridgeError> {
    let source = std::fs::read_to_string(path).map_err(|source| BridgeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    execute_source(ns, &source, &path.display().to_string())
}

/// Run `source` as a module body; `filename` names it in diagnostics and
/// becomes `__file__`.
#[tracing::instrument(level = "debug", skip_all, fields(namespace = ns.name(), filename = filename))]
pub fn execute_source(ns: &Namespace, source: &str, filename: &str) -> Result<Outcome, BridgeError> {
    let session = ns.enter()?;
    session
        .globals()
        .write()
        .set_str("__file__", Value::str(filename));
    run_statements(&session, source, filename, CompileMode::Exec)?;
    Ok(Outcome::Success)
}

/// `call <name> args...`: evaluate `name` and call it with the remaining
/// atoms unpacked as arguments. If that raises `TypeError` the call is
/// retried once with all arguments as a single list.
#[tracing::instrument(level = "debug", skip_all, fields(namespace = ns.name(), argc = atoms.len()))]
pub fn call(ns: &Namespace, atoms: &[Atom]) -> Result<Outcome, BridgeError> {
    let name = first_symbol(atoms, "call")?;
    let session = ns.enter()?;
    let code = session
        .engine()
        .compile(name, session.name(), CompileMode::Eval)
        .map_err(|exc| BridgeError::compile(Form::Expression, &exc))?;
    let mut interp = session.interpreter();
    let callee = interp
        .run_code(&code, session.globals())
        .map_err(|exc| BridgeError::runtime(&exc))?;

    let args = atoms_to_values(atoms, 1);
    trace!(namespace = session.name(), name, args = args.len(), "call");
    let result = match interp.call_positional(&callee, args.clone()) {
        Err(exc) if exc.is(ExceptionKind::TypeError) => {
            debug!(name, error = %exc, "retrying call with one list argument");
            interp.call_positional(&callee, vec![Value::list(args)])
        }
        other => other,
    };
    let value = result.map_err(|exc| BridgeError::runtime(&exc))?;
    let conversion = from_value(&mut interp, session.globals(), &value)?;
    Ok(Outcome::from_conversion(conversion))
}

/// `assign <name> args...`: bind the arguments as a list.
pub fn assign(ns: &Namespace, atoms: &[Atom]) -> Result<Outcome, BridgeError> {
    let name = first_symbol(atoms, "assign")?;
    let values = atoms_to_values(atoms, 1);
    if values.len() != atoms.len() - 1 {
        return Err(BridgeError::shape(format!(
            "assign {name}: {} of {} values could not be converted",
            atoms.len() - 1 - values.len(),
            atoms.len() - 1
        )));
    }
    let session = ns.enter()?;
    trace!(namespace = session.name(), name, len = values.len(), "assign");
    session.globals().write().set_str(name, Value::list(values));
    Ok(Outcome::Success)
}

/// `pipe <value> f g ...`: evaluate the first word, then feed it through
/// each following callable left to right.
pub fn pipe(ns: &Namespace, text: &str) -> Result<Outcome, BridgeError> {
    if text.trim().is_empty() {
        return Err(BridgeError::shape("pipe needs at least one expression"));
    }
    let session = ns.enter()?;
    trace!(namespace = session.name(), text, "pipe");
    run_statements(&session, PIPE_HELPER, "<pyx>", CompileMode::Exec)?;
    let helper = session
        .globals()
        .read()
        .get_str("__pyx_pipe")
        .unwrap_or(Value::None);
    let mut interp = session.interpreter();
    let value = interp
        .call_positional(&helper, vec![Value::str(text)])
        .map_err(|exc| BridgeError::runtime(&exc))?;
    let conversion = from_value(&mut interp, session.globals(), &value)?;
    Ok(Outcome::from_conversion(conversion))
}

/// Free text: compiled as an expression when it is one, otherwise run as
/// interactive statements. Only a `SyntaxError` triggers the fallback.
pub fn code(ns: &Namespace, text: &str) -> Result<Outcome, BridgeError> {
    let session = ns.enter()?;
    let engine = session.engine();
    let (code, is_expression) = match engine.compile(text, session.name(), CompileMode::Eval) {
        Ok(code) => (code, true),
        Err(exc) if exc.is(ExceptionKind::SyntaxError) => {
            let code = engine
                .compile(text, session.name(), CompileMode::Single)
                .map_err(|exc| BridgeError::compile(Form::Statement, &exc))?;
            (code, false)
        }
        Err(exc) => return Err(BridgeError::compile(Form::Expression, &exc)),
    };
    trace!(namespace = session.name(), text, is_expression, "code");
    let mut interp = session.interpreter();
    let value = interp
        .run_code(&code, session.globals())
        .map_err(|exc| BridgeError::runtime(&exc))?;
    if !is_expression {
        return Ok(Outcome::Success);
    }
    let conversion = from_value(&mut interp, session.globals(), &value)?;
    Ok(Outcome::from_conversion(conversion))
}

/// `import <module>`: import and bind as an `import` statement would.
pub fn import(ns: &Namespace, module: &str) -> Result<Outcome, BridgeError> {
    let valid = !module.is_empty()
        && module.split('.').all(|part| {
            part.starts_with(|c: char| c.is_alphabetic() || c == '_')
                && part.chars().all(|c| c.is_alphanumeric() || c == '_')
        });
    if !valid {
        return Err(BridgeError::shape(format!("'{module}' is not a module name")));
    }
    let session = ns.enter()?;
    let source = format!("import {module}\n");
    run_statements(&session, &source, session.name(), CompileMode::Exec).map_err(|err| match err {
        BridgeError::Runtime(repr) => BridgeError::Import {
            module: module.to_string(),
            repr,
        },
        other => other,
    })?;
    debug!(namespace = session.name(), module, "imported");
    Ok(Outcome::Success)
}

fn run_statements(
    session: &Session<'_>,
    source: &str,
    filename: &str,
    mode: CompileMode,
) -> Result<Value, BridgeError> {
    let code = session
        .engine()
        .compile(source, filename, mode)
        .map_err(|exc| BridgeError::compile(Form::Statement, &exc))?;
    session
        .interpreter()
        .run_code(&code, session.globals())
        .map_err(|exc: PyException| BridgeError::runtime(&exc))
}

fn first_symbol<'a>(atoms: &'a [Atom], verb: &str) -> Result<&'a str, BridgeError> {
    atoms
        .first()
        .and_then(Atom::as_symbol)
        .ok_or_else(|| BridgeError::shape(format!("{verb}: first atom must be a symbol")))
}

#[cfg(test)]
mod tests;
