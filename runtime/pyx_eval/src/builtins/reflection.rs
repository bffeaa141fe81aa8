//! Dynamic evaluation and introspection builtins.

use pyx_ir::CompileMode;

use crate::errors::{runtime_error, type_error, wrong_arg_type, EvalResult, ExceptionKind, PyException};
use crate::interpreter::{Args, Interpreter};
use crate::value::{DictValue, Value};

pub(super) fn eval(interp: &mut Interpreter<'_>, args: Args) -> EvalResult {
    run_source(interp, args, "eval", CompileMode::Eval)
}

pub(super) fn exec(interp: &mut Interpreter<'_>, args: Args) -> EvalResult {
    run_source(interp, args, "exec", CompileMode::Exec)?;
    Ok(Value::None)
}

fn run_source(interp: &mut Interpreter<'_>, args: Args, name: &str, mode: CompileMode) -> EvalResult {
    args.expect(name, 1, 2)?;
    let source = &args.positional[0];
    let text = source
        .as_str()
        .ok_or_else(|| type_error(format!("{name}() arg 1 must be a string, not {}", source.type_name())))?;
    let text = if mode == CompileMode::Eval {
        text.trim_start_matches([' ', '\t'])
    } else {
        text
    };
    let code = interp.engine().compile(text, "<string>", mode)?;
    match args.get(1) {
        Some(Value::Dict(globals)) => {
            if globals.read().get_str("__builtins__").is_none() {
                let builtins = Value::Dict(interp.engine().builtins().clone());
                globals.write().set_str("__builtins__", builtins);
            }
            interp.run_code(&code, globals)
        }
        Some(Value::None) | None => {
            let globals = interp
                .current_globals()
                .ok_or_else(|| runtime_error(format!("{name}(): no current frame")))?;
            let locals = interp.current_locals();
            interp.run_code_in(&code, &globals, locals)
        }
        Some(other) => Err(type_error(format!(
            "{name}() globals must be a dict, not {}",
            other.type_name()
        ))),
    }
}

pub(super) fn globals(interp: &mut Interpreter<'_>, args: Args) -> EvalResult {
    args.expect("globals", 0, 0)?;
    interp
        .current_globals()
        .map(Value::Dict)
        .ok_or_else(|| runtime_error("globals(): no current frame"))
}

/// Module level: the globals dict itself. Inside a function: a snapshot
/// of the local bindings.
pub(super) fn locals(interp: &mut Interpreter<'_>, args: Args) -> EvalResult {
    args.expect("locals", 0, 0)?;
    match interp.current_locals() {
        Some(scope) => {
            let mut dict = DictValue::new();
            for (name, value) in scope.bindings() {
                dict.set_str(&name, value);
            }
            Ok(Value::dict(dict))
        }
        None => globals(interp, Args::default()),
    }
}

pub(super) fn getattr(interp: &mut Interpreter<'_>, args: Args) -> EvalResult {
    args.expect("getattr", 2, 3)?;
    let name = attr_name("getattr", &args)?;
    match interp.get_attr(&args.positional[0], name) {
        Err(err) if err.is(ExceptionKind::AttributeError) => match args.get(2) {
            Some(default) => Ok(default.clone()),
            None => Err(err),
        },
        other => other,
    }
}

pub(super) fn hasattr(interp: &mut Interpreter<'_>, args: Args) -> EvalResult {
    args.expect("hasattr", 2, 2)?;
    let name = attr_name("hasattr", &args)?;
    match interp.get_attr(&args.positional[0], name) {
        Ok(_) => Ok(Value::Bool(true)),
        Err(err) if err.is(ExceptionKind::AttributeError) => Ok(Value::Bool(false)),
        Err(err) => Err(err),
    }
}

pub(super) fn setattr(interp: &mut Interpreter<'_>, args: Args) -> EvalResult {
    args.expect("setattr", 3, 3)?;
    let name = attr_name("setattr", &args)?;
    interp.set_attr(&args.positional[0], name, args.positional[2].clone())?;
    Ok(Value::None)
}

fn attr_name<'a>(function: &str, args: &'a Args) -> Result<&'a str, PyException> {
    let name = &args.positional[1];
    name.as_str()
        .ok_or_else(|| wrong_arg_type(function, "str", name))
}

pub(super) fn callable(_: &mut Interpreter<'_>, args: Args) -> EvalResult {
    args.expect("callable", 1, 1)?;
    Ok(Value::Bool(args.positional[0].is_callable()))
}

pub(super) fn isinstance(_: &mut Interpreter<'_>, args: Args) -> EvalResult {
    args.expect("isinstance", 2, 2)?;
    is_instance(&args.positional[0], &args.positional[1]).map(Value::Bool)
}

fn is_instance(value: &Value, class: &Value) -> Result<bool, PyException> {
    match class {
        Value::Type(kind) => Ok(!matches!(value, Value::Exception(_))
            && value.type_kind().is_subtype_of(*kind)),
        Value::ExceptionType(kind) => Ok(matches!(value, Value::Exception(exc) if exc.is(*kind))),
        Value::Tuple(classes) => {
            for class in classes.iter() {
                if is_instance(value, class)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        other => Err(type_error(format!(
            "isinstance() arg 2 must be a type or tuple of types, not {}",
            other.type_name()
        ))),
    }
}
