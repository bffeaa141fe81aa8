//! The `sys` module.
//!
//! `sys.path` and `sys.modules` are the engine's own containers, so
//! scripts that edit them steer the import machinery.

use crate::builtins::native;
use crate::errors::EvalResult;
use crate::interpreter::{Args, Interpreter};
use crate::value::{new_dict, DictValue, SharedDict, SharedList, Value};

pub(crate) fn module(path: &SharedList, modules: &SharedDict, prefix: Option<&str>) -> SharedDict {
    let mut dict = DictValue::new();
    dict.set_str("__name__", Value::str("sys"));
    dict.set_str("path", Value::List(path.clone()));
    dict.set_str("modules", Value::Dict(modules.clone()));
    dict.set_str("prefix", prefix.map_or(Value::None, Value::str));
    dict.set_str("version", Value::str(env!("CARGO_PKG_VERSION")));
    dict.set_str("platform", Value::str(std::env::consts::OS));
    dict.set_str("argv", Value::list(vec![Value::str("")]));
    dict.set_str("maxsize", Value::Int(i64::MAX));
    dict.set_str("getrecursionlimit", native("getrecursionlimit", recursion_limit));
    new_dict(dict)
}

fn recursion_limit(interp: &mut Interpreter<'_>, args: Args) -> EvalResult {
    args.expect("getrecursionlimit", 0, 0)?;
    Ok(Value::Int(
        i64::try_from(interp.engine().recursion_limit()).unwrap_or(i64::MAX),
    ))
}
