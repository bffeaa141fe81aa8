//! Calling values and binding arguments to parameters.

use tracing::trace;

use super::{Flow, Frame, Interpreter};
use crate::builtins;
use crate::environment::{LocalScope, Scope};
use crate::errors::{not_callable, type_error, unexpected_keyword, wrong_arg_count, EvalResult, PyException};
use crate::methods;
use crate::value::{FunctionValue, Heap, Value};

/// Evaluated call arguments.
#[derive(Clone, Debug, Default)]
pub struct Args {
    pub positional: Vec<Value>,
    pub keywords: Vec<(String, Value)>,
}

impl Args {
    pub fn new(positional: Vec<Value>) -> Self {
        Args {
            positional,
            keywords: Vec::new(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.positional.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.positional.get(index)
    }

    /// Remove and return keyword argument `name`.
    pub fn take_keyword(&mut self, name: &str) -> Option<Value> {
        let index = self.keywords.iter().position(|(k, _)| k == name)?;
        Some(self.keywords.remove(index).1)
    }

    /// Check the positional count is within `min..=max` and that no
    /// keyword arguments are left over.
    pub fn expect(&self, function: &str, min: usize, max: usize) -> Result<(), PyException> {
        if let Some((keyword, _)) = self.keywords.first() {
            return Err(unexpected_keyword(function, keyword));
        }
        let got = self.positional.len();
        if got < min || got > max {
            let expected = if min == max {
                format!("exactly {min}")
            } else if got < min {
                format!("at least {min}")
            } else {
                format!("at most {max}")
            };
            return Err(wrong_arg_count(function, &expected, got));
        }
        Ok(())
    }
}

impl<'e> Interpreter<'e> {
    /// Call `callee` with `args`.
    pub fn call(&mut self, callee: &Value, args: Args) -> EvalResult {
        match callee {
            Value::Function(function) => self.call_function(function, args),
            Value::Builtin(builtin) => {
                trace!(name = %builtin.name, "call builtin");
                (builtin.func)(self, args)
            }
            Value::BoundMethod(method) => {
                methods::call_method(self, &method.receiver, &method.name, args)
            }
            Value::Type(kind) => builtins::construct(self, *kind, args),
            Value::ExceptionType(kind) => {
                args.expect(kind.name(), 0, usize::MAX)?;
                let message = match args.positional.as_slice() {
                    [] => String::new(),
                    [single] => single.to_str(),
                    many => Value::tuple(many.to_vec()).repr(),
                };
                Ok(Value::exception(PyException::new(*kind, message)))
            }
            _ => Err(not_callable(callee)),
        }
    }

    /// Call with positional arguments only.
    pub fn call_positional(&mut self, callee: &Value, positional: Vec<Value>) -> EvalResult {
        self.call(callee, Args::new(positional))
    }

    fn call_function(&mut self, function: &Heap<FunctionValue>, args: Args) -> EvalResult {
        let def = &function.def;
        trace!(name = %def.name, depth = self.depth, "call function");
        let scope = LocalScope::new(Scope::with_parent(function.closure.clone()));
        bind_arguments(function, args, &scope)?;

        let frame = Frame {
            globals: function.globals.clone(),
            locals: Some(scope.clone()),
            global_names: &def.globals,
            echo: false,
        };
        let mut scoped = self.enter_frame(function.globals.clone(), Some(scope))?;
        match scoped.exec_block(&def.body, &frame)? {
            Flow::Return(value) => Ok(value),
            Flow::Normal | Flow::Break | Flow::Continue => Ok(Value::None),
        }
    }
}

/// Bind call arguments to a function's parameters in `scope`.
fn bind_arguments(function: &FunctionValue, args: Args, scope: &LocalScope) -> Result<(), PyException> {
    let def = &function.def;
    let params = &def.params.positional;
    let Args {
        mut positional,
        keywords,
    } = args;

    let given = positional.len();
    let extra = if given > params.len() {
        if def.params.varargs.is_none() {
            return Err(type_error(format!(
                "{}() takes {} positional argument{} but {given} {} given",
                def.name,
                params.len(),
                if params.len() == 1 { "" } else { "s" },
                if given == 1 { "was" } else { "were" },
            )));
        }
        positional.split_off(params.len())
    } else {
        Vec::new()
    };

    let mut bound = vec![false; params.len()];
    for (index, value) in positional.into_iter().enumerate() {
        scope.define(&params[index].name, value);
        bound[index] = true;
    }

    for (name, value) in keywords {
        let Some(index) = params.iter().position(|p| p.name == name) else {
            return Err(unexpected_keyword(&def.name, &name));
        };
        if bound[index] {
            return Err(type_error(format!(
                "{}() got multiple values for argument '{name}'",
                def.name
            )));
        }
        scope.define(&name, value);
        bound[index] = true;
    }

    let first_default = params.len() - function.defaults.len();
    let mut missing = Vec::new();
    for (index, param) in params.iter().enumerate() {
        if bound[index] {
            continue;
        }
        match function.defaults.get(index.wrapping_sub(first_default)) {
            Some(default) if index >= first_default => scope.define(&param.name, default.clone()),
            _ => missing.push(format!("'{}'", param.name)),
        }
    }
    if !missing.is_empty() {
        return Err(type_error(format!(
            "{}() missing {} required positional argument{}: {}",
            def.name,
            missing.len(),
            if missing.len() == 1 { "" } else { "s" },
            missing.join(" and ")
        )));
    }

    if let Some(varargs) = &def.params.varargs {
        scope.define(varargs, Value::tuple(extra));
    }
    Ok(())
}
