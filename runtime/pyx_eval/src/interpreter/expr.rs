//! Expression evaluation.

use std::sync::Arc;

use pyx_ir::{Argument, BoolOp, Comprehension, Expr, FunctionDef};
use pyx_stack::ensure_sufficient_stack;

use super::{Args, Frame, Interpreter};
use crate::environment::{LocalScope, Scope};
use crate::errors::{type_error, undefined_variable, EvalResult, PyException};
use crate::operators;
use crate::value::{DictValue, FunctionValue, SetValue, Value};

impl Interpreter<'_> {
    pub(crate) fn eval_expr(&mut self, expr: &Expr, frame: &Frame<'_>) -> EvalResult {
        ensure_sufficient_stack(|| self.eval_expr_inner(expr, frame))
    }

    fn eval_expr_inner(&mut self, expr: &Expr, frame: &Frame<'_>) -> EvalResult {
        match expr {
            Expr::Int(n) => Ok(Value::Int(*n)),
            Expr::Float(x) => Ok(Value::Float(*x)),
            Expr::Str(s) => Ok(Value::str(s.as_str())),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::None => Ok(Value::None),
            Expr::Name(name) => self.load_name(name, frame),
            Expr::List(items) => Ok(Value::list(self.eval_all(items, frame)?)),
            Expr::Tuple(items) => Ok(Value::tuple(self.eval_all(items, frame)?)),
            Expr::Set(items) => {
                let mut set = SetValue::new();
                for item in self.eval_all(items, frame)? {
                    set.insert(item)?;
                }
                Ok(Value::set(set))
            }
            Expr::Dict(entries) => {
                let mut dict = DictValue::new();
                for (key, value) in entries {
                    let key = self.eval_expr(key, frame)?;
                    let value = self.eval_expr(value, frame)?;
                    dict.insert(key, value)?;
                }
                Ok(Value::dict(dict))
            }
            Expr::Unary { op, operand } => {
                let operand = self.eval_expr(operand, frame)?;
                operators::unary(*op, &operand)
            }
            Expr::Binary { op, left, right } => {
                let left = self.eval_expr(left, frame)?;
                let right = self.eval_expr(right, frame)?;
                operators::binary(*op, &left, &right)
            }
            Expr::BoolOp { op, values } => self.eval_bool_op(*op, values, frame),
            Expr::Compare { left, ops } => {
                let mut left = self.eval_expr(left, frame)?;
                for (op, right) in ops {
                    let right = self.eval_expr(right, frame)?;
                    if !operators::compare(*op, &left, &right)? {
                        return Ok(Value::Bool(false));
                    }
                    left = right;
                }
                Ok(Value::Bool(true))
            }
            Expr::Call { func, args } => {
                let callee = self.eval_expr(func, frame)?;
                let args = self.eval_args(args, frame)?;
                self.call(&callee, args)
            }
            Expr::Attribute { value, attr } => {
                let value = self.eval_expr(value, frame)?;
                self.get_attr(&value, attr)
            }
            Expr::Subscript { value, index } => {
                let value = self.eval_expr(value, frame)?;
                if let Expr::Slice { lower, upper, step } = index.as_ref() {
                    let lower = self.eval_optional(lower.as_deref(), frame)?;
                    let upper = self.eval_optional(upper.as_deref(), frame)?;
                    let step = self.eval_optional(step.as_deref(), frame)?;
                    return self.get_slice(&value, &lower, &upper, &step);
                }
                let index = self.eval_expr(index, frame)?;
                self.get_item(&value, &index)
            }
            Expr::Slice { .. } => Err(type_error("slice is only valid inside a subscript")),
            Expr::IfExp { test, body, orelse } => {
                if self.eval_expr(test, frame)?.is_truthy() {
                    self.eval_expr(body, frame)
                } else {
                    self.eval_expr(orelse, frame)
                }
            }
            Expr::Lambda(def) => self.make_function(def, frame),
            Expr::ListComp {
                element,
                generators,
            } => {
                let inner = Frame {
                    globals: frame.globals.clone(),
                    locals: Some(LocalScope::new(Scope::with_parent(frame.locals.clone()))),
                    global_names: &[],
                    echo: false,
                };
                let mut out = Vec::new();
                self.eval_comprehension(element, generators, &inner, &mut out)?;
                Ok(Value::list(out))
            }
        }
    }

    fn eval_all(&mut self, items: &[Expr], frame: &Frame<'_>) -> Result<Vec<Value>, PyException> {
        items.iter().map(|item| self.eval_expr(item, frame)).collect()
    }

    fn eval_optional(&mut self, expr: Option<&Expr>, frame: &Frame<'_>) -> EvalResult {
        match expr {
            Some(expr) => self.eval_expr(expr, frame),
            None => Ok(Value::None),
        }
    }

    /// `and`/`or`: yields the deciding operand itself, not a bool.
    fn eval_bool_op(&mut self, op: BoolOp, values: &[Expr], frame: &Frame<'_>) -> EvalResult {
        let mut last = Value::None;
        for expr in values {
            last = self.eval_expr(expr, frame)?;
            let decided = match op {
                BoolOp::And => !last.is_truthy(),
                BoolOp::Or => last.is_truthy(),
            };
            if decided {
                break;
            }
        }
        Ok(last)
    }

    fn eval_args(&mut self, args: &[Argument], frame: &Frame<'_>) -> Result<Args, PyException> {
        let mut out = Args::default();
        for arg in args {
            match arg {
                Argument::Positional(expr) => out.positional.push(self.eval_expr(expr, frame)?),
                Argument::Starred(expr) => {
                    let value = self.eval_expr(expr, frame)?;
                    let items = self.iterate(&value)?;
                    out.positional.extend(items);
                }
                Argument::Keyword(name, expr) => {
                    let value = self.eval_expr(expr, frame)?;
                    out.keywords.push((name.clone(), value));
                }
            }
        }
        Ok(out)
    }

    fn eval_comprehension(
        &mut self,
        element: &Expr,
        generators: &[Comprehension],
        frame: &Frame<'_>,
        out: &mut Vec<Value>,
    ) -> Result<(), PyException> {
        let Some((first, rest)) = generators.split_first() else {
            out.push(self.eval_expr(element, frame)?);
            return Ok(());
        };
        let iterable = self.eval_expr(&first.iter, frame)?;
        for item in self.iterate(&iterable)? {
            self.assign(&first.target, item, frame)?;
            let mut keep = true;
            for condition in &first.conditions {
                if !self.eval_expr(condition, frame)?.is_truthy() {
                    keep = false;
                    break;
                }
            }
            if keep {
                ensure_sufficient_stack(|| self.eval_comprehension(element, rest, frame, out))?;
            }
        }
        Ok(())
    }

    /// Build a function value; defaults are evaluated now, in `frame`.
    pub(crate) fn make_function(&mut self, def: &Arc<FunctionDef>, frame: &Frame<'_>) -> EvalResult {
        let mut defaults = Vec::new();
        for param in &def.params.positional {
            if let Some(default) = &param.default {
                defaults.push(self.eval_expr(default, frame)?);
            }
        }
        Ok(Value::function(FunctionValue {
            def: Arc::clone(def),
            defaults,
            globals: frame.globals.clone(),
            closure: frame.locals.clone(),
        }))
    }

    pub(crate) fn load_name(&mut self, name: &str, frame: &Frame<'_>) -> EvalResult {
        let is_global = frame.global_names.iter().any(|n| n == name);
        if !is_global {
            if let Some(value) = frame.locals.as_ref().and_then(|locals| locals.lookup(name)) {
                return Ok(value);
            }
        }
        if let Some(value) = frame.globals.read().get_str(name) {
            return Ok(value);
        }
        if let Some(value) = self.engine.builtins().read().get_str(name) {
            return Ok(value);
        }
        Err(undefined_variable(name))
    }
}
