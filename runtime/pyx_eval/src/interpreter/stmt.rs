//! Statement execution.

use pyx_ir::{BinaryOp, ExceptHandler, Expr, ImportName, Stmt, Target};
use pyx_stack::ensure_sufficient_stack;
use tracing::trace;

use super::{Flow, Frame, Interpreter};
use crate::errors::{
    runtime_error, type_error, undefined_variable, value_error, ExceptionKind, PyException,
};
use crate::operators;
use crate::value::Value;

type ExecResult = Result<Flow, PyException>;

impl Interpreter<'_> {
    pub(crate) fn exec_block(&mut self, body: &[Stmt], frame: &Frame<'_>) -> ExecResult {
        for stmt in body {
            let flow = self.exec_stmt(stmt, frame)?;
            if flow != Flow::Normal {
                return Ok(flow);
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_stmt(&mut self, stmt: &Stmt, frame: &Frame<'_>) -> ExecResult {
        ensure_sufficient_stack(|| self.exec_stmt_inner(stmt, frame))
    }

    fn exec_stmt_inner(&mut self, stmt: &Stmt, frame: &Frame<'_>) -> ExecResult {
        match stmt {
            Stmt::Expr(expr) => {
                let value = self.eval_expr(expr, frame)?;
                if frame.echo && !value.is_none() {
                    self.engine.print_handler().println(&value.repr());
                }
            }
            Stmt::Assign { targets, value } => {
                let value = self.eval_expr(value, frame)?;
                for target in targets {
                    self.assign(target, value.clone(), frame)?;
                }
            }
            Stmt::AugAssign { target, op, value } => self.exec_aug_assign(target, *op, value, frame)?,
            Stmt::If { test, body, orelse } => {
                return if self.eval_expr(test, frame)?.is_truthy() {
                    self.exec_block(body, frame)
                } else {
                    self.exec_block(orelse, frame)
                };
            }
            Stmt::While { test, body, orelse } => {
                while self.eval_expr(test, frame)?.is_truthy() {
                    match self.exec_block(body, frame)? {
                        Flow::Break => return Ok(Flow::Normal),
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {}
                    }
                }
                return self.exec_block(orelse, frame);
            }
            Stmt::For {
                target,
                iter,
                body,
                orelse,
            } => {
                let iterable = self.eval_expr(iter, frame)?;
                for item in self.iterate(&iterable)? {
                    self.assign(target, item, frame)?;
                    match self.exec_block(body, frame)? {
                        Flow::Break => return Ok(Flow::Normal),
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {}
                    }
                }
                return self.exec_block(orelse, frame);
            }
            Stmt::Break => return Ok(Flow::Break),
            Stmt::Continue => return Ok(Flow::Continue),
            Stmt::Pass | Stmt::Global(_) => {}
            Stmt::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval_expr(expr, frame)?,
                    None => Value::None,
                };
                return Ok(Flow::Return(value));
            }
            Stmt::FunctionDef(def) => {
                let function = self.make_function(def, frame)?;
                self.store_name(&def.name, function, frame);
            }
            Stmt::Import(names) => self.exec_import(names, frame)?,
            Stmt::ImportFrom { module, names } => self.exec_import_from(module, names, frame)?,
            Stmt::Delete(targets) => {
                for target in targets {
                    self.delete(target, frame)?;
                }
            }
            Stmt::Raise(value) => return Err(self.raise(value.as_ref(), frame)?),
            Stmt::Try {
                body,
                handlers,
                orelse,
                finalbody,
            } => return self.exec_try(body, handlers, orelse, finalbody, frame),
            Stmt::Assert { test, msg } => {
                if !self.eval_expr(test, frame)?.is_truthy() {
                    let message = match msg {
                        Some(expr) => self.eval_expr(expr, frame)?.to_str(),
                        None => String::new(),
                    };
                    return Err(PyException::new(ExceptionKind::AssertionError, message));
                }
            }
        }
        Ok(Flow::Normal)
    }

    /// Bind `value` to an assignment target.
    pub(crate) fn assign(
        &mut self,
        target: &Target,
        value: Value,
        frame: &Frame<'_>,
    ) -> Result<(), PyException> {
        match target {
            Target::Name(name) => {
                self.store_name(name, value, frame);
                Ok(())
            }
            Target::Unpack(targets) => {
                let items = self.collect(&value)?;
                if items.len() < targets.len() {
                    return Err(value_error(format!(
                        "not enough values to unpack (expected {}, got {})",
                        targets.len(),
                        items.len()
                    )));
                }
                if items.len() > targets.len() {
                    return Err(value_error(format!(
                        "too many values to unpack (expected {})",
                        targets.len()
                    )));
                }
                for (target, item) in targets.iter().zip(items) {
                    self.assign(target, item, frame)?;
                }
                Ok(())
            }
            Target::Subscript { value: object, index } => {
                let object = self.eval_expr(object, frame)?;
                let index = self.eval_expr(index, frame)?;
                self.set_item(&object, index, value)
            }
            Target::Attribute { value: object, attr } => {
                let object = self.eval_expr(object, frame)?;
                self.set_attr(&object, attr, value)
            }
        }
    }

    pub(crate) fn store_name(&mut self, name: &str, value: Value, frame: &Frame<'_>) {
        let is_global = frame.global_names.iter().any(|n| n == name);
        match &frame.locals {
            Some(locals) if !is_global => locals.define(name, value),
            _ => frame.globals.write().set_str(name, value),
        }
    }

    fn delete(&mut self, target: &Target, frame: &Frame<'_>) -> Result<(), PyException> {
        match target {
            Target::Name(name) => {
                let is_global = frame.global_names.iter().any(|n| n == name);
                let removed = match &frame.locals {
                    Some(locals) if !is_global => locals.remove(name),
                    _ => frame.globals.write().remove_str(name).is_some(),
                };
                if removed {
                    Ok(())
                } else {
                    Err(undefined_variable(name))
                }
            }
            Target::Unpack(targets) => {
                for target in targets {
                    self.delete(target, frame)?;
                }
                Ok(())
            }
            Target::Subscript { value, index } => {
                let object = self.eval_expr(value, frame)?;
                let index = self.eval_expr(index, frame)?;
                self.del_item(&object, &index)
            }
            Target::Attribute { value, attr } => {
                let object = self.eval_expr(value, frame)?;
                self.del_attr(&object, attr)
            }
        }
    }

    fn exec_aug_assign(
        &mut self,
        target: &Target,
        op: BinaryOp,
        value: &Expr,
        frame: &Frame<'_>,
    ) -> Result<(), PyException> {
        match target {
            Target::Name(name) => {
                let current = self.load_name(name, frame)?;
                let rhs = self.eval_expr(value, frame)?;
                let updated = self.inplace(op, current, &rhs)?;
                self.store_name(name, updated, frame);
            }
            Target::Subscript { value: object, index } => {
                let object = self.eval_expr(object, frame)?;
                let index = self.eval_expr(index, frame)?;
                let current = self.get_item(&object, &index)?;
                let rhs = self.eval_expr(value, frame)?;
                let updated = self.inplace(op, current, &rhs)?;
                self.set_item(&object, index, updated)?;
            }
            Target::Attribute { value: object, attr } => {
                let object = self.eval_expr(object, frame)?;
                let current = self.get_attr(&object, attr)?;
                let rhs = self.eval_expr(value, frame)?;
                let updated = self.inplace(op, current, &rhs)?;
                self.set_attr(&object, attr, updated)?;
            }
            Target::Unpack(_) => {
                return Err(type_error("illegal expression for augmented assignment"));
            }
        }
        Ok(())
    }

    /// `+=` on a list extends it in place; everything else rebinds.
    fn inplace(&mut self, op: BinaryOp, current: Value, rhs: &Value) -> Result<Value, PyException> {
        if let (BinaryOp::Add, Value::List(items)) = (op, &current) {
            let extra = self.collect(rhs)?;
            items.write().extend(extra);
            return Ok(current);
        }
        operators::binary(op, &current, rhs)
    }

    /// Build the exception a `raise` statement throws.
    fn raise(&mut self, value: Option<&Expr>, frame: &Frame<'_>) -> Result<PyException, PyException> {
        let Some(expr) = value else {
            return self
                .handling
                .last()
                .cloned()
                .ok_or_else(|| runtime_error("No active exception to reraise"));
        };
        match self.eval_expr(expr, frame)? {
            Value::Exception(exc) => Ok((*exc).clone()),
            Value::ExceptionType(kind) => Ok(PyException::new(kind, "")),
            _ => Err(type_error("exceptions must derive from BaseException")),
        }
    }

    fn exec_try(
        &mut self,
        body: &[Stmt],
        handlers: &[ExceptHandler],
        orelse: &[Stmt],
        finalbody: &[Stmt],
        frame: &Frame<'_>,
    ) -> ExecResult {
        let result = match self.exec_block(body, frame) {
            Ok(Flow::Normal) => self.exec_block(orelse, frame),
            Ok(flow) => Ok(flow),
            Err(exc) => self.handle_exception(exc, handlers, frame),
        };
        if !finalbody.is_empty() {
            let flow = self.exec_block(finalbody, frame)?;
            if flow != Flow::Normal {
                return Ok(flow);
            }
        }
        result
    }

    fn handle_exception(
        &mut self,
        exc: PyException,
        handlers: &[ExceptHandler],
        frame: &Frame<'_>,
    ) -> ExecResult {
        for handler in handlers {
            let matches = match &handler.kind {
                None => true,
                Some(expr) => {
                    let class = self.eval_expr(expr, frame)?;
                    exception_matches(&exc, &class)?
                }
            };
            if !matches {
                continue;
            }
            trace!(kind = %exc.kind, "exception handled");
            if let Some(name) = &handler.name {
                self.store_name(name, Value::exception(exc.clone()), frame);
            }
            self.handling.push(exc);
            let result = self.exec_block(&handler.body, frame);
            self.handling.pop();
            return result;
        }
        Err(exc)
    }

    fn exec_import(&mut self, names: &[ImportName], frame: &Frame<'_>) -> Result<(), PyException> {
        for ImportName { module, alias } in names {
            let imported = self.import_module(module)?;
            match alias {
                Some(alias) => self.store_name(alias, imported, frame),
                None => {
                    let top = module.split('.').next().unwrap_or(module);
                    let top_module = self.import_module(top)?;
                    self.store_name(top, top_module, frame);
                }
            }
        }
        Ok(())
    }

    fn exec_import_from(
        &mut self,
        module: &str,
        names: &[(String, Option<String>)],
        frame: &Frame<'_>,
    ) -> Result<(), PyException> {
        let imported = self.import_module(module)?;
        for (name, alias) in names {
            if name == "*" {
                if let Value::Module(m) = &imported {
                    let items = m.dict.read().items();
                    for (key, value) in items {
                        if let Some(key) = key.as_str().filter(|k| !k.starts_with('_')) {
                            self.store_name(key, value, frame);
                        }
                    }
                }
                continue;
            }
            let value = self.import_from(&imported, module, name)?;
            self.store_name(alias.as_deref().unwrap_or(name), value, frame);
        }
        Ok(())
    }
}

fn exception_matches(exc: &PyException, class: &Value) -> Result<bool, PyException> {
    match class {
        Value::ExceptionType(kind) => Ok(exc.is(*kind)),
        Value::Tuple(classes) => {
            for class in classes.iter() {
                if exception_matches(exc, class)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        _ => Err(type_error(
            "catching classes that do not inherit from BaseException is not allowed",
        )),
    }
}
