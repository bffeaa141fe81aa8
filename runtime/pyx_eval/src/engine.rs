//! The engine: process-wide interpreter state.
//!
//! An [`Engine`] owns the `builtins` namespace, the module table
//! (`sys.modules`), `sys.path` and the registered native modules. Module
//! namespaces are plain shared dicts handed out by [`Engine::add_module`];
//! code runs against one of them through a short-lived
//! [`Interpreter`].

use std::path::PathBuf;

use pyx_ir::{Code, CompileMode};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::builtins;
use crate::errors::{EvalResult, ExceptionKind, PyException};
use crate::interpreter::{Args, Interpreter};
use crate::modules::{sys, NativeModule};
use crate::print_handler::{stdout_handler, SharedPrintHandler};
use crate::value::{new_dict, DictValue, Heap, SharedDict, SharedList, Value};

/// Default maximum call depth.
pub const DEFAULT_RECURSION_LIMIT: usize = 1000;

/// Builder for [`Engine`].
#[derive(Debug)]
pub struct EngineConfig {
    prefix: Option<PathBuf>,
    recursion_limit: usize,
    print_handler: Option<SharedPrintHandler>,
    native_modules: Vec<NativeModule>,
    search_paths: Vec<PathBuf>,
}

impl EngineConfig {
    pub fn new() -> Self {
        EngineConfig {
            prefix: None,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            print_handler: None,
            native_modules: Vec::new(),
            search_paths: Vec::new(),
        }
    }

    /// Installation prefix, exposed as `sys.prefix`.
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<PathBuf>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    #[must_use]
    pub fn recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = limit;
        self
    }

    /// Where `print()` output goes. Defaults to stdout.
    #[must_use]
    pub fn print_handler(mut self, handler: SharedPrintHandler) -> Self {
        self.print_handler = Some(handler);
        self
    }

    /// Make a native module importable by name.
    #[must_use]
    pub fn native_module(mut self, module: NativeModule) -> Self {
        self.native_modules.push(module);
        self
    }

    /// Append a directory to the initial `sys.path`.
    #[must_use]
    pub fn search_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_paths.push(dir.into());
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Interpreter state shared by every module namespace.
pub struct Engine {
    builtins: SharedDict,
    modules: SharedDict,
    sys_path: SharedList,
    native_modules: FxHashMap<String, NativeModule>,
    print_handler: SharedPrintHandler,
    recursion_limit: usize,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let mut builtins = DictValue::new();
        builtins::install(&mut builtins);
        let builtins = new_dict(builtins);

        let path: Vec<Value> = config
            .search_paths
            .iter()
            .map(|dir| Value::str(dir.display().to_string()))
            .collect();
        let sys_path = Heap::new(parking_lot::RwLock::new(path));
        let modules = new_dict(DictValue::new());

        let prefix = config.prefix.as_ref().map(|p| p.display().to_string());
        let sys_dict = sys::module(&sys_path, &modules, prefix.as_deref());
        {
            let mut table = modules.write();
            table.set_str("sys", Value::module("sys", sys_dict));
            table.set_str("builtins", Value::module("builtins", builtins.clone()));
        }

        let native_modules = config
            .native_modules
            .into_iter()
            .map(|module| (module.name().to_string(), module))
            .collect();

        debug!(
            prefix = ?config.prefix,
            recursion_limit = config.recursion_limit,
            "engine initialized"
        );
        Engine {
            builtins,
            modules,
            sys_path,
            native_modules,
            print_handler: config.print_handler.unwrap_or_else(stdout_handler),
            recursion_limit: config.recursion_limit,
        }
    }

    #[inline]
    pub fn builtins(&self) -> &SharedDict {
        &self.builtins
    }

    /// `sys.modules`.
    #[inline]
    pub fn modules(&self) -> &SharedDict {
        &self.modules
    }

    /// `sys.path`.
    #[inline]
    pub fn sys_path(&self) -> &SharedList {
        &self.sys_path
    }

    #[inline]
    pub fn print_handler(&self) -> &SharedPrintHandler {
        &self.print_handler
    }

    #[inline]
    pub fn recursion_limit(&self) -> usize {
        self.recursion_limit
    }

    pub fn native_module(&self, name: &str) -> Option<&NativeModule> {
        self.native_modules.get(name)
    }

    /// Append `dir` to `sys.path` unless already present.
    pub fn add_search_path(&self, dir: &str) {
        let mut path = self.sys_path.write();
        if !path.iter().any(|entry| entry.as_str() == Some(dir)) {
            path.push(Value::str(dir));
        }
    }

    /// Namespace of module `name`, created empty if it doesn't exist yet.
    pub fn add_module(&self, name: &str) -> SharedDict {
        if let Some(dict) = self.module(name) {
            return dict;
        }
        let mut dict = DictValue::new();
        dict.set_str("__name__", Value::str(name));
        dict.set_str("__builtins__", Value::Dict(self.builtins.clone()));
        let dict = new_dict(dict);
        self.modules
            .write()
            .set_str(name, Value::module(name, dict.clone()));
        debug!(module = name, "module added");
        dict
    }

    /// Namespace of an already loaded module.
    pub fn module(&self, name: &str) -> Option<SharedDict> {
        match self.modules.read().get_str(name) {
            Some(Value::Module(module)) => Some(module.dict.clone()),
            _ => None,
        }
    }

    /// Drop module `name` from `sys.modules`.
    pub fn remove_module(&self, name: &str) -> Option<SharedDict> {
        match self.modules.write().remove_str(name) {
            Some(Value::Module(module)) => Some(module.dict.clone()),
            _ => None,
        }
    }

    /// Compile source text; syntax errors become `SyntaxError` exceptions.
    pub fn compile(&self, source: &str, filename: &str, mode: CompileMode) -> Result<Code, PyException> {
        pyx_parse::parse(source, filename, mode)
            .map_err(|err| PyException::new(ExceptionKind::SyntaxError, err.to_string()))
    }

    /// Run compiled code with `globals` as the module namespace.
    pub fn run(&self, code: &Code, globals: &SharedDict) -> EvalResult {
        Interpreter::new(self).run_code(code, globals)
    }

    /// Compile and run.
    pub fn run_string(
        &self,
        source: &str,
        filename: &str,
        mode: CompileMode,
        globals: &SharedDict,
    ) -> EvalResult {
        let code = self.compile(source, filename, mode)?;
        self.run(&code, globals)
    }

    /// Call a value with positional arguments.
    pub fn call(&self, callee: &Value, args: Vec<Value>) -> EvalResult {
        Interpreter::new(self).call(callee, Args::new(args))
    }

    /// Import module `name` as `import name` would.
    pub fn import(&self, name: &str) -> EvalResult {
        Interpreter::new(self).import_module(name)
    }
}

impl Drop for Engine {
    /// Module namespaces reference each other (and `sys.modules` references
    /// itself through `sys`); clear them so the cycles are freed.
    fn drop(&mut self) {
        let loaded = self.modules.read().values();
        for module in loaded {
            if let Value::Module(module) = module {
                module.dict.write().clear();
            }
        }
        self.modules.write().clear();
        self.builtins.write().clear();
        self.sys_path.write().clear();
        debug!("engine finalized");
    }
}
