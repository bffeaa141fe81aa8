//! Module import.
//!
//! Resolution order for `import name`:
//! 1. `sys.modules`
//! 2. built-in modules (`math`) and host-registered native modules
//! 3. `name.py` or the package `name/__init__.py` in each `sys.path`
//!    directory, in order
//!
//! A dotted name imports its parent package first and searches the
//! parent's `__path__`. A module is entered into `sys.modules` before its
//! body runs and removed again if the body raises.

pub(crate) mod math;
mod native;
pub(crate) mod sys;

use std::path::{Path, PathBuf};

use pyx_ir::CompileMode;
use tracing::debug;

pub use native::NativeModule;

use crate::errors::{import_error, EvalResult, ExceptionKind};
use crate::interpreter::Interpreter;
use crate::value::{new_dict, DictValue, SharedDict, Value};

impl Interpreter<'_> {
    /// `import name`: the module object for `name`, loading it if needed.
    pub fn import_module(&mut self, name: &str) -> EvalResult {
        if let Some(module) = self.engine().modules().read().get_str(name) {
            return Ok(module);
        }

        if let Some((parent, leaf)) = name.rsplit_once('.') {
            let parent_module = self.import_module(parent)?;
            if let Some(module) = self.engine().modules().read().get_str(name) {
                return Ok(module);
            }
            let search = package_path(&parent_module).ok_or_else(|| {
                import_error(format!(
                    "No module named '{name}'; '{parent}' is not a package"
                ))
            })?;
            let module = self.load_from_dirs(name, leaf, &search)?;
            if let Value::Module(parent_module) = &parent_module {
                parent_module.dict.write().set_str(leaf, module.clone());
            }
            return Ok(module);
        }

        if let Some(dict) = self.builtin_module(name) {
            debug!(module = name, "import built-in module");
            let module = Value::module(name, dict);
            self.engine().modules().write().set_str(name, module.clone());
            return Ok(module);
        }

        let search: Vec<PathBuf> = self
            .engine()
            .sys_path()
            .read()
            .iter()
            .filter_map(|entry| entry.as_str().map(PathBuf::from))
            .collect();
        self.load_from_dirs(name, name, &search)
    }

    /// `from module import name`: an attribute of the module, or else a
    /// submodule of the package.
    pub fn import_from(&mut self, module: &Value, module_name: &str, name: &str) -> EvalResult {
        if let Value::Module(m) = module {
            if let Some(value) = m.dict.read().get_str(name) {
                return Ok(value);
            }
            if package_path(module).is_some() {
                match self.import_module(&format!("{module_name}.{name}")) {
                    Ok(value) => return Ok(value),
                    Err(err) if !err.is(ExceptionKind::ImportError) => return Err(err),
                    Err(_) => {}
                }
            }
        }
        Err(import_error(format!(
            "cannot import name '{name}' from '{module_name}'"
        )))
    }

    fn builtin_module(&self, name: &str) -> Option<SharedDict> {
        if name == "math" {
            return Some(math::module());
        }
        self.engine().native_module(name).map(NativeModule::instantiate)
    }

    fn load_from_dirs(&mut self, name: &str, leaf: &str, dirs: &[PathBuf]) -> EvalResult {
        for dir in dirs {
            let file = dir.join(format!("{leaf}.py"));
            if file.is_file() {
                return self.load_source(name, &file, None);
            }
            let package = dir.join(leaf);
            let init = package.join("__init__.py");
            if init.is_file() {
                return self.load_source(name, &init, Some(&package));
            }
        }
        Err(import_error(format!("No module named '{name}'")))
    }

    fn load_source(&mut self, name: &str, file: &Path, package: Option<&Path>) -> EvalResult {
        debug!(module = name, file = %file.display(), "import source module");
        let filename = file.display().to_string();
        let source = std::fs::read_to_string(file)
            .map_err(|err| import_error(format!("cannot read {filename}: {err}")))?;
        let code = self.engine().compile(&source, &filename, CompileMode::Exec)?;

        let mut dict = DictValue::new();
        dict.set_str("__name__", Value::str(name));
        dict.set_str("__file__", Value::str(filename.as_str()));
        dict.set_str("__builtins__", Value::Dict(self.engine().builtins().clone()));
        if let Some(package) = package {
            let entry = Value::str(package.display().to_string());
            dict.set_str("__path__", Value::list(vec![entry]));
        }
        let globals = new_dict(dict);
        let module = Value::module(name, globals.clone());

        self.engine().modules().write().set_str(name, module.clone());
        if let Err(err) = self.run_code(&code, &globals) {
            self.engine().modules().write().remove_str(name);
            return Err(err);
        }
        Ok(module)
    }
}

/// Directories of a package's `__path__`, or `None` for plain modules.
fn package_path(module: &Value) -> Option<Vec<PathBuf>> {
    let Value::Module(module) = module else {
        return None;
    };
    let path = module.dict.read().get_str("__path__")?;
    let Value::List(entries) = path else {
        return None;
    };
    let dirs = entries
        .read()
        .iter()
        .filter_map(|entry| entry.as_str().map(PathBuf::from))
        .collect();
    Some(dirs)
}

