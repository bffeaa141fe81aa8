//! The host-visible script object.
//!
//! A [`ScriptObject`] owns one [`Namespace`] and answers the messages the
//! host sends it. Every message ends in exactly one outlet event; errors
//! never escape [`ScriptObject::handle`].

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::debug;

use crate::atom::{atoms_to_text, Atom, AtomBuf};
use crate::config::ObjectConfig;
use crate::error::BridgeError;
use crate::exec::{self, Mode, Outcome};
use crate::host::{DispatchError, Host, MessageReceiver};
use crate::namespace::Namespace;
use crate::report::Reporter;
use crate::runtime::Runtime;

/// Mutable per-object state. Locked only briefly, never across a request,
/// so a request may re-enter the object (e.g. `send` to itself).
#[derive(Default)]
struct ObjectState {
    /// Editor buffer.
    code: String,
    /// Last resolved source file.
    file_path: Option<PathBuf>,
    /// `callable args...` waiting for the next tick.
    scheduled: Option<AtomBuf>,
}

pub struct ScriptObject {
    namespace: Namespace,
    config: ObjectConfig,
    host: Host,
    state: Mutex<ObjectState>,
}

impl ScriptObject {
    /// Create the object and its namespace. When `autoload` is set and a
    /// file is configured, the file is loaded right away.
    pub fn new(runtime: &Arc<Runtime>, host: Host, config: ObjectConfig) -> Self {
        let namespace =
            runtime.create_namespace(config.name.as_deref(), config.pythonpath.as_deref());
        let object = ScriptObject {
            namespace,
            config,
            host,
            state: Mutex::new(ObjectState::default()),
        };
        if object.namespace.is_degraded() {
            object
                .reporter()
                .error("new", &BridgeError::EngineUnavailable);
        } else {
            object.reporter().log("object created");
        }
        if object.config.autoload {
            if let Some(file) = object.config.file.clone() {
                let result = object.load(Some(&file));
                object.reporter().finish("load", result);
            }
        }
        object
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.namespace.name()
    }

    #[inline]
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    #[inline]
    pub fn config(&self) -> &ObjectConfig {
        &self.config
    }

    /// Current editor buffer.
    pub fn code(&self) -> String {
        self.state.lock().code.clone()
    }

    fn reporter(&self) -> Reporter<'_> {
        Reporter::new(
            self.namespace.name(),
            self.config.debug,
            &*self.host.outlets,
            &*self.host.console,
        )
    }

    /// Answer one host message.
    pub fn handle(&self, selector: &str, atoms: &[Atom]) {
        self.reporter()
            .log(format_args!("{selector} {}", atoms_to_text(atoms)));
        let result = match selector {
            "bang" => Ok(Outcome::Value(AtomBuf::new())),
            "import" => self.import(atoms),
            "eval" => self.with_text(Mode::Evaluate, atoms, exec::evaluate),
            "eval_to_json" => self.with_text(Mode::EvaluateToJson, atoms, exec::evaluate_to_json),
            "exec" => self.with_text(Mode::Execute, atoms, exec::execute),
            "execfile" => self.execfile(optional_symbol(atoms)),
            "call" => exec::call(&self.namespace, atoms),
            "assign" | "=" => exec::assign(&self.namespace, atoms),
            "pipe" => exec::pipe(&self.namespace, &atoms_to_text(atoms)),
            "code" => self.with_text(Mode::Code, atoms, exec::code),
            "sched" => match self.sched(atoms) {
                // The tick reports.
                Ok(()) => return,
                Err(err) => Err(err),
            },
            "count" => {
                let live = self.namespace.runtime().live_count();
                let mut atoms = AtomBuf::new();
                atoms.push(Atom::Int(i64::try_from(live).unwrap_or(i64::MAX)));
                Ok(Outcome::Value(atoms))
            }
            "scan" => {
                let found = self.namespace.runtime().registry().scan(&*self.host.graph);
                self.reporter().log(format_args!("scan found {found} object(s)"));
                Ok(Outcome::Success)
            }
            "send" => self
                .namespace
                .runtime()
                .registry()
                .send(&*self.host.graph, atoms)
                .map(|()| Outcome::Success),
            "read" => self.read(optional_symbol(atoms)).map(|_| Outcome::Success),
            "load" => self.load(optional_symbol(atoms)),
            "run" => self.run(),
            _ => {
                let mut text = selector.to_string();
                if !atoms.is_empty() {
                    text.push(' ');
                    text.push_str(&atoms_to_text(atoms));
                }
                exec::code(&self.namespace, &text)
            }
        };
        self.reporter().finish(selector, result);
    }

    /// Run the call stored by `sched`.
    pub fn tick(&self) {
        let Some(scheduled) = self.state.lock().scheduled.take() else {
            debug!(object = self.name(), "tick with nothing scheduled");
            return;
        };
        let result = exec::call(&self.namespace, &scheduled);
        self.reporter().finish("sched", result);
    }

    /// The editor window was saved.
    pub fn editor_saved(&self, text: &str) {
        self.state.lock().code = text.to_string();
        if self.config.run_on_save {
            let result = self.run();
            self.reporter().finish("run", result);
        }
    }

    /// The editor window was closed.
    pub fn editor_closed(&self, text: &str) {
        self.state.lock().code = text.to_string();
    }

    fn with_text(
        &self,
        mode: Mode,
        atoms: &[Atom],
        run: fn(&Namespace, &str) -> Result<Outcome, BridgeError>,
    ) -> Result<Outcome, BridgeError> {
        let text = atoms_to_text(atoms);
        if text.trim().is_empty() {
            return Err(BridgeError::shape(format!("{mode} needs some code")));
        }
        run(&self.namespace, &text)
    }

    fn import(&self, atoms: &[Atom]) -> Result<Outcome, BridgeError> {
        let module = atoms
            .first()
            .and_then(Atom::as_symbol)
            .ok_or_else(|| BridgeError::shape("import needs a module name"))?;
        exec::import(&self.namespace, module)
    }

    fn execfile(&self, name: Option<&str>) -> Result<Outcome, BridgeError> {
        let path = self.resolve(name)?;
        exec::execute_file(&self.namespace, &path)
    }

    /// `sched <ms> <callable> args...`
    fn sched(&self, atoms: &[Atom]) -> Result<(), BridgeError> {
        let delay = atoms
            .first()
            .and_then(Atom::as_number)
            .and_then(|ms| Duration::try_from_secs_f64(ms / 1000.0).ok())
            .ok_or_else(|| BridgeError::shape("sched: first atom must be a delay in ms"))?;
        if atoms.get(1).and_then(Atom::as_symbol).is_none() {
            return Err(BridgeError::shape("sched: second atom must be a callable name"));
        }
        self.state.lock().scheduled = Some(atoms[1..].iter().cloned().collect());
        self.host.scheduler.schedule(self.name(), delay);
        Ok(())
    }

    /// Locate a source file: the given name, else the configured file,
    /// else ask the user.
    fn resolve(&self, name: Option<&str>) -> Result<PathBuf, BridgeError> {
        let files = &self.host.files;
        let path = match name.or(self.config.file.as_deref()) {
            Some(name) => files
                .locate(name)
                .ok_or_else(|| BridgeError::PathResolution(format!("can't find file {name}")))?,
            None => files
                .ask()
                .ok_or_else(|| BridgeError::PathResolution("no file selected".into()))?,
        };
        self.state.lock().file_path = Some(path.clone());
        Ok(path)
    }

    /// Load a file into the editor buffer.
    fn read(&self, name: Option<&str>) -> Result<PathBuf, BridgeError> {
        let path = self.resolve(name)?;
        let text = std::fs::read_to_string(&path).map_err(|source| BridgeError::Io {
            path: path.clone(),
            source,
        })?;
        self.state.lock().code = text;
        Ok(path)
    }

    fn load(&self, name: Option<&str>) -> Result<Outcome, BridgeError> {
        let path = self.read(name)?;
        exec::execute_file(&self.namespace, &path)
    }

    /// Execute the editor buffer as a module body.
    fn run(&self) -> Result<Outcome, BridgeError> {
        let (code, file_path) = {
            let state = self.state.lock();
            (state.code.clone(), state.file_path.clone())
        };
        if code.trim().is_empty() {
            return Err(BridgeError::shape("editor buffer is empty"));
        }
        let filename = file_path.map_or_else(|| self.name().to_string(), |p| p.display().to_string());
        exec::execute_source(&self.namespace, &code, &filename)
    }
}

impl MessageReceiver for ScriptObject {
    fn dispatch(&self, selector: &str, args: &[Atom]) -> Result<(), DispatchError> {
        self.handle(selector, args);
        Ok(())
    }
}

fn optional_symbol(atoms: &[Atom]) -> Option<&str> {
    atoms.first().and_then(Atom::as_symbol)
}
