//! The process-wide engine shared by every script object.
//!
//! A [`Runtime`] is the one context object hosts create at start-up. It
//! owns the engine lock, the live-namespace counter, the set of names in
//! use and the `send` registry. The engine itself is started lazily by the
//! first [`Namespace`] and finalized when the last one is released, so a
//! patch that frees all its objects and creates new ones gets a fresh
//! engine (a new *generation*).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};
use pyx_eval::{
    CompileMode, Engine, EngineConfig, NativeModule, SharedDict, SharedPrintHandler, Value,
    DEFAULT_RECURSION_LIMIT,
};
use rustc_hash::FxHashSet;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::host::{Console, HomeLocator};
use crate::namespace::Namespace;
use crate::registry::Registry;

/// Name given to the first namespace of an engine generation.
pub const MAIN_NAME: &str = "__main__";

/// Global holding the namespace's own name.
pub const OBJ_NAME_VAR: &str = "PY_OBJ_NAME";

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EngineInitError {
    #[error("start-up script failed: {0}")]
    Startup(String),
    #[error("native module '{0}' registered after the engine started")]
    AlreadyRunning(String),
}

/// Builder for [`Runtime`].
#[derive(Default)]
pub struct RuntimeConfig {
    home: Option<Arc<dyn HomeLocator>>,
    startup_script: Option<String>,
    recursion_limit: Option<usize>,
    print_handler: Option<SharedPrintHandler>,
    console: Option<Arc<dyn Console>>,
}

impl RuntimeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Where the engine's home directory comes from (`sys.prefix`).
    #[must_use]
    pub fn home(mut self, locator: Arc<dyn HomeLocator>) -> Self {
        self.home = Some(locator);
        self
    }

    /// Source run once after every engine start, before any namespace
    /// exists. A failure leaves the engine unavailable.
    #[must_use]
    pub fn startup_script(mut self, source: impl Into<String>) -> Self {
        self.startup_script = Some(source.into());
        self
    }

    #[must_use]
    pub fn recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = Some(limit);
        self
    }

    /// Sink for script `print()` output.
    #[must_use]
    pub fn print_handler(mut self, handler: SharedPrintHandler) -> Self {
        self.print_handler = Some(handler);
        self
    }

    /// Console behind the `api` module (`api.post`, `api.error`).
    #[must_use]
    pub fn console(mut self, console: Arc<dyn Console>) -> Self {
        self.console = Some(console);
        self
    }
}

/// State guarded by the engine lock.
struct EngineState {
    engine: Option<Engine>,
    live: usize,
    generation: u64,
    names: FxHashSet<String>,
    native_modules: Vec<NativeModule>,
}

pub struct Runtime {
    config: RuntimeConfig,
    state: Mutex<EngineState>,
    registry: Registry,
    unique: AtomicU64,
}

impl Runtime {
    pub fn new(config: RuntimeConfig) -> Arc<Self> {
        Arc::new(Runtime {
            config,
            state: Mutex::new(EngineState {
                engine: None,
                live: 0,
                generation: 0,
                names: FxHashSet::default(),
                native_modules: Vec::new(),
            }),
            registry: Registry::new(),
            unique: AtomicU64::new(0),
        })
    }

    /// Make `module` importable. Only allowed while the engine is down.
    pub fn register_native_module(&self, module: NativeModule) -> Result<(), EngineInitError> {
        let mut state = self.state.lock();
        if state.engine.is_some() {
            return Err(EngineInitError::AlreadyRunning(module.name().to_string()));
        }
        debug!(module = module.name(), "native module queued");
        state.native_modules.retain(|queued| queued.name() != module.name());
        state.native_modules.push(module);
        Ok(())
    }

    /// Number of live namespaces.
    pub fn live_count(&self) -> usize {
        self.state.lock().live
    }

    /// Number of times the engine has been started.
    pub fn generation(&self) -> u64 {
        self.state.lock().generation
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().engine.is_some()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Acquire the engine lock. `None` when the engine is down.
    pub fn lock_engine(&self) -> Option<MappedMutexGuard<'_, Engine>> {
        MutexGuard::try_map(self.state.lock(), |state| state.engine.as_mut()).ok()
    }

    /// Create the namespace of a new script object.
    ///
    /// The first live namespace starts the engine. `requested` is honoured
    /// when no live namespace or loaded module uses it; otherwise a fresh
    /// unique name is chosen. If the start-up script fails the namespace
    /// is degraded and every request on it fails.
    #[tracing::instrument(level = "debug", skip_all, fields(requested = ?requested))]
    pub fn create_namespace(
        self: &Arc<Self>,
        requested: Option<&str>,
        search_path: Option<&str>,
    ) -> Namespace {
        let mut state = self.state.lock();
        let first = state.live == 0;
        if first {
            match self.start_engine(&state.native_modules) {
                Ok(engine) => {
                    state.engine = Some(engine);
                    state.generation += 1;
                }
                Err(err) => error!(%err, "engine start-up failed"),
            }
        }

        let name = self.choose_name(&state, first, requested);
        state.names.insert(name.clone());
        state.live += 1;

        let globals = state.engine.as_ref().map(|engine| {
            let globals = engine.add_module(&name);
            {
                let mut dict = globals.write();
                dict.set_str("__name__", Value::str(name.as_str()));
                dict.set_str("__builtins__", Value::Dict(engine.builtins().clone()));
                dict.set_str(OBJ_NAME_VAR, Value::str(name.as_str()));
            }
            if let Some(dir) = search_path {
                engine.add_search_path(dir);
            }
            globals
        });
        if globals.is_none() {
            warn!(namespace = %name, "engine unavailable, namespace degraded");
        }
        debug!(namespace = %name, live = state.live, "namespace created");
        Namespace::new(Arc::clone(self), name, globals, state.generation)
    }

    #[tracing::instrument(level = "debug", skip_all)]
    fn start_engine(&self, native_modules: &[NativeModule]) -> Result<Engine, EngineInitError> {
        let mut config = EngineConfig::new()
            .recursion_limit(self.config.recursion_limit.unwrap_or(DEFAULT_RECURSION_LIMIT));
        if let Some(handler) = &self.config.print_handler {
            config = config.print_handler(handler.clone());
        }
        for module in native_modules {
            config = config.native_module(module.clone());
        }
        if let Some(console) = &self.config.console {
            config = config.native_module(api_module(console.clone()));
        }
        match self.config.home.as_ref().map(|locator| locator.home()) {
            Some(Some(home)) => config = config.prefix(home),
            Some(None) => warn!("engine home directory not found, sys.prefix left unset"),
            None => {}
        }

        let engine = Engine::new(config);
        if let Some(script) = &self.config.startup_script {
            let globals = engine.add_module("sitecustomize");
            engine
                .run_string(script, "<startup>", CompileMode::Exec, &globals)
                .map_err(|exc| EngineInitError::Startup(exc.repr()))?;
        }
        info!("engine started");
        Ok(engine)
    }

    fn choose_name(&self, state: &EngineState, first: bool, requested: Option<&str>) -> String {
        let taken = |name: &str| {
            state.names.contains(name)
                || state
                    .engine
                    .as_ref()
                    .is_some_and(|engine| engine.module(name).is_some())
        };
        if let Some(name) = requested.filter(|name| !name.is_empty()) {
            if !taken(name) {
                return name.to_string();
            }
            warn!(requested = name, "name already in use, choosing a unique one");
        } else if first && !taken(MAIN_NAME) {
            return MAIN_NAME.to_string();
        }
        loop {
            let n = self.unique.fetch_add(1, Ordering::Relaxed) % 1_000_000_000;
            let name = format!("u{n:09}");
            if !taken(&name) {
                return name;
            }
        }
    }

    /// Undo [`create_namespace`](Self::create_namespace). Finalizes the
    /// engine when the last namespace goes.
    pub(crate) fn release_namespace(&self, name: &str, globals: Option<SharedDict>) {
        let mut state = self.state.lock();
        if let Some(globals) = globals {
            globals.write().clear();
            if let Some(engine) = &state.engine {
                engine.remove_module(name);
            }
        }
        state.names.remove(name);
        state.live = state.live.saturating_sub(1);
        debug!(namespace = name, live = state.live, "namespace released");
        if state.live == 0 {
            if state.engine.take().is_some() {
                info!("last namespace released, engine finalized");
            }
            self.registry.clear();
        }
    }
}

/// The host console as an importable module.
fn api_module(console: Arc<dyn Console>) -> NativeModule {
    let error_console = console.clone();
    NativeModule::new("api")
        .function("post", move |_, args| {
            console.post(&joined(&args.positional));
            Ok(Value::None)
        })
        .function("error", move |_, args| {
            error_console.error(&joined(&args.positional));
            Ok(Value::None)
        })
}

fn joined(values: &[Value]) -> String {
    values
        .iter()
        .map(Value::to_str)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests;
