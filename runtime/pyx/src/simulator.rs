//! The patch-script driver.
//!
//! One command per line:
//!
//! ```text
//! # comment
//! new @name lfo @debug 1      create an object
//! lfo eval 2 ** 10            send `eval 2 ** 10` to lfo
//! save lfo x = 1              editor saved with text `x = 1`
//! close lfo x = 1             editor closed with text `x = 1`
//! advance 250                 move the clock forward 250 ms
//! free lfo                    delete the object
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use pyx_bridge::{
    atoms_to_text, parse_atoms, Atom, ConfigError, Host, ObjectConfig, Runtime, RuntimeConfig,
    ScriptObject,
};
use pyx_eval::line_handler;
use thiserror::Error;
use tracing::{debug, info};

use crate::host::{Clock, ConsoleSink, ObjectOutlets, Objects, ScriptDirFiles, Transcript};

/// A patch script line that could not be carried out.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("no object named '{0}'")]
    UnknownObject(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Label outlets use until the object has a name.
const PENDING_LABEL: &str = "(new)";

pub struct Simulator {
    runtime: Arc<Runtime>,
    objects: Arc<Objects>,
    clock: Arc<Clock>,
    console: Arc<ConsoleSink>,
    files: Arc<ScriptDirFiles>,
    transcript: Arc<Transcript>,
}

impl Simulator {
    /// Engine output and console lines go to `transcript`; file names
    /// resolve against `base`.
    pub fn new(config: RuntimeConfig, base: impl Into<PathBuf>, transcript: Arc<Transcript>) -> Self {
        let console = Arc::new(ConsoleSink::new(Arc::clone(&transcript)));
        let print_to = Arc::clone(&transcript);
        let config = config
            .print_handler(line_handler(move |line| print_to.emit(format!("print: {line}"))))
            .console(console.clone());
        Simulator {
            runtime: Runtime::new(config),
            objects: Objects::new(),
            clock: Clock::new(),
            console,
            files: Arc::new(ScriptDirFiles::new(base)),
            transcript,
        }
    }

    pub fn runtime(&self) -> &Arc<Runtime> {
        &self.runtime
    }

    pub fn objects(&self) -> &Objects {
        &self.objects
    }

    /// Run every line of `script`. Bad lines are reported and skipped.
    /// Returns the number of bad lines.
    pub fn run_script(&self, script: &str) -> usize {
        let mut failures = 0;
        for (index, line) in script.lines().enumerate() {
            if let Err(err) = self.run_line(line) {
                self.transcript.emit(format!("line {}: {err}", index + 1));
                failures += 1;
            }
        }
        failures
    }

    pub fn run_line(&self, line: &str) -> Result<(), ScriptError> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(());
        }
        let atoms = parse_atoms(line);
        let Some((Atom::Symbol(command), rest)) = atoms.split_first() else {
            return Err(ScriptError::Usage("a line starts with a command or object name"));
        };
        debug!(command = command.as_str(), args = rest.len(), "patch line");
        match command.as_str() {
            "new" => self.create(rest),
            "free" => self.free(rest),
            "advance" => self.advance(rest),
            "save" => {
                let (object, text) = self.editor_target(rest)?;
                object.editor_saved(&text);
                Ok(())
            }
            "close" => {
                let (object, text) = self.editor_target(rest)?;
                object.editor_closed(&text);
                Ok(())
            }
            name => {
                let object = self.object(name)?;
                let Some((Atom::Symbol(selector), args)) = rest.split_first() else {
                    return Err(ScriptError::Usage("<name> <selector> [atoms...]"));
                };
                object.handle(selector, args);
                Ok(())
            }
        }
    }

    /// Free every object, newest first, as closing a patch does.
    pub fn close_patch(&self) {
        for object in self.objects.clear() {
            self.clock.cancel(object.name());
            self.transcript.emit(format!("freed {}", object.name()));
        }
    }

    fn create(&self, args: &[Atom]) -> Result<(), ScriptError> {
        let config = ObjectConfig::from_atoms(args)?;
        let label = Arc::new(RwLock::new(PENDING_LABEL.to_string()));
        let host = Host {
            outlets: Arc::new(ObjectOutlets {
                label: Arc::clone(&label),
                transcript: Arc::clone(&self.transcript),
            }),
            console: self.console.clone(),
            files: self.files.clone(),
            graph: self.objects.clone(),
            scheduler: self.clock.clone(),
        };
        let object = Arc::new(ScriptObject::new(&self.runtime, host, config));
        *label.write() = object.name().to_string();
        info!(name = object.name(), "object created");
        self.transcript.emit(format!("created {}", object.name()));
        self.objects.insert(object);
        Ok(())
    }

    fn free(&self, args: &[Atom]) -> Result<(), ScriptError> {
        let name = symbol_arg(args, "free <name>")?;
        let object = self
            .objects
            .remove(name)
            .ok_or_else(|| ScriptError::UnknownObject(name.to_string()))?;
        self.clock.cancel(name);
        drop(object);
        self.transcript.emit(format!("freed {name}"));
        Ok(())
    }

    fn advance(&self, args: &[Atom]) -> Result<(), ScriptError> {
        const USAGE: &str = "advance <ms>";
        let ms = args
            .first()
            .and_then(Atom::as_number)
            .ok_or(ScriptError::Usage(USAGE))?;
        let by = Duration::try_from_secs_f64(ms / 1000.0).map_err(|_| ScriptError::Usage(USAGE))?;
        self.clock.advance(by, |name| match self.objects.get(name) {
            Some(object) => object.tick(),
            None => debug!(name, "tick for a freed object"),
        });
        Ok(())
    }

    fn editor_target(&self, args: &[Atom]) -> Result<(Arc<ScriptObject>, String), ScriptError> {
        let name = symbol_arg(args, "save|close <name> <text...>")?;
        Ok((self.object(name)?, atoms_to_text(&args[1..])))
    }

    fn object(&self, name: &str) -> Result<Arc<ScriptObject>, ScriptError> {
        self.objects
            .get(name)
            .ok_or_else(|| ScriptError::UnknownObject(name.to_string()))
    }
}

impl Drop for Simulator {
    /// Objects hold the graph they live in, so they must be removed from it
    /// explicitly.
    fn drop(&mut self) {
        self.close_patch();
    }
}

fn symbol_arg<'a>(args: &'a [Atom], usage: &'static str) -> Result<&'a str, ScriptError> {
    args.first()
        .and_then(Atom::as_symbol)
        .ok_or(ScriptError::Usage(usage))
}

#[cfg(test)]
mod tests;
