//! Host services backed by the terminal and a simulated clock.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use pyx_bridge::{
    atoms_to_text, Atom, Console, FileLocator, HomeLocator, MessageReceiver, Outlets,
    PatcherGraph, Scheduler, ScriptObject,
};
use tracing::debug;

/// Where everything the patch says ends up.
pub struct Transcript {
    echo: bool,
    lines: Mutex<Vec<String>>,
}

impl Transcript {
    /// Print each line to stdout as it arrives.
    pub fn stdout() -> Arc<Self> {
        Arc::new(Transcript {
            echo: true,
            lines: Mutex::new(Vec::new()),
        })
    }

    /// Keep lines for [`Transcript::take`].
    pub fn captured() -> Arc<Self> {
        Arc::new(Transcript {
            echo: false,
            lines: Mutex::new(Vec::new()),
        })
    }

    pub fn emit(&self, line: impl Into<String>) {
        let line = line.into();
        if self.echo {
            println!("{line}");
        } else {
            self.lines.lock().push(line);
        }
    }

    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.lines.lock())
    }
}

/// The three outlets of one object, labelled with its name.
///
/// The label is shared with the simulator, which only learns the name once
/// the object exists; anything fired during creation uses the placeholder.
pub(crate) struct ObjectOutlets {
    pub(crate) label: Arc<RwLock<String>>,
    pub(crate) transcript: Arc<Transcript>,
}

impl Outlets for ObjectOutlets {
    fn value(&self, atoms: &[Atom]) {
        let label = self.label.read();
        self.transcript
            .emit(format!("{label} value: {}", atoms_to_text(atoms)));
    }

    fn success(&self) {
        let label = self.label.read();
        self.transcript.emit(format!("{label} success"));
    }

    fn failure(&self) {
        let label = self.label.read();
        self.transcript.emit(format!("{label} failure"));
    }
}

/// The Max console stand-in.
pub struct ConsoleSink {
    transcript: Arc<Transcript>,
}

impl ConsoleSink {
    pub fn new(transcript: Arc<Transcript>) -> Self {
        ConsoleSink { transcript }
    }
}

impl Console for ConsoleSink {
    fn post(&self, message: &str) {
        self.transcript.emit(message);
    }

    fn error(&self, message: &str) {
        self.transcript.emit(format!("error {message}"));
    }
}

/// Resolves file names against the directory of the patch script.
pub struct ScriptDirFiles {
    base: PathBuf,
}

impl ScriptDirFiles {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        ScriptDirFiles { base: base.into() }
    }
}

impl FileLocator for ScriptDirFiles {
    fn locate(&self, name: &str) -> Option<PathBuf> {
        let path = Path::new(name);
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base.join(path)
        };
        path.is_file().then_some(path)
    }

    /// There is nobody to ask.
    fn ask(&self) -> Option<PathBuf> {
        debug!("file dialog requested, no file chosen");
        None
    }
}

/// Engine home from the `PYX_HOME` environment variable.
pub struct EnvHome;

impl HomeLocator for EnvHome {
    fn home(&self) -> Option<PathBuf> {
        std::env::var_os("PYX_HOME").map(PathBuf::from)
    }
}

/// Live objects of the patch, in creation order.
#[derive(Default)]
pub struct Objects {
    map: RwLock<IndexMap<String, Arc<ScriptObject>>>,
}

impl Objects {
    pub fn new() -> Arc<Self> {
        Arc::new(Objects::default())
    }

    pub fn insert(&self, object: Arc<ScriptObject>) {
        let name = object.name().to_string();
        self.map.write().insert(name, object);
    }

    pub fn get(&self, name: &str) -> Option<Arc<ScriptObject>> {
        self.map.read().get(name).cloned()
    }

    pub fn remove(&self, name: &str) -> Option<Arc<ScriptObject>> {
        self.map.write().shift_remove(name)
    }

    /// Remove every object, newest first.
    pub fn clear(&self) -> Vec<Arc<ScriptObject>> {
        let mut map = self.map.write();
        let mut objects: Vec<_> = map.drain(..).map(|(_, object)| object).collect();
        objects.reverse();
        objects
    }

    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.read().is_empty()
    }
}

impl PatcherGraph for Objects {
    fn for_each_named(&self, visit: &mut dyn FnMut(&str, Arc<dyn MessageReceiver>)) {
        let objects: Vec<_> = self
            .map
            .read()
            .iter()
            .map(|(name, object)| (name.clone(), Arc::clone(object)))
            .collect();
        for (name, object) in objects {
            visit(&name, object);
        }
    }
}

#[derive(Default)]
struct ClockState {
    now: Duration,
    /// `(deadline, object)`; at most one entry per object.
    pending: Vec<(Duration, String)>,
}

/// Simulated scheduler time. Moves only when advanced.
#[derive(Default)]
pub struct Clock {
    state: Mutex<ClockState>,
}

impl Clock {
    pub fn new() -> Arc<Self> {
        Arc::new(Clock::default())
    }

    pub fn now(&self) -> Duration {
        self.state.lock().now
    }

    pub fn cancel(&self, object: &str) {
        self.state.lock().pending.retain(|(_, name)| name != object);
    }

    /// Move time forward by `by`, calling `fire` for each deadline reached,
    /// earliest first. `fire` runs without the clock locked and may
    /// schedule again; a new deadline inside the window also fires.
    pub fn advance(&self, by: Duration, mut fire: impl FnMut(&str)) {
        let until = self.now() + by;
        while let Some(object) = self.pop_due(until) {
            fire(&object);
        }
        self.state.lock().now = until;
    }

    fn pop_due(&self, until: Duration) -> Option<String> {
        let mut state = self.state.lock();
        let index = state
            .pending
            .iter()
            .enumerate()
            .filter(|(_, (deadline, _))| *deadline <= until)
            .min_by_key(|(_, (deadline, _))| *deadline)
            .map(|(index, _)| index)?;
        let (deadline, object) = state.pending.remove(index);
        state.now = deadline;
        Some(object)
    }
}

impl Scheduler for Clock {
    /// Rescheduling an object replaces its pending deadline.
    fn schedule(&self, object: &str, delay: Duration) {
        let mut state = self.state.lock();
        let deadline = state.now + delay;
        state.pending.retain(|(_, name)| name != object);
        state.pending.push((deadline, object.to_string()));
    }
}
