//! A recording host for integration tests.

#![allow(clippy::unwrap_used, clippy::expect_used, dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use pyx_bridge::{
    parse_atoms, Atom, Console, FileLocator, Host, MessageReceiver, ObjectConfig, Outlets,
    PatcherGraph, Runtime, RuntimeConfig, Scheduler, ScriptObject,
};
use pyx_eval::silent_handler;

#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    Value(Vec<Atom>),
    Success,
    Failure,
    Post(String),
    Error(String),
}

impl Event {
    pub fn is_outlet(&self) -> bool {
        matches!(self, Event::Value(_) | Event::Success | Event::Failure)
    }
}

/// Records everything one object does to its host.
#[derive(Default)]
pub struct Recorder {
    events: Mutex<Vec<Event>>,
    scheduled: Mutex<Vec<(String, Duration)>>,
    dir: Option<PathBuf>,
}

impl Recorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Recorder::default())
    }

    /// Files are looked up in `dir`.
    pub fn in_dir(dir: &Path) -> Arc<Self> {
        Arc::new(Recorder {
            dir: Some(dir.to_path_buf()),
            ..Recorder::default()
        })
    }

    /// Drain all events.
    pub fn take(&self) -> Vec<Event> {
        std::mem::take(&mut *self.events.lock())
    }

    /// Drain events, keeping only outlet events.
    pub fn outlets(&self) -> Vec<Event> {
        self.take().into_iter().filter(Event::is_outlet).collect()
    }

    /// Drain events, keeping only console errors.
    pub fn errors(&self) -> Vec<String> {
        self.take()
            .into_iter()
            .filter_map(|event| match event {
                Event::Error(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn scheduled(&self) -> Vec<(String, Duration)> {
        self.scheduled.lock().clone()
    }

    fn push(&self, event: Event) {
        self.events.lock().push(event);
    }
}

impl Outlets for Recorder {
    fn value(&self, atoms: &[Atom]) {
        self.push(Event::Value(atoms.to_vec()));
    }

    fn success(&self) {
        self.push(Event::Success);
    }

    fn failure(&self) {
        self.push(Event::Failure);
    }
}

impl Console for Recorder {
    fn post(&self, message: &str) {
        self.push(Event::Post(message.to_string()));
    }

    fn error(&self, message: &str) {
        self.push(Event::Error(message.to_string()));
    }
}

impl FileLocator for Recorder {
    fn locate(&self, name: &str) -> Option<PathBuf> {
        let path = match &self.dir {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        };
        path.is_file().then_some(path)
    }

    fn ask(&self) -> Option<PathBuf> {
        None
    }
}

impl Scheduler for Recorder {
    fn schedule(&self, object: &str, delay: Duration) {
        self.scheduled.lock().push((object.to_string(), delay));
    }
}

/// The objects of a test patch, by scripting name.
#[derive(Default)]
pub struct Patch {
    objects: RwLock<Vec<(String, Arc<ScriptObject>)>>,
}

impl Patch {
    pub fn new() -> Arc<Self> {
        Arc::new(Patch::default())
    }

    pub fn add(&self, object: Arc<ScriptObject>) {
        let name = object.name().to_string();
        self.objects.write().push((name, object));
    }
}

impl PatcherGraph for Patch {
    fn for_each_named(&self, visit: &mut dyn FnMut(&str, Arc<dyn MessageReceiver>)) {
        let objects = self.objects.read().clone();
        for (name, object) in objects {
            visit(&name, object);
        }
    }
}

pub fn runtime() -> Arc<Runtime> {
    Runtime::new(RuntimeConfig::new().print_handler(silent_handler()))
}

pub fn host(recorder: &Arc<Recorder>, patch: &Arc<Patch>) -> Host {
    Host {
        outlets: recorder.clone(),
        console: recorder.clone(),
        files: recorder.clone(),
        graph: patch.clone(),
        scheduler: recorder.clone(),
    }
}

/// A fresh object in its own patch.
pub fn object(runtime: &Arc<Runtime>, config: ObjectConfig) -> (ScriptObject, Arc<Recorder>) {
    let recorder = Recorder::new();
    let object = ScriptObject::new(runtime, host(&recorder, &Patch::new()), config);
    recorder.take();
    (object, recorder)
}

/// Send `selector atoms...` written as text.
pub fn send(object: &ScriptObject, message: &str) {
    let atoms = parse_atoms(message);
    match atoms.split_first() {
        Some((Atom::Symbol(selector), args)) => object.handle(selector, args),
        _ => panic!("message must start with a selector: {message:?}"),
    }
}

pub fn value(atoms: &[Atom]) -> Event {
    Event::Value(atoms.to_vec())
}
