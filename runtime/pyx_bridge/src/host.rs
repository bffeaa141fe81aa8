//! Interfaces the bridge needs from the embedding host.
//!
//! The bridge never talks to the host directly; a [`Host`] bundles the
//! collaborators one script object uses. Implementations must be shareable
//! across threads because the host may deliver messages from its scheduler
//! thread as well as its main thread.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::atom::Atom;

/// Outlets of a script object. Every request fires exactly one of them.
pub trait Outlets: Send + Sync {
    /// Left outlet: a result message (empty for a bang).
    fn value(&self, atoms: &[Atom]);

    /// Right outlet: the request completed without a value.
    fn success(&self);

    /// Middle outlet: the request failed.
    fn failure(&self);
}

/// Host console window.
pub trait Console: Send + Sync {
    fn post(&self, message: &str);

    fn error(&self, message: &str);
}

/// File search on the host's search path.
pub trait FileLocator: Send + Sync {
    /// Absolute path of `name`, or `None` when it can't be found.
    fn locate(&self, name: &str) -> Option<PathBuf>;

    /// Ask the user for a file. `None` when cancelled.
    fn ask(&self) -> Option<PathBuf>;
}

/// Resolves the engine's home directory (where its library lives).
pub trait HomeLocator: Send + Sync {
    fn home(&self) -> Option<PathBuf>;
}

/// Failure of the host's typed message dispatch.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("object doesn't understand '{0}'")]
    NoSuchMethod(String),
    #[error("bad arguments for '{selector}': {reason}")]
    BadArguments { selector: String, reason: String },
}

/// An object that accepts typed messages.
pub trait MessageReceiver: Send + Sync {
    fn dispatch(&self, selector: &str, args: &[Atom]) -> Result<(), DispatchError>;
}

/// The patch an object lives in.
pub trait PatcherGraph: Send + Sync {
    /// Visit every object that has a scripting name.
    fn for_each_named(&self, visit: &mut dyn FnMut(&str, Arc<dyn MessageReceiver>));
}

/// Host clock.
pub trait Scheduler: Send + Sync {
    /// Call [`ScriptObject::tick`](crate::ScriptObject::tick) on `object`
    /// after `delay`. A newer request replaces a pending one.
    fn schedule(&self, object: &str, delay: Duration);
}

/// Collaborators of one script object.
#[derive(Clone)]
pub struct Host {
    pub outlets: Arc<dyn Outlets>,
    pub console: Arc<dyn Console>,
    pub files: Arc<dyn FileLocator>,
    pub graph: Arc<dyn PatcherGraph>,
    pub scheduler: Arc<dyn Scheduler>,
}
