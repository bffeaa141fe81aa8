//! Name → object table used by `send`.
//!
//! The table is advisory: it is rebuilt from the patch by [`Registry::scan`]
//! and may go stale when objects are renamed or freed. Entries are weak, so
//! a freed object is never kept alive by the table; its entry just stops
//! resolving. Lookups only rescan when the table is empty.

use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::atom::Atom;
use crate::error::BridgeError;
use crate::host::{MessageReceiver, PatcherGraph};

#[derive(Default)]
pub struct Registry {
    table: RwLock<FxHashMap<String, Weak<dyn MessageReceiver>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the table with every named object in `graph`. Returns the
    /// number of objects found.
    pub fn scan(&self, graph: &dyn PatcherGraph) -> usize {
        let mut found = FxHashMap::default();
        graph.for_each_named(&mut |name: &str, receiver: Arc<dyn MessageReceiver>| {
            if !name.is_empty() {
                debug!(name, "registering object");
                found.insert(name.to_string(), Arc::downgrade(&receiver));
            }
        });
        let count = found.len();
        *self.table.write() = found;
        count
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<dyn MessageReceiver>> {
        self.table.read().get(name).and_then(Weak::upgrade)
    }

    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.read().is_empty()
    }

    pub fn clear(&self) {
        self.table.write().clear();
    }

    /// `send <target> <verb-or-number> args...`.
    ///
    /// A symbol second atom is the verb and the rest are its arguments; a
    /// number is sent as a `float` or `int` message carrying that number.
    /// The table lock is released before the receiver runs.
    pub fn send(&self, graph: &dyn PatcherGraph, atoms: &[Atom]) -> Result<(), BridgeError> {
        let (target, selector, args) = split_message(atoms)?;
        if self.is_empty() {
            self.scan(graph);
        }
        let receiver = self
            .lookup(target)
            .ok_or_else(|| BridgeError::RegistryLookup(target.to_string()))?;
        debug!(target, selector, args = args.len(), "send");
        receiver
            .dispatch(selector, args)
            .map_err(|source| BridgeError::Dispatch {
                target: target.to_string(),
                source,
            })
    }
}

fn split_message(atoms: &[Atom]) -> Result<(&str, &str, &[Atom]), BridgeError> {
    if atoms.len() < 2 {
        return Err(BridgeError::shape("send needs a receiver name and a message"));
    }
    let target = atoms[0]
        .as_symbol()
        .ok_or_else(|| BridgeError::shape("receiver of send must be a symbol"))?;
    match &atoms[1] {
        Atom::Symbol(verb) => Ok((target, verb.as_str(), &atoms[2..])),
        Atom::Float(_) => Ok((target, "float", &atoms[1..])),
        Atom::Int(_) => Ok((target, "int", &atoms[1..])),
        Atom::Nothing => Err(BridgeError::shape("cannot send an atom of unknown type")),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::host::DispatchError;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct Recorder {
        received: Mutex<Vec<(String, Vec<Atom>)>>,
    }

    impl MessageReceiver for Recorder {
        fn dispatch(&self, selector: &str, args: &[Atom]) -> Result<(), DispatchError> {
            if selector == "explode" {
                return Err(DispatchError::NoSuchMethod(selector.to_string()));
            }
            self.received
                .lock()
                .push((selector.to_string(), args.to_vec()));
            Ok(())
        }
    }

    struct Patch {
        objects: Vec<(String, Arc<Recorder>)>,
        scans: Mutex<usize>,
    }

    impl PatcherGraph for Patch {
        fn for_each_named(&self, visit: &mut dyn FnMut(&str, Arc<dyn MessageReceiver>)) {
            *self.scans.lock() += 1;
            for (name, object) in &self.objects {
                visit(name, object.clone());
            }
        }
    }

    fn patch() -> (Patch, Arc<Recorder>) {
        let target = Arc::new(Recorder::default());
        let patch = Patch {
            objects: vec![
                ("synth".to_string(), target.clone()),
                (String::new(), Arc::new(Recorder::default())),
            ],
            scans: Mutex::new(0),
        };
        (patch, target)
    }

    #[test]
    fn scan_skips_unnamed_objects() {
        let (patch, _) = patch();
        let registry = Registry::new();
        assert_eq!(registry.scan(&patch), 1);
        assert!(registry.lookup("synth").is_some());
    }

    #[test]
    fn send_classifies_second_atom() {
        let (patch, target) = patch();
        let registry = Registry::new();
        let cases = [
            (
                vec![Atom::symbol("synth"), Atom::symbol("freq"), Atom::Int(440)],
                ("freq", vec![Atom::Int(440)]),
            ),
            (
                vec![Atom::symbol("synth"), Atom::symbol("bang")],
                ("bang", vec![]),
            ),
            (
                vec![Atom::symbol("synth"), Atom::Float(0.5)],
                ("float", vec![Atom::Float(0.5)]),
            ),
            (
                vec![Atom::symbol("synth"), Atom::Int(7)],
                ("int", vec![Atom::Int(7)]),
            ),
        ];
        for (message, _) in &cases {
            registry.send(&patch, message).unwrap();
        }
        let received = target.received.lock().clone();
        let expected: Vec<(String, Vec<Atom>)> = cases
            .into_iter()
            .map(|(_, (verb, args))| (verb.to_string(), args))
            .collect();
        assert_eq!(received, expected);
    }

    #[test]
    fn empty_table_rescans_once() {
        let (patch, _) = patch();
        let registry = Registry::new();
        let message = [Atom::symbol("synth"), Atom::symbol("bang")];
        registry.send(&patch, &message).unwrap();
        registry.send(&patch, &message).unwrap();
        assert_eq!(*patch.scans.lock(), 1);
    }

    #[test]
    fn freed_objects_go_stale() {
        let target = Arc::new(Recorder::default());
        let patch = Patch {
            objects: vec![("synth".to_string(), target)],
            scans: Mutex::new(0),
        };
        let registry = Registry::new();
        registry.scan(&patch);
        drop(patch);
        assert_eq!(registry.len(), 1);
        assert!(registry.lookup("synth").is_none());
    }

    #[test]
    fn send_errors() {
        let (patch, _) = patch();
        let registry = Registry::new();
        let err = registry
            .send(&patch, &[Atom::symbol("nobody"), Atom::symbol("bang")])
            .unwrap_err();
        assert!(matches!(err, BridgeError::RegistryLookup(name) if name == "nobody"));

        let err = registry.send(&patch, &[Atom::symbol("synth")]).unwrap_err();
        assert!(matches!(err, BridgeError::ArgumentShape(_)));

        let err = registry
            .send(&patch, &[Atom::Int(1), Atom::symbol("bang")])
            .unwrap_err();
        assert!(matches!(err, BridgeError::ArgumentShape(_)));

        let err = registry
            .send(&patch, &[Atom::symbol("synth"), Atom::symbol("explode")])
            .unwrap_err();
        assert!(matches!(err, BridgeError::Dispatch { .. }));
    }
}
