//! Engine lifetime as seen through script objects.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::sync::Arc;
use std::thread;

use common::{host, object, runtime, send, value, Event, Patch, Recorder};
use pretty_assertions::assert_eq;
use pyx_bridge::{Atom, ObjectConfig, ScriptObject, MAIN_NAME};

#[test]
fn engine_stops_with_last_object() {
    let rt = runtime();
    let objects: Vec<_> = (0..5)
        .map(|_| object(&rt, ObjectConfig::new()).0)
        .collect();
    assert_eq!(rt.live_count(), 5);
    assert!(rt.is_running());
    drop(objects);
    assert_eq!(rt.live_count(), 0);
    assert!(!rt.is_running());
}

#[test]
fn engine_restarts_fresh() {
    let rt = runtime();
    let (first, rec) = object(&rt, ObjectConfig::new());
    assert_eq!(first.name(), MAIN_NAME);
    send(&first, "exec leftover = 1");
    assert_eq!(rec.outlets(), vec![Event::Success]);
    drop(first);
    assert_eq!(rt.generation(), 1);

    let (second, rec) = object(&rt, ObjectConfig::new());
    assert_eq!(second.name(), MAIN_NAME);
    assert_eq!(rt.generation(), 2);
    send(&second, "eval leftover");
    assert_eq!(rec.outlets(), vec![Event::Failure]);
}

#[test]
fn objects_get_distinct_names() {
    let rt = runtime();
    let (main, _) = object(&rt, ObjectConfig::new());
    let (named, _) = object(&rt, ObjectConfig::new().name("lfo"));
    let (clash, _) = object(&rt, ObjectConfig::new().name("lfo"));
    assert_eq!(main.name(), MAIN_NAME);
    assert_eq!(named.name(), "lfo");
    assert_ne!(clash.name(), "lfo");
    assert_ne!(clash.name(), MAIN_NAME);
}

#[test]
fn objects_see_their_own_name() {
    let rt = runtime();
    let (_main, _) = object(&rt, ObjectConfig::new());
    let (named, rec) = object(&rt, ObjectConfig::new().name("lfo"));
    send(&named, "eval PY_OBJ_NAME");
    assert_eq!(rec.take(), vec![value(&[Atom::symbol("lfo")])]);
}

#[test]
fn namespaces_are_isolated_but_importable() {
    let rt = runtime();
    let (main, main_rec) = object(&rt, ObjectConfig::new());
    let (other, other_rec) = object(&rt, ObjectConfig::new());
    send(&main, "exec gain = 3");
    send(&other, "eval gain");
    send(&other, "exec import __main__");
    send(&other, "eval __main__.gain * 2");
    assert_eq!(main_rec.outlets(), vec![Event::Success]);
    assert_eq!(
        other_rec.outlets(),
        vec![Event::Failure, Event::Success, value(&[Atom::Int(6)])]
    );
}

#[test]
fn objects_are_shared_across_threads() {
    let rt = runtime();
    let rec = Recorder::new();
    let obj = Arc::new(ScriptObject::new(&rt, host(&rec, &Patch::new()), ObjectConfig::new()));
    send(&obj, "exec hits = []");
    rec.take();

    let workers: Vec<_> = (0..4)
        .map(|worker| {
            let obj = Arc::clone(&obj);
            thread::spawn(move || {
                for step in 0..25 {
                    send(&obj, &format!("call hits.append {}", worker * 100 + step));
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(rec.outlets().len(), 100);
    send(&obj, "eval len(hits)");
    assert_eq!(rec.take(), vec![value(&[Atom::Int(100)])]);
}

#[test]
fn objects_created_on_many_threads() {
    let rt = runtime();
    // Keeps the engine up so every worker gets a unique name.
    let (keeper, _) = object(&rt, ObjectConfig::new());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let rt = Arc::clone(&rt);
            thread::spawn(move || {
                let (obj, rec) = object(&rt, ObjectConfig::new());
                send(&obj, "eval 6 * 7");
                (obj.name().to_string(), rec.take())
            })
        })
        .collect();
    let mut names = Vec::new();
    for handle in handles {
        let (name, events) = handle.join().unwrap();
        assert_eq!(events, vec![value(&[Atom::Int(42)])]);
        names.push(name);
    }
    names.sort();
    names.dedup();
    assert_eq!(names.len(), 8);
    assert!(!names.iter().any(|name| name == MAIN_NAME));
    assert_eq!(rt.live_count(), 1);
    drop(keeper);
    assert_eq!(rt.live_count(), 0);
    assert!(!rt.is_running());
}
