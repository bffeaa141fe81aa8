#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::PathBuf;

use super::*;
use crate::error::BridgeError;
use pretty_assertions::assert_eq;
use pyx_eval::silent_handler;

fn runtime() -> Arc<Runtime> {
    Runtime::new(RuntimeConfig::new().print_handler(silent_handler()))
}

/// Run statements in a namespace and return global `name`.
fn run_and_get(ns: &Namespace, source: &str, name: &str) -> Option<Value> {
    let session = ns.enter().unwrap();
    session
        .engine()
        .run_string(source, "<test>", CompileMode::Exec, session.globals())
        .unwrap();
    session.globals().read().get_str(name)
}

#[derive(Default)]
struct RecordingConsole(Mutex<Vec<String>>);

impl Console for RecordingConsole {
    fn post(&self, message: &str) {
        self.0.lock().push(format!("post: {message}"));
    }

    fn error(&self, message: &str) {
        self.0.lock().push(format!("error: {message}"));
    }
}

struct FixedHome(Option<PathBuf>);

impl HomeLocator for FixedHome {
    fn home(&self) -> Option<PathBuf> {
        self.0.clone()
    }
}

#[test]
fn first_namespace_is_main_then_unique_names() {
    let rt = runtime();
    let a = rt.create_namespace(None, None);
    let b = rt.create_namespace(None, None);
    let c = rt.create_namespace(None, None);
    assert_eq!(a.name(), MAIN_NAME);
    assert_ne!(b.name(), c.name());
    for ns in [&b, &c] {
        assert!(ns.name().starts_with('u'));
        assert_eq!(ns.name().len(), 10);
        assert!(ns.name()[1..].chars().all(|c| c.is_ascii_digit()));
    }
}

#[test]
fn main_is_reused_after_full_teardown() {
    let rt = runtime();
    let first = rt.create_namespace(None, None);
    assert_eq!(first.name(), MAIN_NAME);
    drop(first);
    let again = rt.create_namespace(None, None);
    assert_eq!(again.name(), MAIN_NAME);
}

#[test]
fn requested_names_are_honoured_when_free() {
    let rt = runtime();
    let synth = rt.create_namespace(Some("synth"), None);
    let clash = rt.create_namespace(Some("synth"), None);
    let module = rt.create_namespace(Some("sys"), None);
    assert_eq!(synth.name(), "synth");
    assert_ne!(clash.name(), "synth");
    assert_ne!(module.name(), "sys");
}

#[test]
fn live_count_drives_engine_lifetime() {
    let rt = runtime();
    for round in 1..=3 {
        let a = rt.create_namespace(None, None);
        let b = rt.create_namespace(None, None);
        assert_eq!(rt.live_count(), 2);
        assert!(rt.is_running());
        assert_eq!(rt.generation(), round);
        assert_eq!(a.generation(), round);
        drop(a);
        assert!(rt.is_running());
        b.destroy();
        assert_eq!(rt.live_count(), 0);
        assert!(!rt.is_running());
    }
}

#[test]
fn release_clears_globals_and_module_entry() {
    let rt = runtime();
    let keep = rt.create_namespace(None, None);
    let gone = rt.create_namespace(Some("gone"), None);
    let globals = gone.globals().cloned().unwrap();
    gone.destroy();
    assert!(globals.read().is_empty());
    let engine = rt.lock_engine().unwrap();
    assert!(engine.module("gone").is_none());
    assert!(engine.module(keep.name()).is_some());
}

#[test]
fn names_are_injected() {
    let rt = runtime();
    let ns = rt.create_namespace(Some("synth"), None);
    let globals = ns.globals().unwrap().read().clone();
    assert_eq!(globals.get_str(OBJ_NAME_VAR), Some(Value::str("synth")));
    assert_eq!(globals.get_str("__name__"), Some(Value::str("synth")));
    assert!(matches!(globals.get_str("__builtins__"), Some(Value::Dict(_))));
}

#[test]
fn namespaces_import_each_other() {
    let rt = runtime();
    let main = rt.create_namespace(None, None);
    let other = rt.create_namespace(None, None);
    run_and_get(&main, "shared = 7", "shared");
    let seen = run_and_get(&other, "import __main__\nseen = __main__.shared", "seen");
    assert_eq!(seen, Some(Value::Int(7)));
}

#[test]
fn search_path_is_appended() {
    let rt = runtime();
    let ns = rt.create_namespace(None, Some("/opt/patches"));
    let path = run_and_get(&ns, "import sys\np = '/opt/patches' in sys.path", "p");
    assert_eq!(path, Some(Value::Bool(true)));
}

#[test]
fn search_path_churn_adds_each_directory_once() {
    let rt = runtime();
    let keeper = rt.create_namespace(None, None);
    for _ in 0..20 {
        drop(rt.create_namespace(None, Some("/opt/patches")));
    }
    let count = run_and_get(&keeper, "import sys\nn = sys.path.count('/opt/patches')", "n");
    assert_eq!(count, Some(Value::Int(1)));
}

#[test]
fn native_modules_register_before_start_only() {
    let rt = runtime();
    rt.register_native_module(NativeModule::new("host").constant("ANSWER", Value::Int(42)))
        .unwrap();
    let ns = rt.create_namespace(None, None);
    let answer = run_and_get(&ns, "import host\nanswer = host.ANSWER", "answer");
    assert_eq!(answer, Some(Value::Int(42)));
    assert_eq!(
        rt.register_native_module(NativeModule::new("late")),
        Err(EngineInitError::AlreadyRunning("late".into()))
    );

    // Queued modules survive a restart.
    drop(ns);
    let ns = rt.create_namespace(None, None);
    let answer = run_and_get(&ns, "import host\nanswer = host.ANSWER", "answer");
    assert_eq!(answer, Some(Value::Int(42)));
}

#[test]
fn startup_failure_degrades_namespaces() {
    let rt = Runtime::new(
        RuntimeConfig::new()
            .print_handler(silent_handler())
            .startup_script("1 / 0"),
    );
    let ns = rt.create_namespace(None, None);
    assert!(ns.is_degraded());
    assert!(!rt.is_running());
    assert_eq!(rt.live_count(), 1);
    assert!(matches!(ns.enter(), Err(BridgeError::EngineUnavailable)));
    drop(ns);
    assert_eq!(rt.live_count(), 0);
}

#[test]
fn startup_script_runs_before_namespaces() {
    let rt = Runtime::new(
        RuntimeConfig::new()
            .print_handler(silent_handler())
            .startup_script("import sys\nsys.path.append('/site')"),
    );
    let ns = rt.create_namespace(None, None);
    let found = run_and_get(&ns, "import sys\nfound = '/site' in sys.path", "found");
    assert_eq!(found, Some(Value::Bool(true)));
}

#[test]
fn home_locator_sets_prefix() {
    let rt = Runtime::new(
        RuntimeConfig::new()
            .print_handler(silent_handler())
            .home(Arc::new(FixedHome(Some(PathBuf::from("/opt/pyx"))))),
    );
    let ns = rt.create_namespace(None, None);
    let prefix = run_and_get(&ns, "import sys\nprefix = sys.prefix", "prefix");
    assert_eq!(prefix, Some(Value::str("/opt/pyx")));
}

#[test]
fn missing_home_is_not_fatal() {
    let rt = Runtime::new(
        RuntimeConfig::new()
            .print_handler(silent_handler())
            .home(Arc::new(FixedHome(None))),
    );
    let ns = rt.create_namespace(None, None);
    assert!(!ns.is_degraded());
}

#[test]
fn api_module_reaches_the_console() {
    let console = Arc::new(RecordingConsole::default());
    let rt = Runtime::new(
        RuntimeConfig::new()
            .print_handler(silent_handler())
            .console(console.clone()),
    );
    let ns = rt.create_namespace(None, None);
    run_and_get(&ns, "import api\napi.post('hello', 1)\napi.error('bad')", "api");
    assert_eq!(
        console.0.lock().clone(),
        vec!["post: hello 1".to_string(), "error: bad".to_string()]
    );
}
