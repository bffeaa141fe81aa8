//! File-based imports through `sys.path`.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::fs;

use pretty_assertions::assert_eq;
use pyx_eval::{buffer_handler, CompileMode, Engine, EngineConfig, ExceptionKind, Value};
use tempfile::TempDir;

fn engine_with(dir: &TempDir) -> Engine {
    Engine::new(
        EngineConfig::new()
            .search_path(dir.path())
            .print_handler(buffer_handler()),
    )
}

fn run(engine: &Engine, source: &str) -> Result<(), pyx_eval::PyException> {
    let globals = engine.add_module("__main__");
    engine
        .run_string(source, "<test>", CompileMode::Exec, &globals)
        .map(|_| ())
}

fn main_global(engine: &Engine, name: &str) -> Option<Value> {
    engine.module("__main__").and_then(|g| g.read().get_str(name))
}

#[test]
fn imports_module_file_once() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("helpers.py"),
        "loads = 0\nloads += 1\ndef triple(x):\n    return x * 3\n",
    )
    .unwrap();
    let engine = engine_with(&dir);
    run(&engine, "import helpers\nimport helpers as h2\nr = helpers.triple(2)\nsame = helpers is h2\n").unwrap();
    assert_eq!(main_global(&engine, "r"), Some(Value::Int(6)));
    assert_eq!(main_global(&engine, "same"), Some(Value::Bool(true)));
    let helpers = engine.module("helpers").unwrap();
    assert_eq!(helpers.read().get_str("loads"), Some(Value::Int(1)));
    let file = helpers.read().get_str("__file__").unwrap();
    assert!(file.to_str().ends_with("helpers.py"));
}

#[test]
fn packages_and_submodules() {
    let dir = TempDir::new().unwrap();
    let pkg = dir.path().join("tools");
    fs::create_dir(&pkg).unwrap();
    fs::write(pkg.join("__init__.py"), "NAME = 'tools'\n").unwrap();
    fs::write(pkg.join("text.py"), "def shout(s):\n    return s.upper() + '!'\n").unwrap();
    let engine = engine_with(&dir);
    run(
        &engine,
        "import tools.text\n\
         a = tools.text.shout('hi')\n\
         from tools import text as t, NAME\n\
         b = t.shout(NAME)\n",
    )
    .unwrap();
    assert_eq!(main_global(&engine, "a"), Some(Value::str("HI!")));
    assert_eq!(main_global(&engine, "b"), Some(Value::str("TOOLS!")));
}

#[test]
fn failed_module_body_is_not_cached() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("broken.py"), "x = 1\nraise ValueError('boom')\n").unwrap();
    let engine = engine_with(&dir);
    let err = run(&engine, "import broken\n").unwrap_err();
    assert_eq!(err.kind, ExceptionKind::ValueError);
    assert!(engine.module("broken").is_none());
}

#[test]
fn syntax_errors_name_the_file() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("bad.py"), "def f(:\n").unwrap();
    let engine = engine_with(&dir);
    let err = run(&engine, "import bad\n").unwrap_err();
    assert_eq!(err.kind, ExceptionKind::SyntaxError);
    assert!(err.message.contains("bad.py"), "{}", err.message);
}

#[test]
fn from_import_of_missing_name() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("small.py"), "a = 1\n").unwrap();
    let engine = engine_with(&dir);
    let err = run(&engine, "from small import b\n").unwrap_err();
    assert_eq!(err.kind, ExceptionKind::ImportError);
    assert_eq!(err.message, "cannot import name 'b' from 'small'");
}

#[test]
fn star_import_skips_private_names() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("consts.py"), "A = 1\n_hidden = 2\n").unwrap();
    let engine = engine_with(&dir);
    run(&engine, "from consts import *\n").unwrap();
    assert_eq!(main_global(&engine, "A"), Some(Value::Int(1)));
    assert_eq!(main_global(&engine, "_hidden"), None);
}

#[test]
fn sys_path_edits_take_effect() {
    let dir = TempDir::new().unwrap();
    let extra = dir.path().join("extra");
    fs::create_dir(&extra).unwrap();
    fs::write(extra.join("late.py"), "VALUE = 'late'\n").unwrap();
    let engine = Engine::new(EngineConfig::new().print_handler(buffer_handler()));
    let source = format!(
        "import sys\nsys.path.append({:?})\nimport late\nv = late.VALUE\n",
        extra.display().to_string()
    );
    run(&engine, &source).unwrap();
    assert_eq!(main_global(&engine, "v"), Some(Value::str("late")));
}

#[test]
fn modules_share_the_engine_across_threads() {
    let engine = std::sync::Arc::new(Engine::new(
        EngineConfig::new().print_handler(buffer_handler()),
    ));
    let globals = engine.add_module("shared");
    engine
        .run_string("items = []", "<test>", CompileMode::Exec, &globals)
        .unwrap();
    let worker = {
        let engine = engine.clone();
        std::thread::spawn(move || {
            let globals = engine.module("shared").unwrap();
            engine
                .run_string("items.append(1)", "<test>", CompileMode::Exec, &globals)
                .unwrap();
        })
    };
    worker.join().unwrap();
    let items = engine.run_string("len(items)", "<test>", CompileMode::Eval, &globals);
    assert_eq!(items.unwrap(), Value::Int(1));
}
