#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::io::Write;

use super::*;
use crate::atom::parse_atoms;
use crate::error::ConversionError;
use crate::runtime::{Runtime, RuntimeConfig};
use pretty_assertions::assert_eq;
use pyx_eval::silent_handler;

fn namespace() -> Namespace {
    Runtime::new(RuntimeConfig::new().print_handler(silent_handler())).create_namespace(None, None)
}

fn value(outcome: Result<Outcome, BridgeError>) -> Vec<Atom> {
    match outcome {
        Ok(Outcome::Value(atoms)) => atoms.into_vec(),
        other => panic!("expected a value, got {other:?}"),
    }
}

fn success(outcome: Result<Outcome, BridgeError>) {
    match outcome {
        Ok(Outcome::Success) => {}
        other => panic!("expected success, got {other:?}"),
    }
}

fn runtime_error(outcome: Result<Outcome, BridgeError>) -> String {
    match outcome {
        Err(BridgeError::Runtime(repr)) => repr,
        other => panic!("expected a runtime error, got {other:?}"),
    }
}

#[test]
fn evaluate_marshals_result() {
    let ns = namespace();
    assert_eq!(value(evaluate(&ns, "2 ** 10")), vec![Atom::Int(1024)]);
    assert_eq!(
        runtime_error(evaluate(&ns, "1/0")),
        "ZeroDivisionError('division by zero')"
    );
    success(evaluate(&ns, "None"));
    assert!(matches!(
        evaluate(&ns, "x ="),
        Err(BridgeError::Compile {
            form: Form::Expression,
            ..
        })
    ));
    assert!(matches!(
        evaluate(&ns, "len"),
        Err(BridgeError::Conversion(ConversionError::Unsupported(_)))
    ));
}

#[test]
fn execute_binds_in_namespace() {
    let ns = namespace();
    success(execute(&ns, "x = 5"));
    assert_eq!(value(evaluate(&ns, "x * 2")), vec![Atom::Int(10)]);
    assert!(matches!(
        execute(&ns, "if"),
        Err(BridgeError::Compile {
            form: Form::Statement,
            ..
        })
    ));
    assert!(runtime_error(execute(&ns, "undefined_name")).starts_with("NameError("));
}

#[test]
fn call_unpacks_arguments() {
    let ns = namespace();
    success(execute(&ns, "def add(a, b):\n    return a + b\n"));
    assert_eq!(value(call(&ns, &parse_atoms("add 1 2"))), vec![Atom::Int(3)]);
    assert_eq!(value(call(&ns, &parse_atoms("len abc"))), vec![Atom::Int(3)]);
}

#[test]
fn call_retries_with_list_on_type_error() {
    let ns = namespace();
    assert_eq!(value(call(&ns, &parse_atoms("sum 1 2 3"))), vec![Atom::Int(6)]);
    success(execute(&ns, "def total(xs):\n    return sum(xs)\n"));
    assert_eq!(value(call(&ns, &parse_atoms("total 4 5"))), vec![Atom::Int(9)]);
}

#[test]
fn call_failures() {
    let ns = namespace();
    assert!(matches!(
        call(&ns, &[Atom::Int(1)]),
        Err(BridgeError::ArgumentShape(_))
    ));
    assert!(matches!(call(&ns, &[]), Err(BridgeError::ArgumentShape(_))));
    assert!(runtime_error(call(&ns, &parse_atoms("nothing_here 1"))).starts_with("NameError("));
    // Only a TypeError triggers the retry; the retry's own error is reported.
    success(execute(&ns, "def boom(*args):\n    raise ValueError('no')\n"));
    assert_eq!(
        runtime_error(call(&ns, &parse_atoms("boom 1"))),
        "ValueError('no')"
    );
    assert!(runtime_error(call(&ns, &parse_atoms("abs a b"))).starts_with("TypeError("));
}

#[test]
fn call_result_none_is_success() {
    let ns = namespace();
    success(execute(&ns, "log = []"));
    success(call(&ns, &parse_atoms("log.append 1")));
    assert_eq!(value(evaluate(&ns, "log")), vec![Atom::Int(1)]);
}

#[test]
fn assign_binds_a_list() {
    let ns = namespace();
    success(assign(&ns, &parse_atoms("x 1 2 3")));
    assert_eq!(
        value(evaluate(&ns, "x")),
        vec![Atom::Int(1), Atom::Int(2), Atom::Int(3)]
    );
    success(assign(&ns, &parse_atoms("empty")));
    assert_eq!(
        evaluate(&ns, "empty").unwrap_err().to_string(),
        "empty sequence has no atoms"
    );
}

#[test]
fn assign_rejects_dropped_atoms() {
    let ns = namespace();
    let atoms = [Atom::symbol("x"), Atom::Int(1), Atom::Nothing];
    assert!(matches!(
        assign(&ns, &atoms),
        Err(BridgeError::ArgumentShape(_))
    ));
    assert!(matches!(
        assign(&ns, &[Atom::Float(1.0), Atom::Int(1)]),
        Err(BridgeError::ArgumentShape(_))
    ));
}

#[test]
fn pipe_applies_left_to_right() {
    let ns = namespace();
    success(execute(&ns, "import math"));
    assert_eq!(value(pipe(&ns, "16 math.sqrt int")), vec![Atom::Int(4)]);
    assert_eq!(value(pipe(&ns, "'abc' len")), vec![Atom::Int(3)]);
    assert!(matches!(pipe(&ns, "  "), Err(BridgeError::ArgumentShape(_))));
    assert!(runtime_error(pipe(&ns, "1 nope")).starts_with("NameError("));
}

#[test]
fn code_falls_back_to_statements() {
    let ns = namespace();
    assert_eq!(value(code(&ns, "1 + 1")), vec![Atom::Int(2)]);
    success(code(&ns, "y = 3"));
    assert_eq!(value(code(&ns, "y")), vec![Atom::Int(3)]);
    assert!(matches!(
        code(&ns, "1 +"),
        Err(BridgeError::Compile {
            form: Form::Statement,
            ..
        })
    ));
    assert!(runtime_error(code(&ns, "1 / 0")).starts_with("ZeroDivisionError("));
}

#[test]
fn import_binds_module() {
    let ns = namespace();
    success(import(&ns, "math"));
    assert_eq!(value(evaluate(&ns, "math.sqrt(16)")), vec![Atom::Float(4.0)]);
    assert!(matches!(
        import(&ns, "no_such_module"),
        Err(BridgeError::Import { module, .. }) if module == "no_such_module"
    ));
    assert!(matches!(
        import(&ns, "math; x = 1"),
        Err(BridgeError::ArgumentShape(_))
    ));
}

#[test]
fn execute_file_runs_module_body() {
    let ns = namespace();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "z = 41 + 1").unwrap();
    success(execute_file(&ns, file.path()));
    assert_eq!(value(evaluate(&ns, "z")), vec![Atom::Int(42)]);
    assert_eq!(
        value(evaluate(&ns, "__file__")),
        vec![Atom::symbol(file.path().display().to_string())]
    );

    let missing = file.path().with_extension("missing");
    assert!(matches!(
        execute_file(&ns, &missing),
        Err(BridgeError::Io { .. })
    ));
}

#[test]
fn degraded_namespace_rejects_everything() {
    let rt = Runtime::new(
        RuntimeConfig::new()
            .print_handler(silent_handler())
            .startup_script("raise RuntimeError('broken')"),
    );
    let ns = rt.create_namespace(None, None);
    for outcome in [
        evaluate(&ns, "1"),
        execute(&ns, "x = 1"),
        call(&ns, &parse_atoms("len abc")),
        assign(&ns, &parse_atoms("x 1")),
        code(&ns, "1"),
        import(&ns, "math"),
    ] {
        assert!(matches!(outcome, Err(BridgeError::EngineUnavailable)));
    }
}
