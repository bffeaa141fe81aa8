#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use pyx_eval::{silent_handler, Engine, EngineConfig, ExceptionKind, PyException};

/// Evaluate `source` in a fresh namespace and marshal the result.
fn marshal(source: &str) -> Result<Conversion, ConversionError> {
    let engine = Engine::new(EngineConfig::new().print_handler(silent_handler()));
    let globals = engine.add_module("__main__");
    let value = engine
        .run_string(source, "<test>", CompileMode::Eval, &globals)
        .unwrap();
    let mut interp = Interpreter::new(&engine);
    from_value(&mut interp, &globals, &value)
}

fn atoms(source: &str) -> Vec<Atom> {
    match marshal(source) {
        Ok(Conversion::Value(atoms)) => atoms.into_vec(),
        other => panic!("{source:?} marshaled to {other:?}"),
    }
}

fn sym(s: &str) -> Atom {
    Atom::symbol(s)
}

fn json(source: &str) -> Result<String, PyException> {
    let engine = Engine::new(EngineConfig::new().print_handler(silent_handler()));
    let globals = engine.add_module("__main__");
    let value = engine
        .run_string(source, "<test>", CompileMode::Eval, &globals)
        .unwrap();
    to_json(&value)
}

#[test]
fn scalars_become_single_atoms() {
    assert_eq!(atoms("2 ** 10"), vec![Atom::Int(1024)]);
    assert_eq!(atoms("1 / 4"), vec![Atom::Float(0.25)]);
    assert_eq!(atoms("'abc'"), vec![sym("abc")]);
    assert_eq!(atoms("True"), vec![Atom::Int(1)]);
}

#[test]
fn none_has_no_value() {
    assert_eq!(marshal("None"), Ok(Conversion::NoValue));
}

#[test]
fn sequences_become_one_message() {
    assert_eq!(
        atoms("[1, 2.5, 'x']"),
        vec![Atom::Int(1), Atom::Float(2.5), sym("x")]
    );
    assert_eq!(atoms("(3, 4)"), vec![Atom::Int(3), Atom::Int(4)]);
    assert_eq!(
        atoms("range(0, 10, 3)"),
        vec![Atom::Int(0), Atom::Int(3), Atom::Int(6), Atom::Int(9)]
    );
}

#[test]
fn unrecognised_elements_are_dropped() {
    assert_eq!(
        atoms("[1, [2, 3], None, len, 'z']"),
        vec![Atom::Int(1), sym("z")]
    );
}

#[test]
fn long_sequences_spill() {
    let result = marshal("list(range(300))").unwrap();
    let Conversion::Value(atoms) = result else {
        panic!("expected atoms");
    };
    assert!(atoms.spilled());
    assert_eq!(atoms.len(), 300);
    assert_eq!(atoms[299], Atom::Int(299));
}

#[test]
fn empty_sequences_are_errors() {
    assert_eq!(marshal("[]"), Err(ConversionError::EmptySequence));
    assert_eq!(marshal("()"), Err(ConversionError::EmptySequence));
    assert_eq!(marshal("range(0)"), Err(ConversionError::EmptySequence));
    assert_eq!(marshal("[None]"), Err(ConversionError::EmptySequence));
}

#[test]
fn dicts_flatten_to_key_colon_values() {
    assert_eq!(
        atoms("{'a': 1, 'b': [2, 3], 'c': 'x'}"),
        vec![
            sym("a"),
            sym(":"),
            Atom::Int(1),
            sym("b"),
            sym(":"),
            Atom::Int(2),
            Atom::Int(3),
            sym("c"),
            sym(":"),
            sym("x"),
        ]
    );
}

#[test]
fn flattening_defines_helper_in_namespace() {
    let engine = Engine::new(EngineConfig::new().print_handler(silent_handler()));
    let globals = engine.add_module("ns");
    let mut interp = Interpreter::new(&engine);
    let dict = engine
        .run_string("{1: 2}", "<test>", CompileMode::Eval, &globals)
        .unwrap();
    from_value(&mut interp, &globals, &dict).unwrap();
    assert!(globals.read().get_str("__pyx_out_dict").is_some());
}

#[test]
fn unsupported_types_are_named() {
    for (source, type_name) in [
        ("len", "builtin_function_or_method"),
        ("{1, 2}", "set"),
        ("lambda: 0", "function"),
    ] {
        match marshal(source) {
            Err(ConversionError::Unsupported(name)) => assert_eq!(name, type_name),
            other => panic!("{source:?} marshaled to {other:?}"),
        }
    }
}

#[test]
fn inbound_atoms() {
    let atoms = [Atom::Int(1), Atom::Nothing, Atom::Float(0.5), sym("s")];
    let list = atoms_to_list(&atoms, 1);
    assert_eq!(list, Value::list(vec![Value::Float(0.5), Value::str("s")]));
    assert_eq!(to_value(&Atom::Nothing), Ok(Value::None));
}

#[test]
fn json_matches_dumps_spacing() {
    assert_eq!(
        json("{'a': [1, 2.5, None, True], 'b': ('x',)}").unwrap(),
        r#"{"a": [1, 2.5, null, true], "b": ["x"]}"#
    );
    assert_eq!(json("{1: 'x', None: 2, False: 0.5}").unwrap(), r#"{"1": "x", "null": 2, "false": 0.5}"#);
    assert_eq!(json("[]").unwrap(), "[]");
    assert_eq!(json("None").unwrap(), "null");
}

#[test]
fn json_scalars_use_script_spelling() {
    assert_eq!(json("1e16").unwrap(), "1e+16");
    assert_eq!(json("3.0").unwrap(), "3.0");
    assert_eq!(json("'h\u{e9}llo'").unwrap(), r#""h\u00e9llo""#);
    assert_eq!(json("'tab\there'").unwrap(), r#""tab\there""#);
}

#[test]
fn json_rejects_what_dumps_rejects() {
    let kind = |source: &str| json(source).map_err(|exc| exc.kind);
    assert_eq!(kind("len"), Err(ExceptionKind::TypeError));
    assert_eq!(kind("{1, 2}"), Err(ExceptionKind::TypeError));
    assert_eq!(kind("{(1, 2): 3}"), Err(ExceptionKind::TypeError));
    assert_eq!(kind("float('nan')"), Err(ExceptionKind::ValueError));
    let cycle = json("(lambda l: (l.append(l), l)[1])([])").unwrap_err();
    assert_eq!(cycle.message, "Circular reference detected");
}

#[test]
fn json_depth_is_bounded() {
    let mut value = Value::Int(0);
    for _ in 0..MAX_JSON_DEPTH {
        value = Value::list(vec![value]);
    }
    assert!(to_json(&value).is_ok());
    let value = Value::list(vec![value]);
    assert_eq!(
        to_json(&value).map_err(|exc| exc.kind),
        Err(ExceptionKind::RecursionError)
    );
}

proptest! {
    #[test]
    fn scalar_atoms_round_trip(atom in prop_oneof![
        any::<i64>().prop_map(Atom::Int),
        (-1.0e12f64..1.0e12).prop_map(Atom::Float),
        "[a-z][a-z0-9_]{0,10}".prop_map(Atom::Symbol),
    ]) {
        let engine = Engine::new(EngineConfig::new().print_handler(silent_handler()));
        let globals = engine.add_module("__main__");
        let mut interp = Interpreter::new(&engine);
        let value = to_value(&atom).unwrap();
        let back = from_value(&mut interp, &globals, &value).unwrap();
        let mut expected = AtomBuf::new();
        expected.push(atom);
        prop_assert_eq!(back, Conversion::Value(expected));
    }
}
