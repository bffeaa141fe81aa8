#![allow(clippy::unwrap_used, clippy::expect_used)]

use pretty_assertions::assert_eq;

use super::*;

#[test]
fn truthiness() {
    assert!(!Value::None.is_truthy());
    assert!(!Value::Int(0).is_truthy());
    assert!(!Value::str("").is_truthy());
    assert!(!Value::list(vec![]).is_truthy());
    assert!(Value::tuple(vec![Value::None]).is_truthy());
    assert!(Value::Type(TypeKind::Int).is_truthy());
}

#[test]
fn numeric_equality_crosses_types() {
    assert_eq!(Value::Int(1), Value::Float(1.0));
    assert_eq!(Value::Bool(true), Value::Int(1));
    assert_ne!(Value::Int(1), Value::str("1"));
    assert_ne!(Value::Float(f64::NAN), Value::Float(f64::NAN));
}

#[test]
fn containers_compare_structurally() {
    let a = Value::list(vec![Value::Int(1), Value::str("x")]);
    let b = Value::list(vec![Value::Int(1), Value::str("x")]);
    assert_eq!(a, b);
    assert!(!a.is_identical(&b));
    assert!(a.is_identical(&a.clone()));

    let mut left = DictValue::new();
    left.set_str("k", Value::Int(1));
    let mut right = DictValue::new();
    right.set_str("k", Value::Float(1.0));
    assert_eq!(Value::dict(left), Value::dict(right));
}

#[test]
fn shared_list_sees_mutation_through_clones() {
    let list = Value::list(vec![]);
    let alias = list.clone();
    if let Value::List(items) = &list {
        items.write().push(Value::Int(5));
    }
    assert_eq!(alias, Value::list(vec![Value::Int(5)]));
}

#[test]
fn type_names() {
    assert_eq!(Value::Bool(true).type_name(), "bool");
    assert_eq!(Value::dict(DictValue::new()).type_name(), "dict");
    let exc = Value::exception(PyException::new(ExceptionKind::KeyError, "k"));
    assert_eq!(exc.type_name(), "KeyError");
}

#[test]
fn str_and_repr_differ_for_strings_only() {
    assert_eq!(Value::str("a'b").to_str(), "a'b");
    assert_eq!(Value::str("a'b").repr(), "\"a'b\"");
    assert_eq!(Value::Int(3).to_str(), "3");
    assert_eq!(Value::None.repr(), "None");
}

#[test]
fn hash_keys_unify_equal_numbers() {
    let mut dict = DictValue::new();
    assert!(dict.insert(Value::Int(1), Value::str("int")).is_ok());
    assert!(dict.insert(Value::Float(1.0), Value::str("float")).is_ok());
    assert_eq!(dict.len(), 1);
    assert_eq!(dict.get(&Value::Bool(true)).ok().flatten(), Some(Value::str("float")));
    // The first key object is kept.
    assert!(matches!(dict.keys().as_slice(), [Value::Int(1)]));
}

#[test]
fn mutable_values_are_unhashable() {
    let mut dict = DictValue::new();
    let err = dict.insert(Value::list(vec![]), Value::None);
    assert!(matches!(err, Err(e) if e.message == "unhashable type: 'list'"));
}

#[test]
fn deep_nesting_is_released_without_recursion() {
    let worker = std::thread::Builder::new()
        .stack_size(256 * 1024)
        .spawn(|| {
            let mut list = Value::list(vec![]);
            let mut tuple = Value::tuple(vec![]);
            let mut dict = Value::dict(DictValue::new());
            for _ in 0..200_000 {
                list = Value::list(vec![list]);
                tuple = Value::tuple(vec![Value::Int(0), tuple]);
                let mut outer = DictValue::new();
                outer.set_str("inner", dict);
                dict = Value::dict(outer);
            }
            drop((list, tuple, dict));
        })
        .unwrap();
    worker.join().unwrap();
}

#[test]
fn shared_children_outlive_their_container() {
    let shared = Value::list(vec![Value::Int(1)]);
    let outer = Value::list(vec![shared.clone(), Value::tuple(vec![shared.clone()])]);
    drop(outer);
    assert_eq!(shared, Value::list(vec![Value::Int(1)]));
    let Value::List(items) = &shared else {
        unreachable!()
    };
    assert_eq!(Heap::strong_count(items), 1);
}

#[test]
fn heap_strings_format_as_their_text() {
    let (Value::Str(a), Value::Str(b)) = (Value::str("ab"), Value::str("cd")) else {
        unreachable!()
    };
    assert_eq!(format!("{a}{b}"), "abcd");
    assert_eq!(a.to_string(), "ab");
}
