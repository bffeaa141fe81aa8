use super::*;
use crate::errors::ExceptionKind;
use pretty_assertions::assert_eq;

fn int(n: i64) -> Value {
    Value::Int(n)
}

fn bin(op: BinaryOp, a: &Value, b: &Value) -> Value {
    match binary(op, a, b) {
        Ok(v) => v,
        Err(err) => panic!("{a:?} {} {b:?} raised {err}", op.as_symbol()),
    }
}

fn bin_err(op: BinaryOp, a: &Value, b: &Value) -> PyException {
    match binary(op, a, b) {
        Ok(v) => panic!("expected an exception, got {v:?}"),
        Err(err) => err,
    }
}

#[test]
fn floor_division_rounds_toward_negative_infinity() {
    assert_eq!(bin(BinaryOp::FloorDiv, &int(7), &int(2)), int(3));
    assert_eq!(bin(BinaryOp::FloorDiv, &int(-7), &int(2)), int(-4));
    assert_eq!(bin(BinaryOp::Mod, &int(-7), &int(2)), int(1));
    assert_eq!(bin(BinaryOp::Mod, &int(7), &int(-2)), int(-1));
    assert_eq!(
        bin(BinaryOp::Mod, &Value::Float(-1.0), &Value::Float(3.0)),
        Value::Float(2.0)
    );
}

#[test]
fn true_division_yields_float() {
    assert_eq!(bin(BinaryOp::Div, &int(1), &int(2)), Value::Float(0.5));
    assert!(matches!(bin(BinaryOp::Div, &int(4), &int(2)), Value::Float(_)));
}

#[test]
fn division_by_zero_messages() {
    assert_eq!(bin_err(BinaryOp::Div, &int(1), &int(0)).message, "division by zero");
    assert_eq!(
        bin_err(BinaryOp::FloorDiv, &int(1), &int(0)).message,
        "integer division or modulo by zero"
    );
    assert_eq!(
        bin_err(BinaryOp::Div, &Value::Float(1.0), &Value::Float(0.0)).message,
        "float division by zero"
    );
}

#[test]
fn integer_overflow_raises() {
    let err = bin_err(BinaryOp::Add, &int(i64::MAX), &int(1));
    assert_eq!(err.kind, ExceptionKind::OverflowError);
    let err = bin_err(BinaryOp::FloorDiv, &int(i64::MIN), &int(-1));
    assert_eq!(err.kind, ExceptionKind::OverflowError);
}

#[test]
fn power() {
    assert_eq!(bin(BinaryOp::Pow, &int(2), &int(10)), int(1024));
    assert_eq!(bin(BinaryOp::Pow, &int(2), &int(-1)), Value::Float(0.5));
}

#[test]
fn bool_is_an_int() {
    assert_eq!(bin(BinaryOp::Add, &Value::Bool(true), &int(1)), int(2));
}

#[test]
fn sequences_concatenate_and_repeat() {
    assert_eq!(
        bin(BinaryOp::Add, &Value::str("ab"), &Value::str("cd")),
        Value::str("abcd")
    );
    assert_eq!(bin(BinaryOp::Mul, &int(3), &Value::str("x")), Value::str("xxx"));
    assert_eq!(
        bin(BinaryOp::Mul, &Value::list(vec![int(1)]), &int(2)),
        Value::list(vec![int(1), int(1)])
    );
    assert_eq!(
        bin(BinaryOp::Add, &Value::tuple(vec![int(1)]), &Value::tuple(vec![int(2)])),
        Value::tuple(vec![int(1), int(2)])
    );
    assert_eq!(bin(BinaryOp::Mul, &Value::str("x"), &int(-1)), Value::str(""));
}

#[test]
fn mixed_types_are_type_errors() {
    let err = bin_err(BinaryOp::Add, &int(1), &Value::str("a"));
    assert_eq!(err.kind, ExceptionKind::TypeError);
    assert_eq!(
        err.message,
        "unsupported operand type(s) for +: 'int' and 'str'"
    );
}

#[test]
fn percent_formatting() {
    let args = Value::tuple(vec![Value::str("x"), int(3), Value::Float(1.5)]);
    assert_eq!(
        bin(BinaryOp::Mod, &Value::str("%s=%d (%.2f) 100%%"), &args),
        Value::str("x=3 (1.50) 100%")
    );
    let err = bin_err(BinaryOp::Mod, &Value::str("%s %s"), &int(1));
    assert_eq!(err.kind, ExceptionKind::TypeError);
}

#[test]
fn unary_operators() {
    assert_eq!(unary(UnaryOp::Neg, &int(3)).ok(), Some(int(-3)));
    assert_eq!(unary(UnaryOp::Not, &Value::list(vec![])).ok(), Some(Value::Bool(true)));
    assert!(unary(UnaryOp::Neg, &Value::str("a")).is_err());
}

#[test]
fn comparisons() {
    assert_eq!(compare(CompareOp::Lt, &int(1), &Value::Float(1.5)), Ok(true));
    assert_eq!(
        compare(CompareOp::Lt, &Value::str("abc"), &Value::str("abd")),
        Ok(true)
    );
    assert_eq!(
        compare(
            CompareOp::GtEq,
            &Value::tuple(vec![int(1), int(2)]),
            &Value::tuple(vec![int(1)])
        ),
        Ok(true)
    );
    assert_eq!(
        compare(CompareOp::In, &int(2), &Value::list(vec![int(1), int(2)])),
        Ok(true)
    );
    assert_eq!(
        compare(CompareOp::NotIn, &Value::str("z"), &Value::str("abc")),
        Ok(true)
    );
    assert_eq!(
        compare(CompareOp::Lt, &Value::Float(f64::NAN), &int(1)),
        Ok(false)
    );
    let err = compare(CompareOp::Lt, &int(1), &Value::str("a"));
    assert!(matches!(err, Err(e) if e.kind == ExceptionKind::TypeError));
}

#[test]
fn compare_values_orders_mixed_numbers() {
    assert_eq!(
        compare_values(&Value::Float(2.5), &int(2)).ok(),
        Some(Ordering::Greater)
    );
    assert!(compare_values(&Value::None, &int(2)).is_err());
}
