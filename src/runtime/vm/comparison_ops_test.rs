use crate::runtime::{resource::ResourceError, value::Value};

use super::comparison_ops::{binary, equal, unary};

fn eval(op: &str, left: Value, right: Value) -> Result<Value, ResourceError> {
    binary(op, &left, &right).expect("known operator")
}

#[test]
fn compares_numbers_across_int_and_float() {
    assert_eq!(eval("==", Value::Int(1), Value::Float(1.0)), Ok(Value::Bool(true)));
    assert_eq!(eval("<", Value::Int(1), Value::Float(1.5)), Ok(Value::Bool(true)));
    assert_eq!(eval(">=", Value::Int(1000), Value::Int(1000)), Ok(Value::Bool(true)));
    assert_eq!(eval(">", Value::Float(0.5), Value::Int(1)), Ok(Value::Bool(false)));
}

#[test]
fn strings_compare_with_scalars_as_text() {
    assert!(!equal(&Value::String("development".into()), &Value::Int(1)));
    assert!(equal(&Value::String("22".into()), &Value::Int(22)));
    assert!(equal(&Value::Bool(true), &Value::String("true".into())));
}

#[test]
fn null_only_equals_null() {
    assert!(equal(&Value::Nil, &Value::Nil));
    assert_eq!(eval("!=", Value::String("x".into()), Value::Nil), Ok(Value::Bool(true)));
    assert_eq!(eval("<", Value::Nil, Value::Int(1)), Ok(Value::Bool(false)));
}

#[test]
fn arithmetic_keeps_ints_and_reports_division_by_zero() {
    assert_eq!(eval("+", Value::Int(2), Value::Int(3)), Ok(Value::Int(5)));
    assert_eq!(eval("*", Value::Int(2), Value::Float(1.5)), Ok(Value::Float(3.0)));
    assert_eq!(
        eval("+", Value::String("a".into()), Value::String("b".into())),
        Ok(Value::String("ab".into()))
    );
    assert_eq!(
        eval("/", Value::Int(1), Value::Int(0)),
        Err(ResourceError::Evaluation("division by zero".into()))
    );
    assert!(eval("-", Value::Bool(true), Value::Int(1)).is_err());
}

#[test]
fn logical_operators_use_truthiness() {
    assert_eq!(eval("&&", Value::Int(1), Value::String("x".into())), Ok(Value::Bool(true)));
    assert_eq!(eval("||", Value::Nil, Value::Array(vec![])), Ok(Value::Bool(false)));
}

#[test]
fn unary_operators() {
    assert_eq!(unary("!", &Value::Bool(false)), Some(Ok(Value::Bool(true))));
    assert_eq!(unary("-", &Value::Int(3)), Some(Ok(Value::Int(-3))));
    assert!(unary("-", &Value::String("x".into())).is_some_and(|r| r.is_err()));
    assert_eq!(unary("length", &Value::Nil), None);
}

#[test]
fn unknown_operators_are_not_guessed() {
    assert_eq!(binary("=~", &Value::Int(1), &Value::Int(1)), None);
}
