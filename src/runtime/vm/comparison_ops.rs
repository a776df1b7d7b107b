use std::cmp::Ordering;

use crate::runtime::{resource::ResourceError, value::Value};

/// Applies a binary operator. `None` means the operator is unknown.
pub(super) fn binary(op: &str, left: &Value, right: &Value) -> Option<Result<Value, ResourceError>> {
    let result = match op {
        "==" => Ok(Value::Bool(equal(left, right))),
        "!=" => Ok(Value::Bool(!equal(left, right))),
        "<" | "<=" | ">" | ">=" => Ok(Value::Bool(match order(left, right) {
            Some(ordering) => match op {
                "<" => ordering == Ordering::Less,
                "<=" => ordering != Ordering::Greater,
                ">" => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            },
            None => false,
        })),
        "&&" => Ok(Value::Bool(left.is_truthy() && right.is_truthy())),
        "||" => Ok(Value::Bool(left.is_truthy() || right.is_truthy())),
        "+" | "-" | "*" | "/" => arithmetic(op, left, right),
        _ => return None,
    };
    Some(result)
}

pub(super) fn unary(op: &str, value: &Value) -> Option<Result<Value, ResourceError>> {
    let result = match (op, value) {
        ("!", value) => Ok(Value::Bool(!value.is_truthy())),
        ("-", Value::Int(i)) => i
            .checked_neg()
            .map(Value::Int)
            .ok_or_else(|| ResourceError::Evaluation("integer overflow".into())),
        ("-", Value::Float(x)) => Ok(Value::Float(-x)),
        ("-", Value::Nil) => Ok(Value::Nil),
        ("-", other) => Err(ResourceError::Evaluation(format!(
            "cannot negate {}",
            other.kind()
        ))),
        _ => return None,
    };
    Some(result)
}

/// Equality across runtime values. Numbers compare by value regardless of
/// int/float; a string compared with another scalar compares as text.
pub(super) fn equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Nil, Value::Nil) => true,
        (Value::Nil, _) | (_, Value::Nil) => false,
        (Value::Int(l), Value::Int(r)) => l == r,
        (Value::Float(l), Value::Float(r)) => l == r,
        (Value::Int(l), Value::Float(r)) | (Value::Float(r), Value::Int(l)) => (*l as f64) == *r,
        (Value::Bool(l), Value::Bool(r)) => l == r,
        (Value::String(l), Value::String(r)) | (Value::Regex(l), Value::Regex(r)) => l == r,
        (Value::Array(l), Value::Array(r)) => {
            l.len() == r.len() && l.iter().zip(r).all(|(a, b)| equal(a, b))
        }
        (Value::Map(l), Value::Map(r)) => {
            l.len() == r.len()
                && l.iter()
                    .zip(r)
                    .all(|((lk, lv), (rk, rv))| lk == rk && equal(lv, rv))
        }
        (Value::Resource(l), Value::Resource(r)) => l == r,
        (Value::String(s), scalar) | (scalar, Value::String(s))
            if matches!(scalar, Value::Int(_) | Value::Float(_) | Value::Bool(_)) =>
        {
            *s == scalar.to_text()
        }
        _ => false,
    }
}

fn order(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Int(l), Value::Int(r)) => Some(l.cmp(r)),
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        (l, r) => as_number(l)?.partial_cmp(&as_number(r)?),
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Int(i) => Some(*i as f64),
        Value::Float(x) => Some(*x),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn arithmetic(op: &str, left: &Value, right: &Value) -> Result<Value, ResourceError> {
    match (left, right) {
        (Value::Nil, _) | (_, Value::Nil) => Ok(Value::Nil),
        (Value::Int(l), Value::Int(r)) => {
            let result = match op {
                "+" => l.checked_add(*r),
                "-" => l.checked_sub(*r),
                "*" => l.checked_mul(*r),
                _ if *r == 0 => return Err(ResourceError::Evaluation("division by zero".into())),
                _ => l.checked_div(*r),
            };
            result
                .map(Value::Int)
                .ok_or_else(|| ResourceError::Evaluation("integer overflow".into()))
        }
        (Value::String(l), Value::String(r)) if op == "+" => Ok(Value::String(format!("{l}{r}"))),
        (l, r) => match (numeric(l), numeric(r)) {
            (Some(l), Some(r)) => match op {
                "+" => Ok(Value::Float(l + r)),
                "-" => Ok(Value::Float(l - r)),
                "*" => Ok(Value::Float(l * r)),
                _ if r == 0.0 => Err(ResourceError::Evaluation("division by zero".into())),
                _ => Ok(Value::Float(l / r)),
            },
            _ => Err(ResourceError::Evaluation(format!(
                "cannot apply '{op}' to {} and {}",
                l.kind(),
                r.kind()
            ))),
        },
    }
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Int(i) => Some(*i as f64),
        Value::Float(x) => Some(*x),
        _ => None,
    }
}
