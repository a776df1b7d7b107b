use std::collections::BTreeMap;

use crate::runtime::{resource::ResourceError, value::Value};

use super::comparison_ops::equal;

/// Builtins on arrays that do not run a nested block.
pub(super) fn array(id: &str, items: &[Value], args: &[Value]) -> Option<Result<Value, ResourceError>> {
    let value = match id {
        "length" => Value::Int(items.len() as i64),
        "first" => items.first().cloned().unwrap_or(Value::Nil),
        "last" => items.last().cloned().unwrap_or(Value::Nil),
        // Quantifier reductions judge the list their filter left behind.
        "$all" | "$none" => Value::Bool(items.is_empty()),
        "$any" => Value::Bool(!items.is_empty()),
        "$one" => Value::Bool(items.len() == 1),
        "duplicates" => Value::Array(duplicates(items, items)),
        "contains" => match args.first() {
            Some(needle) => Value::Bool(items.iter().any(|item| equal(item, needle))),
            None => return Some(Err(missing_argument(id))),
        },
        "[]" => match args.first() {
            Some(Value::Int(idx)) => index(items, *idx),
            Some(Value::Nil) => Value::Nil,
            Some(other) => {
                return Some(Err(ResourceError::Evaluation(format!(
                    "cannot index array with {}",
                    other.kind()
                ))));
            }
            None => return Some(Err(missing_argument(id))),
        },
        _ => return None,
    };
    Some(Ok(value))
}

/// Builtins on maps.
pub(super) fn map(
    id: &str,
    entries: &BTreeMap<String, Value>,
    args: &[Value],
) -> Option<Result<Value, ResourceError>> {
    let value = match id {
        "length" => Value::Int(entries.len() as i64),
        "keys" => Value::Array(entries.keys().cloned().map(Value::String).collect()),
        "values" => Value::Array(entries.values().cloned().collect()),
        "[]" => match args.first() {
            Some(key) => entries.get(&key.to_text()).cloned().unwrap_or(Value::Nil),
            None => return Some(Err(missing_argument(id))),
        },
        _ => return None,
    };
    Some(Ok(value))
}

/// Items whose key occurs more than once, in input order. `keys` runs
/// parallel to `items`.
pub(super) fn duplicates(items: &[Value], keys: &[Value]) -> Vec<Value> {
    items
        .iter()
        .zip(keys)
        .filter(|(_, key)| keys.iter().filter(|other| equal(key, other)).count() > 1)
        .map(|(item, _)| item.clone())
        .collect()
}

/// Negative indexes count from the end; out of range yields null.
fn index(items: &[Value], idx: i64) -> Value {
    let resolved = if idx < 0 {
        items.len().checked_sub(idx.unsigned_abs() as usize)
    } else {
        Some(idx as usize)
    };
    resolved
        .and_then(|i| items.get(i))
        .cloned()
        .unwrap_or(Value::Nil)
}

fn missing_argument(id: &str) -> ResourceError {
    ResourceError::Evaluation(format!("{id} expects an argument"))
}
