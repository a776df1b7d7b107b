use crate::runtime::{resource::ResourceError, value::Value};

pub(super) fn call(id: &str, s: &str, args: &[Value]) -> Option<Result<Value, ResourceError>> {
    let value = match id {
        "length" => Value::Int(s.chars().count() as i64),
        "trim" => Value::String(s.trim().to_string()),
        "downcase" => Value::String(s.to_lowercase()),
        "upcase" => Value::String(s.to_uppercase()),
        "contains" | "split" => {
            let Some(arg) = args.first() else {
                return Some(Err(ResourceError::Evaluation(format!(
                    "{id} expects an argument"
                ))));
            };
            let needle = arg.to_text();
            if id == "contains" {
                Value::Bool(s.contains(needle.as_str()))
            } else {
                Value::Array(
                    s.split(needle.as_str())
                        .map(|part| Value::String(part.to_string()))
                        .collect(),
                )
            }
        }
        _ => return None,
    };
    Some(Ok(value))
}
