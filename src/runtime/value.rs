use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use crate::{
    bytecode::{chunk::ChunkRef, types::Type},
    runtime::resource::{ResourceError, ResourceHandle},
};

/// Runtime value of a chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Regex(String),
    Array(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Resource(ResourceHandle),
    /// Results of a nested block, one entry per block entrypoint.
    Block(Vec<BlockEntry>),
}

impl Value {
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(x) => *x != 0.0,
            Value::String(s) | Value::Regex(s) => !s.is_empty(),
            Value::Array(items) => !items.is_empty(),
            Value::Map(entries) => !entries.is_empty(),
            Value::Resource(_) => true,
            Value::Block(entries) => entries.iter().all(|e| e.data.is_truthy()),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Value::Nil => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Regex(_) => "regex",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Resource(_) => "resource",
            Value::Block(_) => "block",
        }
    }

    /// Plain rendering used when values are spliced into text: strings are
    /// not quoted.
    pub fn to_text(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Converts a JSON document value. Objects become maps, everything else
    /// maps onto the matching scalar.
    pub fn from_json(value: &serde_json::Value) -> Value {
        match value {
            serde_json::Value::Null => Value::Nil,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or_default()),
            },
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => {
                Value::Array(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(entries) => Value::Map(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Inverse of [`Value::from_json`]. Resources are written as their id
    /// and blocks as a map from label to value.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Nil => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(x) => serde_json::Value::from(*x),
            Value::String(s) | Value::Regex(s) => serde_json::Value::String(s.clone()),
            Value::Array(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(entries) => serde_json::Value::Object(
                entries.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            Value::Resource(handle) => serde_json::Value::String(handle.id.clone()),
            Value::Block(entries) => serde_json::Value::Object(
                entries
                    .iter()
                    .map(|e| {
                        let value = match &e.data.value {
                            Ok(v) => v.to_json(),
                            Err(err) => serde_json::json!({ "error": err.to_string() }),
                        };
                        (e.label.clone(), value)
                    })
                    .collect(),
            ),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Regex(r) => write!(f, "/{r}/"),
            Value::Array(items) => {
                write!(f, "[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (idx, (key, value)) in entries.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                write!(f, "}}")
            }
            Value::Resource(handle) => write!(f, "{handle}"),
            Value::Block(entries) => {
                write!(f, "{{")?;
                for (idx, entry) in entries.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    match &entry.data.value {
                        Ok(value) => write!(f, "{}: {value}", entry.label)?,
                        Err(err) => write!(f, "{}: error: {err}", entry.label)?,
                    }
                }
                write!(f, "}}")
            }
        }
    }
}

/// A typed value or the error that prevented computing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawData {
    #[serde(rename = "type")]
    pub ty: Type,
    pub value: Result<Value, ResourceError>,
}

impl RawData {
    pub fn new(ty: Type, value: Value) -> Self {
        Self { ty, value: Ok(value) }
    }

    pub fn error(ty: Type, error: ResourceError) -> Self {
        Self {
            ty,
            value: Err(error),
        }
    }

    pub fn from_result(ty: Type, value: Result<Value, ResourceError>) -> Self {
        Self { ty, value }
    }

    pub fn nil(ty: Type) -> Self {
        Self::new(ty, Value::Nil)
    }

    pub fn is_truthy(&self) -> bool {
        self.value.as_ref().is_ok_and(Value::is_truthy)
    }

    pub fn error_ref(&self) -> Option<&ResourceError> {
        self.value.as_ref().err()
    }
}

/// One entrypoint result of a nested block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockEntry {
    pub label: String,
    pub reference: ChunkRef,
    pub data: RawData,
    /// Values the entry's `@msg` assertion reads, when it has one.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub datapoints: Vec<BlockEntry>,
}

/// An item kept by a filter, with the fields its predicate read from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDetail {
    pub item: Value,
    pub fields: Vec<BlockEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness_follows_emptiness() {
        assert!(!Value::Nil.is_truthy());
        assert!(!Value::Array(vec![]).is_truthy());
        assert!(Value::Array(vec![Value::Nil]).is_truthy());
        assert!(!Value::String(String::new()).is_truthy());
        assert!(Value::Int(-1).is_truthy());
        assert!(!RawData::error(Type::Bool, ResourceError::Provider("x".into())).is_truthy());
    }

    #[test]
    fn json_conversion_keeps_structure() {
        let json = serde_json::json!({ "a": [1, 2.5, "x", null, true] });
        let value = Value::from_json(&json);
        assert_eq!(value.to_string(), "{a: [1, 2.5, \"x\", null, true]}");
        assert_eq!(value.to_json(), json);
    }
}
