use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Static type of a chunk result.
///
/// Every type has a compact byte encoding used inside operator chunk ids
/// (`==` followed by the encoded type of its right operand) and a readable
/// label used by the dump, the schema documents and error messages.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Type {
    Unset,
    Any,
    Nil,
    Ref,
    Bool,
    Int,
    Float,
    String,
    Regex,
    Time,
    Dict,
    Score,
    Block,
    Empty,
    Array(Box<Type>),
    Map(Box<Type>, Box<Type>),
    Resource(String),
    Function(Box<Type>),
}

const ARRAY: char = '\u{19}';
const MAP: char = '\u{1a}';
const RESOURCE: char = '\u{1b}';
const FUNCTION: char = '\u{1c}';

impl Type {
    pub fn array(element: Type) -> Type {
        Type::Array(Box::new(element))
    }

    pub fn map(key: Type, value: Type) -> Type {
        Type::Map(Box::new(key), Box::new(value))
    }

    pub fn resource(name: impl Into<String>) -> Type {
        Type::Resource(name.into())
    }

    /// Byte encoding of the type.
    pub fn encode(&self) -> String {
        match self {
            Type::Unset => "\u{0}".to_string(),
            Type::Any => "\u{1}".to_string(),
            Type::Nil => "\u{2}".to_string(),
            Type::Ref => "\u{3}".to_string(),
            Type::Bool => "\u{4}".to_string(),
            Type::Int => "\u{5}".to_string(),
            Type::Float => "\u{6}".to_string(),
            Type::String => "\u{7}".to_string(),
            Type::Regex => "\u{8}".to_string(),
            Type::Time => "\u{9}".to_string(),
            Type::Dict => "\u{a}".to_string(),
            Type::Score => "\u{b}".to_string(),
            Type::Block => "\u{c}".to_string(),
            Type::Empty => "\u{d}".to_string(),
            Type::Array(inner) => format!("{ARRAY}{}", inner.encode()),
            Type::Map(key, value) => format!("{MAP}{}{}", key.encode(), value.encode()),
            Type::Resource(name) => format!("{RESOURCE}{name}"),
            Type::Function(ret) => format!("{FUNCTION}{}", ret.encode()),
        }
    }

    pub fn label(&self) -> String {
        match self {
            Type::Unset => "unset".to_string(),
            Type::Any => "any".to_string(),
            Type::Nil => "null".to_string(),
            Type::Ref => "ref".to_string(),
            Type::Bool => "bool".to_string(),
            Type::Int => "int".to_string(),
            Type::Float => "float".to_string(),
            Type::String => "string".to_string(),
            Type::Regex => "regex".to_string(),
            Type::Time => "time".to_string(),
            Type::Dict => "dict".to_string(),
            Type::Score => "score".to_string(),
            Type::Block => "block".to_string(),
            Type::Empty => "empty".to_string(),
            Type::Array(inner) => format!("[]{}", inner.label()),
            Type::Map(key, value) => format!("map[{}]{}", key.label(), value.label()),
            Type::Resource(name) => name.clone(),
            Type::Function(ret) => format!("function => {}", ret.label()),
        }
    }

    pub fn element(&self) -> Option<&Type> {
        match self {
            Type::Array(inner) => Some(inner),
            _ => None,
        }
    }

    pub fn resource_name(&self) -> Option<&str> {
        match self {
            Type::Resource(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Int | Type::Float)
    }

    /// Types whose values can be compared with `<`, `<=`, `>` and `>=`
    /// against a value of `other`.
    pub fn is_orderable_with(&self, other: &Type) -> bool {
        matches!(self, Type::Any | Type::Dict)
            || matches!(other, Type::Any | Type::Dict)
            || (self.is_numeric() && other.is_numeric())
            || (*self == Type::String && *other == Type::String)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown type label `{0}`")]
pub struct TypeParseError(pub String);

impl FromStr for Type {
    type Err = TypeParseError;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        let label = label.trim();
        if let Some(inner) = label.strip_prefix("[]") {
            return Ok(Type::array(inner.parse()?));
        }
        if let Some(rest) = label.strip_prefix("map[") {
            let close = rest
                .find(']')
                .ok_or_else(|| TypeParseError(label.to_string()))?;
            let key = rest[..close].parse()?;
            let value = rest[close + 1..].parse()?;
            return Ok(Type::map(key, value));
        }
        let ty = match label {
            "unset" => Type::Unset,
            "any" => Type::Any,
            "null" => Type::Nil,
            "ref" => Type::Ref,
            "bool" => Type::Bool,
            "int" => Type::Int,
            "float" => Type::Float,
            "string" => Type::String,
            "regex" => Type::Regex,
            "time" => Type::Time,
            "dict" => Type::Dict,
            "score" => Type::Score,
            "block" => Type::Block,
            "empty" => Type::Empty,
            "" => return Err(TypeParseError(label.to_string())),
            name if name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_') =>
            {
                Type::resource(name)
            }
            _ => return Err(TypeParseError(label.to_string())),
        };
        Ok(ty)
    }
}

impl Serialize for Type {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.label())
    }
}

impl<'de> Deserialize<'de> for Type {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        label.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_parse_back() {
        for label in ["int", "[]user", "map[string]int", "[]map[string][]bool", "sshd.config"] {
            let ty: Type = label.parse().unwrap();
            assert_eq!(ty.label(), label);
        }
    }

    #[test]
    fn encodes_nested_types() {
        assert_eq!(Type::Int.encode(), "\u{5}");
        assert_eq!(Type::array(Type::Int).encode(), "\u{19}\u{5}");
        assert_eq!(Type::resource("user").encode(), "\u{1b}user");
    }

    #[test]
    fn rejects_garbage_labels() {
        assert!("map[string".parse::<Type>().is_err());
        assert!("[]".parse::<Type>().is_err());
    }
}
