//! Resource schema: the field and type catalogue the compiler resolves
//! identifiers against.

use std::{collections::BTreeMap, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bytecode::types::Type;

/// Name of the implicit field that lists the members of a list resource.
pub const LIST_FIELD: &str = "list";

/// Failure to load a schema, mock or recording document.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid json document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid toml document: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("{0}")]
    Invalid(String),
}

pub(crate) fn read_document(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitArg {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldInfo {
    #[serde(rename = "type")]
    pub ty: Type,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceInfo {
    #[serde(skip)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Constructor arguments, in positional order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub init: Vec<InitArg>,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldInfo>,
    /// Element type of a list resource (`users` lists `user`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list: Option<Type>,
}

impl ResourceInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn init_arg(mut self, name: impl Into<String>, ty: Type) -> Self {
        self.init.push(InitArg {
            name: name.into(),
            ty,
        });
        self
    }

    pub fn field(mut self, name: impl Into<String>, ty: Type) -> Self {
        self.fields.insert(name.into(), FieldInfo { ty, title: None });
        self
    }

    pub fn list_of(mut self, element: Type) -> Self {
        self.list = Some(element);
        self
    }

    /// Type of a field, including the implicit `list` field of list
    /// resources.
    pub fn field_type(&self, field: &str) -> Option<Type> {
        if let Some(info) = self.fields.get(field) {
            return Some(info.ty.clone());
        }
        match (&self.list, field) {
            (Some(element), LIST_FIELD) => Some(Type::array(element.clone())),
            _ => None,
        }
    }

    pub fn field_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.fields.keys().cloned().collect();
        if self.list.is_some() && !self.fields.contains_key(LIST_FIELD) {
            names.push(LIST_FIELD.to_string());
        }
        names
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default)]
    resources: BTreeMap<String, ResourceInfo>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, info: ResourceInfo) -> Self {
        self.add(info);
        self
    }

    pub fn add(&mut self, info: ResourceInfo) {
        self.resources.insert(info.name.clone(), info);
    }

    pub fn resource(&self, name: &str) -> Option<&ResourceInfo> {
        self.resources.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resources.contains_key(name)
    }

    pub fn resources(&self) -> impl Iterator<Item = &ResourceInfo> {
        self.resources.values()
    }

    pub fn resource_names(&self) -> Vec<String> {
        self.resources.keys().cloned().collect()
    }

    /// Whether any resource name starts with `prefix.` (`sshd` for
    /// `sshd.config`).
    pub fn has_namespace(&self, prefix: &str) -> bool {
        let prefix = format!("{prefix}.");
        self.resources.keys().any(|name| name.starts_with(&prefix))
    }

    pub fn from_json(document: &str) -> Result<Self, LoadError> {
        let mut schema: Schema = serde_json::from_str(document)?;
        for (name, info) in schema.resources.iter_mut() {
            info.name = name.clone();
        }
        schema.validate()?;
        Ok(schema)
    }

    pub fn load(path: &Path) -> Result<Self, LoadError> {
        Self::from_json(&read_document(path)?)
    }

    /// Checks that every resource type mentioned by a field, constructor
    /// argument or list element is itself declared.
    pub fn validate(&self) -> Result<(), LoadError> {
        for info in self.resources.values() {
            let mentioned = info
                .fields
                .values()
                .map(|f| &f.ty)
                .chain(info.init.iter().map(|arg| &arg.ty))
                .chain(info.list.iter());
            for ty in mentioned {
                if let Some(missing) = self.undeclared_resource(ty) {
                    return Err(LoadError::Invalid(format!(
                        "resource '{}' refers to undeclared resource '{}'",
                        info.name, missing
                    )));
                }
            }
        }
        Ok(())
    }

    fn undeclared_resource<'a>(&self, ty: &'a Type) -> Option<&'a str> {
        match ty {
            Type::Resource(name) if !self.contains(name) => Some(name),
            Type::Array(inner) | Type::Function(inner) => self.undeclared_resource(inner),
            Type::Map(key, value) => self
                .undeclared_resource(key)
                .or_else(|| self.undeclared_resource(value)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"{
        "resources": {
            "users": { "list": "user" },
            "user": {
                "init": [{ "name": "name", "type": "string" }],
                "fields": {
                    "name": { "type": "string" },
                    "uid": { "type": "int" }
                }
            }
        }
    }"#;

    #[test]
    fn loads_json_schema() {
        let schema = Schema::from_json(DOCUMENT).unwrap();
        let users = schema.resource("users").unwrap();
        assert_eq!(users.name, "users");
        assert_eq!(
            users.field_type(LIST_FIELD),
            Some(Type::array(Type::resource("user")))
        );
        let user = schema.resource("user").unwrap();
        assert_eq!(user.init[0].name, "name");
        assert_eq!(user.field_type("uid"), Some(Type::Int));
        assert_eq!(user.field_type("list"), None);
    }

    #[test]
    fn rejects_undeclared_resource_types() {
        let err = Schema::from_json(r#"{"resources": {"users": {"list": "user"}}}"#).unwrap_err();
        assert_eq!(
            err.to_string(),
            "resource 'users' refers to undeclared resource 'user'"
        );
    }

    #[test]
    fn detects_namespaces() {
        let schema = Schema::new().with(ResourceInfo::new("sshd.config"));
        assert!(schema.has_namespace("sshd"));
        assert!(!schema.has_namespace("sshd.config"));
    }
}
