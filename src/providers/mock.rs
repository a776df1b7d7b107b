//! Replays a fixed data set, from a TOML document or a recording.
//!
//! ```toml
//! [mondoo.mondoo]
//! version = "unstable"
//!
//! [users.users]
//! list = ["root", "bin"]
//!
//! [user.root]
//! name = "root"
//! uid = 0
//!
//! ["sshd.config"."/etc/ssh/sshd_config"]
//! params = { Port = "22" }
//! ```
//!
//! Tables are `type -> id -> field`. Resource-typed fields hold instance
//! ids, and `{ error = "..." }` records a failed field.

use std::{collections::BTreeMap, path::Path};

use serde_json::{Map, Value as Json};

use crate::{
    bytecode::types::Type,
    providers::recording::Recording,
    runtime::{
        resource::{Provider, ResourceError, ResourceHandle},
        value::Value,
    },
    schema::{LoadError, Schema, read_document},
};

type Instances = BTreeMap<String, Map<String, Json>>;

pub struct MockProvider {
    schema: Schema,
    resources: BTreeMap<String, Instances>,
}

impl MockProvider {
    pub fn from_toml(schema: Schema, document: &str) -> Result<Self, LoadError> {
        let document: Json = toml::from_str(document)?;
        Self::from_document(schema, document)
    }

    pub fn load(schema: Schema, path: &Path) -> Result<Self, LoadError> {
        Self::from_toml(schema, &read_document(path)?)
    }

    /// Replays the named asset of a recording.
    pub fn from_recording(
        schema: Schema,
        recording: &Recording,
        asset: &str,
    ) -> Result<Self, LoadError> {
        let recorded = recording
            .asset(asset)
            .ok_or_else(|| LoadError::Invalid(format!("recording has no asset '{asset}'")))?;
        let document = serde_json::to_value(&recorded.resources)?;
        Self::from_document(schema, document)
    }

    fn from_document(schema: Schema, document: Json) -> Result<Self, LoadError> {
        let Json::Object(types) = document else {
            return Err(LoadError::Invalid("mock data must be a table of resources".into()));
        };

        let mut resources = BTreeMap::new();
        for (resource, instances) in types {
            if !schema.contains(&resource) {
                return Err(LoadError::Invalid(format!(
                    "unknown resource '{resource}' in mock data (quote dotted names such as \"sshd.config\")"
                )));
            }
            let Json::Object(instances) = instances else {
                return Err(LoadError::Invalid(format!(
                    "instances of '{resource}' must be a table keyed by id"
                )));
            };
            let mut parsed = Instances::new();
            for (id, fields) in instances {
                let Json::Object(fields) = fields else {
                    return Err(LoadError::Invalid(format!(
                        "fields of {resource} '{id}' must be a table"
                    )));
                };
                parsed.insert(id, fields);
            }
            resources.insert(resource, parsed);
        }
        Ok(Self { schema, resources })
    }

    fn instance(&self, resource: &str, id: &str) -> Option<&Map<String, Json>> {
        self.resources.get(resource).and_then(|i| i.get(id))
    }

    /// Finds the id of the instance described by `args`: by the value of
    /// the first constructor argument as id, then by matching every
    /// argument against recorded fields.
    fn find(&self, resource: &str, args: &BTreeMap<String, Value>) -> Result<String, ResourceError> {
        let empty = Instances::new();
        let instances = self.resources.get(resource).unwrap_or(&empty);

        if args.is_empty() {
            if instances.contains_key(resource) || instances.is_empty() {
                return Ok(resource.to_string());
            }
            if let [(id, _)] = instances.iter().collect::<Vec<_>>().as_slice() {
                return Ok((*id).clone());
            }
            return Err(ResourceError::CreateFailed {
                resource: resource.to_string(),
                reason: "several instances are recorded, arguments are required".to_string(),
            });
        }

        let primary = self
            .schema
            .resource(resource)
            .and_then(|info| info.init.iter().find_map(|arg| args.get(&arg.name)))
            .or_else(|| args.values().next())
            .map(Value::to_text)
            .unwrap_or_default();
        if instances.contains_key(&primary) {
            return Ok(primary);
        }

        instances
            .iter()
            .find(|(_, fields)| {
                args.iter()
                    .all(|(name, value)| fields.get(name) == Some(&value.to_json()))
            })
            .map(|(id, _)| id.clone())
            .ok_or(ResourceError::NotFound {
                resource: resource.to_string(),
                id: primary,
            })
    }

    fn typed(&self, handle: &ResourceHandle, field: &str, ty: &Type, raw: &Json) -> Result<Value, ResourceError> {
        if let Some(message) = recorded_error(raw) {
            return Err(ResourceError::Provider(message.to_string()));
        }
        let mismatch = || {
            ResourceError::Provider(format!(
                "recorded value of {}.{field} for '{}' is not {}",
                handle.resource,
                handle.id,
                ty.label()
            ))
        };

        match (ty, raw) {
            (_, Json::Null) => Ok(Value::Nil),
            (Type::Resource(resource), Json::String(id)) => {
                if self.instance(resource, id).is_none() {
                    return Err(ResourceError::NotInRecording {
                        resource: resource.clone(),
                        id: id.clone(),
                    });
                }
                Ok(Value::Resource(ResourceHandle::new(resource.clone(), id.clone())))
            }
            (Type::Array(inner), Json::Array(items)) => items
                .iter()
                .map(|item| self.typed(handle, field, inner, item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            (Type::Map(_, inner), Json::Object(entries)) => entries
                .iter()
                .map(|(key, item)| Ok((key.clone(), self.typed(handle, field, inner, item)?)))
                .collect::<Result<BTreeMap<_, _>, _>>()
                .map(Value::Map),
            (Type::Bool, Json::Bool(b)) => Ok(Value::Bool(*b)),
            (Type::Int, Json::Number(n)) => n.as_i64().map(Value::Int).ok_or_else(mismatch),
            (Type::Float, Json::Number(n)) => n.as_f64().map(Value::Float).ok_or_else(mismatch),
            (Type::String, Json::String(s)) => Ok(Value::String(s.clone())),
            (Type::Regex, Json::String(s)) => Ok(Value::Regex(s.clone())),
            (Type::Dict | Type::Any | Type::Time, other) => Ok(Value::from_json(other)),
            _ => Err(mismatch()),
        }
    }
}

fn recorded_error(raw: &Json) -> Option<&str> {
    match raw {
        Json::Object(entries) if entries.len() == 1 => entries.get("error").and_then(Json::as_str),
        _ => None,
    }
}

impl Provider for MockProvider {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn create_resource(
        &self,
        resource: &str,
        args: &BTreeMap<String, Value>,
    ) -> Result<ResourceHandle, ResourceError> {
        if !self.schema.contains(resource) {
            return Err(ResourceError::CreateFailed {
                resource: resource.to_string(),
                reason: "unknown resource".to_string(),
            });
        }
        let id = self.find(resource, args)?;
        Ok(ResourceHandle::new(resource, id))
    }

    fn resolve_field(&self, handle: &ResourceHandle, field: &str) -> Result<Value, ResourceError> {
        let instance = self.instance(&handle.resource, &handle.id).ok_or_else(|| {
            ResourceError::NotInRecording {
                resource: handle.resource.clone(),
                id: handle.id.clone(),
            }
        })?;
        let missing = || ResourceError::MissingField {
            resource: handle.resource.clone(),
            id: handle.id.clone(),
            field: field.to_string(),
        };
        let ty = self
            .schema
            .resource(&handle.resource)
            .and_then(|info| info.field_type(field))
            .ok_or_else(missing)?;
        let raw = instance.get(field).ok_or_else(missing)?;
        self.typed(handle, field, &ty, raw)
    }
}
