use std::collections::{BTreeMap, HashMap};

use thiserror::Error;

use crate::{
    runtime::{
        resource::{Provider, ResourceError, ResourceHandle},
        value::Value,
    },
    schema::Schema,
};

type Constructor =
    Box<dyn Fn(&BTreeMap<String, Value>) -> Result<String, ResourceError> + Send + Sync>;
type FieldResolver = Box<dyn Fn(&ResourceHandle) -> Result<Value, ResourceError> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("resource '{0}' is not in the schema")]
    UnknownResource(String),
    #[error("resource '{resource}' has no field '{field}' in the schema")]
    UnknownField { resource: String, field: String },
}

/// Provider assembled from typed constructor and field functions, each
/// checked against the schema when registered.
pub struct ResourceRegistry {
    schema: Schema,
    constructors: HashMap<String, Constructor>,
    fields: HashMap<(String, String), FieldResolver>,
}

impl ResourceRegistry {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            constructors: HashMap::new(),
            fields: HashMap::new(),
        }
    }

    /// Registers how to turn constructor arguments into an instance id.
    /// Resources without a constructor are singletons whose id is their
    /// name.
    pub fn constructor<F>(mut self, resource: &str, constructor: F) -> Result<Self, RegistryError>
    where
        F: Fn(&BTreeMap<String, Value>) -> Result<String, ResourceError> + Send + Sync + 'static,
    {
        if !self.schema.contains(resource) {
            return Err(RegistryError::UnknownResource(resource.to_string()));
        }
        self.constructors
            .insert(resource.to_string(), Box::new(constructor));
        Ok(self)
    }

    pub fn field<F>(mut self, resource: &str, field: &str, resolver: F) -> Result<Self, RegistryError>
    where
        F: Fn(&ResourceHandle) -> Result<Value, ResourceError> + Send + Sync + 'static,
    {
        let info = self
            .schema
            .resource(resource)
            .ok_or_else(|| RegistryError::UnknownResource(resource.to_string()))?;
        if info.field_type(field).is_none() {
            return Err(RegistryError::UnknownField {
                resource: resource.to_string(),
                field: field.to_string(),
            });
        }
        self.fields
            .insert((resource.to_string(), field.to_string()), Box::new(resolver));
        Ok(self)
    }
}

impl Provider for ResourceRegistry {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn create_resource(
        &self,
        resource: &str,
        args: &BTreeMap<String, Value>,
    ) -> Result<ResourceHandle, ResourceError> {
        let info = self
            .schema
            .resource(resource)
            .ok_or_else(|| ResourceError::CreateFailed {
                resource: resource.to_string(),
                reason: "unknown resource".to_string(),
            })?;
        if let Some(unknown) = args.keys().find(|name| !info.init.iter().any(|a| &a.name == *name)) {
            return Err(ResourceError::CreateFailed {
                resource: resource.to_string(),
                reason: format!("unknown argument '{unknown}'"),
            });
        }

        let id = match self.constructors.get(resource) {
            Some(constructor) => constructor(args)?,
            None if args.is_empty() => resource.to_string(),
            None => {
                return Err(ResourceError::CreateFailed {
                    resource: resource.to_string(),
                    reason: "resource takes no arguments".to_string(),
                });
            }
        };
        Ok(ResourceHandle::new(resource, id))
    }

    fn resolve_field(&self, handle: &ResourceHandle, field: &str) -> Result<Value, ResourceError> {
        let resolver = self
            .fields
            .get(&(handle.resource.clone(), field.to_string()))
            .ok_or_else(|| ResourceError::MissingField {
                resource: handle.resource.clone(),
                id: handle.id.clone(),
                field: field.to_string(),
            })?;
        resolver(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{bytecode::types::Type, schema::ResourceInfo};

    fn schema() -> Schema {
        Schema::new()
            .with(ResourceInfo::new("mondoo").field("version", Type::String))
            .with(
                ResourceInfo::new("file")
                    .init_arg("path", Type::String)
                    .field("size", Type::Int),
            )
    }

    #[test]
    fn rejects_registrations_outside_the_schema() {
        let err = ResourceRegistry::new(schema())
            .field("mondoo", "build", |_| Ok(Value::Nil))
            .err();
        assert_eq!(
            err,
            Some(RegistryError::UnknownField {
                resource: "mondoo".into(),
                field: "build".into()
            })
        );
        assert!(ResourceRegistry::new(schema())
            .constructor("process", |_| Ok(String::new()))
            .is_err());
    }

    #[test]
    fn resolves_through_registered_functions() {
        let registry = ResourceRegistry::new(schema())
            .constructor("file", |args| match args.get("path") {
                Some(Value::String(path)) => Ok(path.clone()),
                _ => Err(ResourceError::CreateFailed {
                    resource: "file".into(),
                    reason: "missing path".into(),
                }),
            })
            .and_then(|r| r.field("file", "size", |h| Ok(Value::Int(h.id.len() as i64))))
            .unwrap();

        let args = BTreeMap::from([("path".to_string(), Value::String("/etc".into()))]);
        let handle = registry.create_resource("file", &args).unwrap();
        assert_eq!(handle, ResourceHandle::new("file", "/etc"));
        assert_eq!(registry.resolve_field(&handle, "size"), Ok(Value::Int(4)));

        let singleton = registry.create_resource("mondoo", &BTreeMap::new()).unwrap();
        assert_eq!(singleton.id, "mondoo");
        assert!(matches!(
            registry.resolve_field(&singleton, "version"),
            Err(ResourceError::MissingField { .. })
        ));
    }
}
