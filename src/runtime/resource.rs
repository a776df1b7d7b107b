//! The contract between the executor and whatever supplies resource data.

use std::{collections::BTreeMap, fmt};

use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{runtime::value::Value, schema::Schema};

/// Identity of one resource instance. Handles with equal type and id are
/// the same instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceHandle {
    pub resource: String,
    pub id: String,
}

impl ResourceHandle {
    pub fn new(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} id = {}", self.resource, self.id)
    }
}

/// A resource or field that could not be resolved. Stored inside results,
/// so it is cheap to clone and serializable.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ResourceError {
    #[error("{resource} not found: '{id}' does not exist")]
    NotFound { resource: String, id: String },
    #[error("{resource} '{id}' is not in the recording")]
    NotInRecording { resource: String, id: String },
    #[error("field '{field}' of {resource} '{id}' has no value")]
    MissingField {
        resource: String,
        id: String,
        field: String,
    },
    #[error("failed to create resource '{resource}': {reason}")]
    CreateFailed { resource: String, reason: String },
    /// A builtin could not produce a value (division by zero, bad operand).
    #[error("{0}")]
    Evaluation(String),
    #[error("{0}")]
    Provider(String),
}

/// Notification that a previously resolved field changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invalidation {
    pub handle: ResourceHandle,
    pub field: String,
}

/// Creates resource instances and resolves their fields.
pub trait Provider: Send + Sync {
    fn schema(&self) -> &Schema;

    /// Looks up or creates the instance of `resource` described by the
    /// named constructor arguments.
    fn create_resource(
        &self,
        resource: &str,
        args: &BTreeMap<String, Value>,
    ) -> Result<ResourceHandle, ResourceError>;

    fn resolve_field(&self, handle: &ResourceHandle, field: &str) -> Result<Value, ResourceError>;

    /// Asks to be told through `events` when the field changes. Static
    /// providers never send anything.
    fn watch_field(
        &self,
        _handle: &ResourceHandle,
        _field: &str,
        _events: Sender<Invalidation>,
    ) -> Result<(), ResourceError> {
        Ok(())
    }
}

impl<P: Provider + ?Sized> Provider for std::sync::Arc<P> {
    fn schema(&self) -> &Schema {
        (**self).schema()
    }

    fn create_resource(
        &self,
        resource: &str,
        args: &BTreeMap<String, Value>,
    ) -> Result<ResourceHandle, ResourceError> {
        (**self).create_resource(resource, args)
    }

    fn resolve_field(&self, handle: &ResourceHandle, field: &str) -> Result<Value, ResourceError> {
        (**self).resolve_field(handle, field)
    }

    fn watch_field(
        &self,
        handle: &ResourceHandle,
        field: &str,
        events: Sender<Invalidation>,
    ) -> Result<(), ResourceError> {
        (**self).watch_field(handle, field, events)
    }
}
