//! Captures what a provider answered so it can be replayed offline with
//! [`MockProvider::from_recording`](super::MockProvider::from_recording).

use std::{
    collections::BTreeMap,
    path::Path,
    sync::{Mutex, PoisonError},
};

use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    runtime::{
        resource::{Invalidation, Provider, ResourceError, ResourceHandle},
        value::Value,
    },
    schema::{LoadError, Schema, read_document},
};

/// `type -> id -> field -> value`, the same shape the TOML mock uses.
pub type RecordedResources = BTreeMap<String, BTreeMap<String, BTreeMap<String, serde_json::Value>>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordedAsset {
    pub name: String,
    #[serde(default)]
    pub resources: RecordedResources,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    #[serde(default)]
    pub assets: Vec<RecordedAsset>,
}

impl Recording {
    pub fn asset(&self, name: &str) -> Option<&RecordedAsset> {
        self.assets.iter().find(|asset| asset.name == name)
    }

    /// Adds an asset, replacing an earlier one of the same name.
    pub fn push(&mut self, asset: RecordedAsset) {
        self.assets.retain(|a| a.name != asset.name);
        self.assets.push(asset);
    }

    pub fn from_json(document: &str) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(document)?)
    }

    pub fn load(path: &Path) -> Result<Self, LoadError> {
        Self::from_json(&read_document(path)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), LoadError> {
        let document = serde_json::to_string_pretty(self)?;
        std::fs::write(path, document).map_err(|source| LoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        info!(
            path = %path.display(),
            assets = self.assets.len(),
            "stored recording"
        );
        Ok(())
    }
}

/// Wraps a provider and records every instance it creates and every field
/// it resolves.
pub struct Recorder<P> {
    inner: P,
    asset: String,
    resources: Mutex<RecordedResources>,
}

impl<P: Provider> Recorder<P> {
    pub fn new(inner: P, asset: impl Into<String>) -> Self {
        Self {
            inner,
            asset: asset.into(),
            resources: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn recorded(&self) -> RecordedAsset {
        RecordedAsset {
            name: self.asset.clone(),
            resources: self
                .resources
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
        }
    }

    fn record(&self, handle: &ResourceHandle, field: &str, value: serde_json::Value) {
        self.resources
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(handle.resource.clone())
            .or_default()
            .entry(handle.id.clone())
            .or_default()
            .insert(field.to_string(), value);
    }

    /// Registers every instance a resolved value points at, so replay can
    /// turn the stored ids back into handles.
    fn record_referenced(&self, value: &Value) {
        match value {
            Value::Resource(handle) => {
                self.resources
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .entry(handle.resource.clone())
                    .or_default()
                    .entry(handle.id.clone())
                    .or_default();
            }
            Value::Array(items) => items.iter().for_each(|item| self.record_referenced(item)),
            Value::Map(entries) => entries.values().for_each(|item| self.record_referenced(item)),
            _ => {}
        }
    }
}

impl<P: Provider> Provider for Recorder<P> {
    fn schema(&self) -> &Schema {
        self.inner.schema()
    }

    fn create_resource(
        &self,
        resource: &str,
        args: &BTreeMap<String, Value>,
    ) -> Result<ResourceHandle, ResourceError> {
        let handle = self.inner.create_resource(resource, args)?;
        let mut resources = self
            .resources
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let fields = resources
            .entry(handle.resource.clone())
            .or_default()
            .entry(handle.id.clone())
            .or_default();
        for (name, value) in args {
            fields.entry(name.clone()).or_insert_with(|| value.to_json());
        }
        Ok(handle)
    }

    fn resolve_field(&self, handle: &ResourceHandle, field: &str) -> Result<Value, ResourceError> {
        let resolved = self.inner.resolve_field(handle, field);
        let recorded = match &resolved {
            Ok(value) => {
                self.record_referenced(value);
                value.to_json()
            }
            Err(err) => serde_json::json!({ "error": err.to_string() }),
        };
        self.record(handle, field, recorded);
        resolved
    }

    fn watch_field(
        &self,
        handle: &ResourceHandle,
        field: &str,
        events: Sender<Invalidation>,
    ) -> Result<(), ResourceError> {
        self.inner.watch_field(handle, field, events)
    }
}
