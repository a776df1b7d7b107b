use std::{
    collections::{BTreeMap, HashSet},
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
};

use crossbeam_channel::{Receiver, Sender, unbounded};
use tracing::{debug, warn};

use crate::{
    config::{Feature, Features},
    runtime::{
        cache::{CacheStats, ResourceCache},
        resource::{Invalidation, Provider, ResourceError, ResourceHandle},
        value::Value,
    },
    schema::Schema,
};

/// Cooperative cancellation flag, checked by the executor between chunks.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Everything one execution target needs: its provider, its own cache, the
/// enabled features and a cancellation flag.
pub struct ExecutionContext {
    name: String,
    provider: Arc<dyn Provider>,
    cache: ResourceCache,
    features: Features,
    cancel: CancelToken,
    events: (Sender<Invalidation>, Receiver<Invalidation>),
    watched: Mutex<HashSet<(ResourceHandle, String)>>,
}

impl ExecutionContext {
    pub fn new(provider: Arc<dyn Provider>, features: Features) -> Self {
        Self {
            name: String::new(),
            provider,
            cache: ResourceCache::new(),
            features,
            cancel: CancelToken::new(),
            events: unbounded(),
            watched: Mutex::new(HashSet::new()),
        }
    }

    /// Names the target, used in logs and recordings.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Schema {
        self.provider.schema()
    }

    pub fn features(&self) -> &Features {
        &self.features
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Sender for field invalidations. Providers get a clone through
    /// [`Provider::watch_field`]; tests and embedders may push directly.
    pub fn invalidations(&self) -> Sender<Invalidation> {
        self.events.0.clone()
    }

    pub fn create_resource(
        &self,
        resource: &str,
        args: &BTreeMap<String, Value>,
    ) -> Result<ResourceHandle, ResourceError> {
        let key = format!("{resource}{}", Value::Map(args.clone()));
        self.cache
            .resource_or_create(&key, || self.provider.create_resource(resource, args))
    }

    /// Resolves a field through the cache. With the watch feature, fields
    /// computed for the first time are registered with the provider.
    pub fn field(&self, handle: &ResourceHandle, field: &str) -> Result<Value, ResourceError> {
        let (value, computed) = self.cache.field_or_compute(handle, field, || {
            debug!(resource = %handle.resource, id = %handle.id, field, "resolving field");
            self.provider.resolve_field(handle, field)
        });
        if computed && self.features.is_enabled(Feature::Watch) {
            self.watch(handle, field);
        }
        value
    }

    fn watch(&self, handle: &ResourceHandle, field: &str) {
        let key = (handle.clone(), field.to_string());
        let fresh = self
            .watched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key);
        if !fresh {
            return;
        }
        if let Err(err) = self
            .provider
            .watch_field(handle, field, self.events.0.clone())
        {
            warn!(resource = %handle.resource, id = %handle.id, field, error = %err, "failed to watch field");
        }
    }

    /// Applies pending invalidations and returns how many cached fields
    /// they dropped.
    pub fn apply_invalidations(&self) -> usize {
        let mut dropped = 0;
        for event in self.events.1.try_iter() {
            if self.cache.invalidate(&event.handle, &event.field) {
                debug!(resource = %event.handle.resource, id = %event.handle.id, field = %event.field, "field invalidated");
                dropped += 1;
            }
        }
        dropped
    }

    /// Forgets every memoized resource and field.
    pub fn reset(&self) {
        self.cache.clear();
        self.watched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("name", &self.name)
            .field("features", &self.features)
            .field("cancelled", &self.is_cancelled())
            .finish_non_exhaustive()
    }
}
