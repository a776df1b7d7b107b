use std::{
    collections::HashMap,
    sync::{
        PoisonError, RwLock,
        atomic::{AtomicUsize, Ordering},
    },
};

use crate::runtime::{
    resource::{ResourceError, ResourceHandle},
    value::Value,
};

type FieldKey = (ResourceHandle, String);

/// Memoized resources and fields of one execution context.
///
/// A field is computed at most once: the computation runs under the write
/// lock, so concurrent readers of the same context wait for the first
/// writer instead of asking the provider again.
#[derive(Debug, Default)]
pub struct ResourceCache {
    resources: RwLock<HashMap<String, Result<ResourceHandle, ResourceError>>>,
    fields: RwLock<HashMap<FieldKey, Result<Value, ResourceError>>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

/// Hit and miss counters of a [`ResourceCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
}

impl ResourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached creation result for `key`, or runs `create` and
    /// stores its result.
    pub fn resource_or_create(
        &self,
        key: &str,
        create: impl FnOnce() -> Result<ResourceHandle, ResourceError>,
    ) -> Result<ResourceHandle, ResourceError> {
        if let Some(found) = self
            .resources
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
        {
            return found.clone();
        }

        let mut resources = self.resources.write().unwrap_or_else(PoisonError::into_inner);
        resources
            .entry(key.to_string())
            .or_insert_with(create)
            .clone()
    }

    /// Returns the cached field value and `false`, or computes it and
    /// returns it with `true`.
    pub fn field_or_compute(
        &self,
        handle: &ResourceHandle,
        field: &str,
        compute: impl FnOnce() -> Result<Value, ResourceError>,
    ) -> (Result<Value, ResourceError>, bool) {
        let key = (handle.clone(), field.to_string());
        if let Some(found) = self
            .fields
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return (found.clone(), false);
        }

        let mut fields = self.fields.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(found) = fields.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return (found.clone(), false);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        let value = compute();
        fields.insert(key, value.clone());
        (value, true)
    }

    /// Drops a memoized field so the next read asks the provider again.
    /// Returns whether anything was cached.
    pub fn invalidate(&self, handle: &ResourceHandle, field: &str) -> bool {
        self.fields
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&(handle.clone(), field.to_string()))
            .is_some()
    }

    pub fn clear(&self) {
        self.resources
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.fields
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn computes_each_field_once() {
        let cache = ResourceCache::new();
        let handle = ResourceHandle::new("mondoo", "mondoo");
        let calls = Cell::new(0);
        let compute = || {
            calls.set(calls.get() + 1);
            Ok(Value::String("unstable".into()))
        };

        let (first, computed) = cache.field_or_compute(&handle, "version", compute);
        assert!(computed);
        let (second, computed) = cache.field_or_compute(&handle, "version", compute);
        assert!(!computed);
        assert_eq!(first, second);
        assert_eq!(calls.get(), 1);
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 1 });
    }

    #[test]
    fn invalidation_forces_recompute() {
        let cache = ResourceCache::new();
        let handle = ResourceHandle::new("file", "/etc/hosts");
        cache.field_or_compute(&handle, "size", || Ok(Value::Int(1)));
        assert!(cache.invalidate(&handle, "size"));
        assert!(!cache.invalidate(&handle, "size"));

        let (value, computed) = cache.field_or_compute(&handle, "size", || Ok(Value::Int(2)));
        assert!(computed);
        assert_eq!(value, Ok(Value::Int(2)));
    }

    #[test]
    fn errors_are_memoized_too() {
        let cache = ResourceCache::new();
        let err = ResourceError::NotFound {
            resource: "file".into(),
            id: "zzz".into(),
        };
        let created = cache.resource_or_create("file(zzz)", || Err(err.clone()));
        assert_eq!(created, Err(err.clone()));
        let again = cache.resource_or_create("file(zzz)", || {
            Ok(ResourceHandle::new("file", "zzz"))
        });
        assert_eq!(again, Err(err));
    }
}
