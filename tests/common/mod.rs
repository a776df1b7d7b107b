#![allow(dead_code)]

use std::{
    collections::BTreeMap,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use mql::{
    CodeBundle, CompilerConfig, ExecutionContext, Features, Provider, Schema, compile, execute,
    providers::MockProvider,
    runtime::{Execution, ResourceError, ResourceHandle, Value},
};

pub const SCHEMA: &str = include_str!("../fixtures/schema.json");
pub const ARCH: &str = include_str!("../fixtures/arch.toml");

pub fn schema() -> Schema {
    Schema::from_json(SCHEMA).unwrap_or_else(|err| panic!("fixture schema: {err}"))
}

pub fn arch() -> MockProvider {
    MockProvider::from_toml(schema(), ARCH).unwrap_or_else(|err| panic!("fixture mock: {err}"))
}

pub fn context(provider: impl Provider + 'static) -> ExecutionContext {
    ExecutionContext::new(Arc::new(provider), Features::none()).named("arch")
}

pub fn compile_ok(source: &str) -> CodeBundle {
    compile(source, &schema(), &CompilerConfig::default())
        .unwrap_or_else(|err| panic!("failed to compile {source:?}: {err}"))
}

/// Compiles and runs `source` against the Arch fixture.
pub fn run(source: &str) -> (CodeBundle, Execution) {
    let bundle = compile_ok(source);
    let execution = execute(&bundle, &context(arch()))
        .unwrap_or_else(|err| panic!("failed to execute {source:?}: {err}"));
    (bundle, execution)
}

/// Wraps a provider and counts field resolutions per `type.field`.
pub struct CountingProvider<P> {
    inner: P,
    resolved: AtomicUsize,
    calls: std::sync::Mutex<BTreeMap<String, usize>>,
}

impl<P: Provider> CountingProvider<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            resolved: AtomicUsize::new(0),
            calls: Default::default(),
        }
    }

    pub fn total(&self) -> usize {
        self.resolved.load(Ordering::SeqCst)
    }

    pub fn calls(&self, key: &str) -> usize {
        self.calls.lock().unwrap().get(key).copied().unwrap_or_default()
    }
}

impl<P: Provider> Provider for CountingProvider<P> {
    fn schema(&self) -> &Schema {
        self.inner.schema()
    }

    fn create_resource(
        &self,
        resource: &str,
        args: &BTreeMap<String, Value>,
    ) -> Result<ResourceHandle, ResourceError> {
        self.inner.create_resource(resource, args)
    }

    fn resolve_field(&self, handle: &ResourceHandle, field: &str) -> Result<Value, ResourceError> {
        self.resolved.fetch_add(1, Ordering::SeqCst);
        *self
            .calls
            .lock()
            .unwrap()
            .entry(format!("{}.{field}", handle.resource))
            .or_default() += 1;
        self.inner.resolve_field(handle, field)
    }
}
