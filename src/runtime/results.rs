use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    bytecode::{chunk::ChunkRef, code_bundle::CodeBundle},
    runtime::{
        resource::ResourceError,
        value::{ItemDetail, RawData, Value},
    },
};

/// Engine failures: the bundle and the executor disagree. These abort the
/// execution instead of becoming error values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    #[error("malformed code bundle: {0}")]
    Malformed(String),
    #[error("unknown operation '{id}' on {kind} at {at}")]
    UnknownOperation {
        id: String,
        kind: &'static str,
        at: ChunkRef,
    },
    #[error("execution was cancelled")]
    Cancelled,
}

/// One externally observed value: an entrypoint or datapoint of block 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawResult {
    pub code_ref: ChunkRef,
    pub label: String,
    pub data: RawData,
    /// For filter chunks, the kept items and the fields their predicate
    /// read.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<ItemDetail>,
}

/// Results of executing a bundle against one context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    pub bundle_id: String,
    pub results: BTreeMap<ChunkRef, RawResult>,
    /// Set when the execution stopped early; `results` then holds what was
    /// computed before.
    #[serde(skip)]
    pub interrupted: Option<ExecutionError>,
}

impl Execution {
    pub fn result(&self, r: ChunkRef) -> Option<&RawResult> {
        self.results.get(&r)
    }

    /// Results of the entrypoints of block 1, in bundle order.
    pub fn entrypoint_results<'a>(
        &'a self,
        bundle: &'a CodeBundle,
    ) -> impl Iterator<Item = &'a RawResult> + 'a {
        bundle
            .block(1)
            .map(|b| b.entrypoints.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(|r| self.results.get(r))
    }

    /// Distinct resource errors across all results, including those nested
    /// in blocks, in the order they are first seen.
    pub fn errors(&self) -> Vec<ResourceError> {
        let mut errors = Vec::new();
        for result in self.results.values() {
            collect_errors(&result.data, &mut errors);
        }
        errors
    }

    /// The combined error of an execution with failed values.
    pub fn error_summary(&self) -> Option<String> {
        let errors = self.errors();
        if errors.is_empty() {
            return None;
        }
        let mut out = String::from("Query encountered errors:\n");
        match errors.len() {
            1 => out.push_str("1 error occurred:\n"),
            n => out.push_str(&format!("{n} errors occurred:\n")),
        }
        for err in &errors {
            out.push_str(&format!("\t* {err}\n"));
        }
        Some(out)
    }
}

fn collect_errors(data: &RawData, errors: &mut Vec<ResourceError>) {
    match &data.value {
        Err(err) => {
            if !errors.contains(err) {
                errors.push(err.clone());
            }
        }
        Ok(Value::Block(entries)) => entries
            .iter()
            .for_each(|entry| collect_errors(&entry.data, errors)),
        Ok(Value::Array(items)) => {
            for item in items {
                if let Value::Block(entries) = item {
                    entries
                        .iter()
                        .for_each(|entry| collect_errors(&entry.data, errors));
                }
            }
        }
        Ok(_) => {}
    }
}
