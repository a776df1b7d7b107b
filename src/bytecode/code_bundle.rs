use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{
    chunk::{Chunk, ChunkRef, Primitive},
    template::MessageTemplate,
};

/// A flat, ordered program fragment: the top-level query or the body of a
/// nested block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub chunks: Vec<Chunk>,
    pub entrypoints: Vec<ChunkRef>,
    /// Extra values surfaced for assessments of this block's assertions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub datapoints: Vec<ChunkRef>,
    /// Number of self bindings injected by the opening chunk (0 or 1).
    pub parameters: u32,
}

impl Block {
    pub fn chunk(&self, idx: u32) -> Option<&Chunk> {
        idx.checked_sub(1)
            .and_then(|i| self.chunks.get(i as usize))
    }

    /// The value a block "returns" to filters and conditions: its last
    /// entrypoint.
    pub fn last_entrypoint(&self) -> Option<ChunkRef> {
        self.entrypoints.last().copied()
    }
}

/// How the assessment evaluator interprets an assertion entrypoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AssertionKind {
    /// `actual <operator> expected`
    Comparison {
        operator: String,
        actual: ChunkRef,
        expected: Primitive,
    },
    /// `all`, `none`, `any` or `one` over `source`; `offending` holds the
    /// items that make the quantifier fail.
    Quantifier {
        quantifier: String,
        offending: ChunkRef,
        source: ChunkRef,
    },
    /// Any other boolean expression.
    Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assertion {
    pub kind: AssertionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<MessageTemplate>,
}

impl Assertion {
    /// Chunks whose values the evaluator needs besides the assertion
    /// itself.
    pub fn datapoints(&self) -> Vec<ChunkRef> {
        match &self.kind {
            AssertionKind::Comparison {
                actual, expected, ..
            } => {
                let mut refs = vec![*actual];
                refs.extend(expected.as_ref());
                refs
            }
            AssertionKind::Quantifier {
                offending, source, ..
            } => {
                if offending == source {
                    vec![*source]
                } else {
                    vec![*offending, *source]
                }
            }
            AssertionKind::Value => Vec::new(),
        }
    }
}

/// The compiled, immutable program.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodeBundle {
    /// Hex SHA-256 of the source and the rendered blocks.
    pub id: String,
    pub source: String,
    pub blocks: Vec<Block>,
    /// Display labels for every entrypoint and datapoint.
    pub labels: BTreeMap<ChunkRef, String>,
    pub assertions: BTreeMap<ChunkRef, Assertion>,
}

impl CodeBundle {
    pub fn block(&self, idx: u32) -> Option<&Block> {
        idx.checked_sub(1)
            .and_then(|i| self.blocks.get(i as usize))
    }

    pub fn chunk(&self, r: ChunkRef) -> Option<&Chunk> {
        self.block(r.block).and_then(|b| b.chunk(r.chunk))
    }

    pub fn label(&self, r: ChunkRef) -> &str {
        self.labels.get(&r).map(String::as_str).unwrap_or_default()
    }

    pub fn chunk_count(&self) -> usize {
        self.blocks.iter().map(|b| b.chunks.len()).sum()
    }

    /// Textual rendering of every block, stable enough for golden tests.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for (idx, block) in self.blocks.iter().enumerate() {
            out.push_str(&format!("-> block {}\n", idx + 1));
            out.push_str(&format!("   entrypoints: {}\n", render_refs(&block.entrypoints)));
            if !block.datapoints.is_empty() {
                out.push_str(&format!("   datapoints: {}\n", render_refs(&block.datapoints)));
            }
            for (chunk_idx, chunk) in block.chunks.iter().enumerate() {
                out.push_str(&format!("   {}: {}\n", chunk_idx + 1, chunk.render("   ")));
            }
        }
        out
    }

    pub(crate) fn compute_id(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.source.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.dump().as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

fn render_refs(refs: &[ChunkRef]) -> String {
    let parts: Vec<String> = refs.iter().map(|r| r.to_string()).collect();
    format!("[{}]", parts.join(", "))
}
