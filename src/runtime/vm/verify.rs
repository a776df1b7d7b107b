use std::collections::HashMap;

use crate::{
    bytecode::{chunk::ChunkRef, code_bundle::CodeBundle},
    runtime::results::ExecutionError,
};

/// Checks the structural guarantees the executor relies on: every block
/// except block 1 is opened by exactly one chunk of an earlier block, and
/// every ref points at an earlier chunk of its own block or into an
/// enclosing block.
pub(super) fn verify(bundle: &CodeBundle) -> Result<(), ExecutionError> {
    if bundle.blocks.is_empty() {
        return Err(ExecutionError::Malformed("bundle has no blocks".into()));
    }

    let count = bundle.blocks.len() as u32;
    let mut parents: HashMap<u32, u32> = HashMap::new();
    for (idx, block) in bundle.blocks.iter().enumerate() {
        let block_idx = idx as u32 + 1;
        for (chunk_idx, chunk) in block.chunks.iter().enumerate() {
            for child in chunk.blocks() {
                let at = ChunkRef::new(block_idx, chunk_idx as u32 + 1);
                if child <= block_idx || child > count {
                    return Err(ExecutionError::Malformed(format!(
                        "chunk {at} opens invalid block {child}"
                    )));
                }
                if parents.insert(child, block_idx).is_some() {
                    return Err(ExecutionError::Malformed(format!(
                        "block {child} is opened more than once"
                    )));
                }
            }
        }
    }

    let is_ancestor = |ancestor: u32, mut block: u32| {
        while let Some(parent) = parents.get(&block) {
            if *parent == ancestor {
                return true;
            }
            block = *parent;
        }
        false
    };

    for (idx, block) in bundle.blocks.iter().enumerate() {
        let block_idx = idx as u32 + 1;
        if block_idx > 1 && !parents.contains_key(&block_idx) {
            return Err(ExecutionError::Malformed(format!(
                "block {block_idx} is never opened"
            )));
        }
        for (chunk_idx, chunk) in block.chunks.iter().enumerate() {
            let at = ChunkRef::new(block_idx, chunk_idx as u32 + 1);
            for dep in chunk.dependencies() {
                let valid = if dep.block == block_idx {
                    dep.chunk >= 1 && dep.chunk < at.chunk
                } else {
                    is_ancestor(dep.block, block_idx)
                        && bundle
                            .block(dep.block)
                            .is_some_and(|b| dep.chunk >= 1 && dep.chunk as usize <= b.chunks.len())
                };
                if !valid {
                    return Err(ExecutionError::Malformed(format!(
                        "chunk {at} references {dep}, which is not an earlier chunk"
                    )));
                }
            }
        }
        for entrypoint in block.entrypoints.iter().chain(&block.datapoints) {
            if entrypoint.block != block_idx || bundle.chunk(*entrypoint).is_none() {
                return Err(ExecutionError::Malformed(format!(
                    "block {block_idx} lists missing entrypoint {entrypoint}"
                )));
            }
        }
    }
    Ok(())
}
