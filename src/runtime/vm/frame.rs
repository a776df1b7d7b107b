use std::collections::BTreeMap;

use crate::{
    bytecode::chunk::ChunkRef,
    runtime::value::{ItemDetail, RawData},
};

/// Values computed so far for one run of a block. Nested runs point at the
/// frame of the block that opened them, so refs into enclosing blocks are
/// resolved by walking up.
pub(super) struct Frame<'p> {
    pub block: u32,
    slots: Vec<RawData>,
    items: BTreeMap<u32, Vec<ItemDetail>>,
    self_value: Option<RawData>,
    parent: Option<&'p Frame<'p>>,
}

impl<'p> Frame<'p> {
    pub fn root() -> Self {
        Self {
            block: 1,
            slots: Vec::new(),
            items: BTreeMap::new(),
            self_value: None,
            parent: None,
        }
    }

    pub fn child(block: u32, self_value: Option<RawData>, parent: &'p Frame<'p>) -> Self {
        Self {
            block,
            slots: Vec::new(),
            items: BTreeMap::new(),
            self_value,
            parent: Some(parent),
        }
    }

    pub fn push(&mut self, data: RawData, items: Option<Vec<ItemDetail>>) {
        self.slots.push(data);
        if let Some(items) = items {
            self.items.insert(self.slots.len() as u32, items);
        }
    }

    pub fn self_value(&self) -> Option<&RawData> {
        self.self_value.as_ref()
    }

    pub fn lookup(&self, r: ChunkRef) -> Option<&RawData> {
        if r.block == self.block {
            return r
                .chunk
                .checked_sub(1)
                .and_then(|idx| self.slots.get(idx as usize));
        }
        self.parent.and_then(|parent| parent.lookup(r))
    }

    /// Item details recorded for a chunk of this frame's block.
    pub fn items(&self, chunk: u32) -> Option<&[ItemDetail]> {
        self.items.get(&chunk).map(Vec::as_slice)
    }
}
