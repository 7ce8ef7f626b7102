//! In-memory block store keyed by CID

use crate::model::{Block, Cid};
use crate::Result;
use serde_json::{Map, Value};

/// The flat CID → block mapping of one snapshot
///
/// Blocks are kept as raw JSON and classified on each `resolve`. Iteration
/// follows the order blocks appeared in the input.
#[derive(Clone, Debug, Default)]
pub struct BlockStore {
    blocks: Map<String, Value>,
}

impl BlockStore {
    pub fn new(blocks: Map<String, Value>) -> Self {
        BlockStore { blocks }
    }

    /// Insert a raw block, replacing any block already stored under `cid`
    pub fn insert(&mut self, cid: impl Into<Cid>, block: Value) {
        self.blocks.insert(cid.into().into(), block);
    }

    /// Get the raw JSON of a block
    pub fn get_raw(&self, cid: &Cid) -> Option<&Value> {
        self.blocks.get(cid.as_str())
    }

    /// Check if a block exists
    pub fn contains(&self, cid: &Cid) -> bool {
        self.blocks.contains_key(cid.as_str())
    }

    /// Look up and classify a block
    ///
    /// Returns `Ok(None)` when the CID is not in the store. A block whose
    /// shape cannot be classified is an error.
    pub fn resolve(&self, cid: &Cid) -> Result<Option<Block>> {
        match self.get_raw(cid) {
            Some(value) => Block::classify(cid, value).map(Some),
            None => Ok(None),
        }
    }

    /// Every CID in the store, in input order
    pub fn cids(&self) -> impl Iterator<Item = Cid> + '_ {
        self.blocks.keys().map(|k| Cid::new(k.as_str()))
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
