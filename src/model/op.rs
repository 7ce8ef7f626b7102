//! Pending write operations and the input snapshot

use super::cid::{deserialize_link, Cid, Link};
use crate::store::BlockStore;
use crate::{Error, Result};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Repository path of a record: collection NSID plus record key
#[derive(Clone, Debug, Deserialize)]
pub struct RecordPath {
    pub coll: String,
    pub rkey: String,
}

/// A pending write against the repository
#[derive(Clone, Debug, Deserialize)]
pub struct Operation {
    /// `create`, `update` or `delete`
    pub action: String,
    pub path: RecordPath,
    /// New record value; null for deletes
    #[serde(default, deserialize_with = "deserialize_link")]
    pub cid: Option<Link>,
}

impl Operation {
    /// The link to visit for this op; a missing `cid` counts as null
    pub fn link(&self) -> Link {
        self.cid.clone().unwrap_or(Link::Null)
    }
}

#[derive(Deserialize)]
struct SnapshotRepr {
    blocks: BlocksRepr,
    ops: Vec<Operation>,
}

#[derive(Deserialize)]
struct BlocksRepr {
    roots: Vec<Cid>,
    blocks: Map<String, Value>,
}

/// One parsed input snapshot: the root, every block, and pending ops
#[derive(Clone, Debug)]
pub struct Snapshot {
    pub root: Cid,
    pub store: BlockStore,
    pub ops: Vec<Operation>,
}

impl Snapshot {
    pub fn new(root: Cid, store: BlockStore, ops: Vec<Operation>) -> Self {
        Snapshot { root, store, ops }
    }

    /// Parse a snapshot from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        let repr: SnapshotRepr = serde_json::from_str(json)?;
        Self::from_repr(repr)
    }

    /// Build a snapshot from an already-parsed JSON value
    pub fn from_value(value: Value) -> Result<Self> {
        let repr: SnapshotRepr = serde_json::from_value(value)?;
        Self::from_repr(repr)
    }

    fn from_repr(repr: SnapshotRepr) -> Result<Self> {
        let root = repr
            .blocks
            .roots
            .into_iter()
            .next()
            .ok_or_else(|| Error::MalformedInput("blocks.roots is empty".into()))?;

        Ok(Snapshot {
            root,
            store: BlockStore::new(repr.blocks.blocks),
            ops: repr.ops,
        })
    }
}
