//! Data model for repository snapshots

mod block;
mod cid;
mod op;

pub use block::{
    collection_tag, short_rkey, truncate, Block, CommitNode, Embed, Entry, Record, TreeNode,
};
pub use cid::{tail, Cid, Link, SHORT_LEN};
pub use op::{Operation, RecordPath, Snapshot};
