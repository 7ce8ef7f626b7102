//! Merkle Search Tree reconstruction and diagramming
//!
//! This implements the diagram walk over an atproto repository snapshot:
//! - Tree nodes are drawn as records with one column per entry
//! - Entry keys are rebuilt from their prefix-compressed form
//! - Commits, records and blocks missing from the snapshot become leaves

mod check;
mod key;
mod walker;

pub use check::{check_snapshot, check_tree, Diagnostic};
pub use key::{entry_keys, full_key, key_hash, leading_zero_depth, KeyLabel};
pub use walker::{build_mst_graph, LinkKind, MstWalker, OPS, ROOTS};
