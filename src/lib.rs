//! # mstviz
//!
//! Graphviz diagrams of atproto repository snapshots.
//!
//! A snapshot is a root CID, a flat map of decoded blocks and a list of
//! pending writes. mstviz rebuilds the Merkle Search Tree those blocks
//! describe and draws it: tree nodes with their entries, commits, records,
//! and references to blocks the snapshot does not contain.
//!
//! ## Core Concepts
//!
//! - **Blocks**: JSON values keyed by CID, classified by shape into tree
//!   nodes, commits and records
//! - **Entries**: prefix-compressed keys inside a tree node, rebuilt against
//!   the node's first key
//! - **Graphs**: deduplicated, insertion-ordered DOT nodes and edges
//!
//! ## Example
//!
//! ```ignore
//! use mstviz::{build_mst_graph, DiagramConfig, Snapshot};
//!
//! let snapshot = Snapshot::from_json(&std::fs::read_to_string("commit.json")?)?;
//! let graph = build_mst_graph(&snapshot, &DiagramConfig::default())?;
//! print!("{}", graph.to_dot());
//! ```

pub mod config;
pub mod graph;
pub mod model;
pub mod mst;
pub mod render;
pub mod store;
pub mod thread;

mod error;

pub use config::DiagramConfig;
pub use error::{Error, Result};
pub use graph::GraphBuilder;
pub use model::{Block, Cid, Link, Operation, Snapshot};
pub use mst::{build_mst_graph, check_snapshot, leading_zero_depth, Diagnostic, MstWalker};
pub use render::{emit, resolve_format, OutputFormat};
pub use store::BlockStore;
pub use thread::{build_thread_graph, ThreadView, ThreadWalker};
