//! Structural checks on the tree reachable from a snapshot's root
//!
//! Diagrams do not need any of this; it exists to point out trees that
//! were built wrong.

use super::key::{full_key, leading_zero_depth};
use crate::model::{Block, Cid, Link, Snapshot, TreeNode};
use crate::Result;
use std::collections::HashSet;
use std::fmt;
use tracing::warn;

/// A problem found in a tree node
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Diagnostic {
    /// The first entry of a node has a non-zero prefix length
    FirstPrefix { cid: Cid, prefix_len: usize },
    /// An entry's prefix length does not fit the first key
    BadPrefix { cid: Cid, index: usize },
    /// A key is not greater than the key before it
    OutOfOrder { cid: Cid, index: usize, key: String },
    /// A key falls outside the range its parent link allows
    OutOfRange { cid: Cid, key: String },
    /// Keys in one node sit at different depths
    MixedDepth { cid: Cid, key: String, depth: u32, expected: u32 },
    /// A sub-tree link points at something that is not a tree node
    NotATree { cid: Cid, kind: &'static str },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::FirstPrefix { cid, prefix_len } => {
                write!(f, "{}: first entry has prefix length {}", cid, prefix_len)
            }
            Diagnostic::BadPrefix { cid, index } => {
                write!(f, "{}: entry {} prefix does not fit the first key", cid, index)
            }
            Diagnostic::OutOfOrder { cid, index, key } => {
                write!(f, "{}: entry {} key {:?} is out of order", cid, index, key)
            }
            Diagnostic::OutOfRange { cid, key } => {
                write!(f, "{}: key {:?} is outside its sub-tree range", cid, key)
            }
            Diagnostic::MixedDepth {
                cid,
                key,
                depth,
                expected,
            } => write!(
                f,
                "{}: key {:?} has depth {}, node depth is {}",
                cid, key, depth, expected
            ),
            Diagnostic::NotATree { cid, kind } => {
                write!(f, "{}: sub-tree link points at a {}", cid, kind)
            }
        }
    }
}

/// Key bounds for a sub-tree; keys must fall strictly between them
#[derive(Clone, Debug, Default)]
struct Range {
    lower: Option<String>,
    upper: Option<String>,
}

impl Range {
    fn contains(&self, key: &str) -> bool {
        self.lower.as_deref().map_or(true, |l| key > l)
            && self.upper.as_deref().map_or(true, |u| key < u)
    }
}

/// Check a single node and return its reconstructed keys alongside any
/// problems found
///
/// Keys that cannot be reconstructed are left out of the returned list.
pub fn check_tree(cid: &Cid, node: &TreeNode) -> (Vec<String>, Vec<Diagnostic>) {
    let mut diagnostics = Vec::new();
    let mut keys = Vec::new();

    let Some(first) = node.entries.first() else {
        return (keys, diagnostics);
    };
    if first.prefix_len != 0 {
        diagnostics.push(Diagnostic::FirstPrefix {
            cid: cid.clone(),
            prefix_len: first.prefix_len,
        });
    }

    let base_key = &first.key_suffix;
    let mut previous: Option<String> = None;
    let mut expected_depth = None;
    for (index, entry) in node.entries.iter().enumerate() {
        let Some(key) = full_key(base_key, entry) else {
            diagnostics.push(Diagnostic::BadPrefix {
                cid: cid.clone(),
                index,
            });
            continue;
        };

        if previous.as_ref().is_some_and(|p| key <= *p) {
            diagnostics.push(Diagnostic::OutOfOrder {
                cid: cid.clone(),
                index,
                key: key.clone(),
            });
        }

        let depth = leading_zero_depth(&key);
        match expected_depth {
            None => expected_depth = Some(depth),
            Some(expected) if expected != depth => diagnostics.push(Diagnostic::MixedDepth {
                cid: cid.clone(),
                key: key.clone(),
                depth,
                expected,
            }),
            Some(_) => {}
        }

        previous = Some(key.clone());
        keys.push(key);
    }

    (keys, diagnostics)
}

/// Check every tree node reachable from the snapshot root
///
/// A commit root is followed through its data link. Missing blocks are
/// skipped. Each diagnostic is also logged as a warning.
pub fn check_snapshot(snapshot: &Snapshot) -> Result<Vec<Diagnostic>> {
    let store = &snapshot.store;
    let mut diagnostics = Vec::new();
    let mut seen = HashSet::new();

    let tree_root = match store.resolve(&snapshot.root)? {
        Some(Block::Commit(commit)) => commit.data.as_ref().and_then(Link::cid).cloned(),
        Some(Block::Tree(_)) => Some(snapshot.root.clone()),
        _ => None,
    };

    let mut stack: Vec<(Cid, Range)> = tree_root
        .into_iter()
        .map(|cid| (cid, Range::default()))
        .collect();

    while let Some((cid, range)) = stack.pop() {
        if !seen.insert(cid.clone()) {
            continue;
        }
        let node = match store.resolve(&cid)? {
            Some(Block::Tree(node)) => node,
            Some(other) => {
                diagnostics.push(Diagnostic::NotATree {
                    cid: cid.clone(),
                    kind: other.kind(),
                });
                continue;
            }
            None => continue,
        };

        let (keys, found) = check_tree(&cid, &node);
        diagnostics.extend(found);
        for key in keys.iter().filter(|k| !range.contains(k)) {
            diagnostics.push(Diagnostic::OutOfRange {
                cid: cid.clone(),
                key: key.clone(),
            });
        }

        // Sub-tree ranges come from the node's keys; if any key could not
        // be rebuilt, fall back to the parent's (looser) bounds.
        let complete = keys.len() == node.entries.len();
        let key_at = |i: usize| if complete { keys.get(i).cloned() } else { None };

        if let Some(left) = node.left.as_ref().and_then(Link::cid) {
            stack.push((
                left.clone(),
                Range {
                    lower: range.lower.clone(),
                    upper: key_at(0).or_else(|| range.upper.clone()),
                },
            ));
        }
        for (index, entry) in node.entries.iter().enumerate() {
            if let Some(right) = entry.tree.as_ref().and_then(Link::cid) {
                stack.push((
                    right.clone(),
                    Range {
                        lower: key_at(index).or_else(|| range.lower.clone()),
                        upper: key_at(index + 1).or_else(|| range.upper.clone()),
                    },
                ));
            }
        }
    }

    for diagnostic in &diagnostics {
        warn!("{}", diagnostic);
    }
    Ok(diagnostics)
}
