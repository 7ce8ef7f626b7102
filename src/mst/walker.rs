//! Snapshot traversal building the MST diagram

use super::key::{entry_keys, leading_zero_depth, KeyLabel};
use crate::config::DiagramConfig;
use crate::graph::{DotNode, Endpoint, Field, GraphBuilder, Label, Shape};
use crate::model::{
    collection_tag, short_rkey, truncate, Block, Cid, CommitNode, Link, Operation, Record,
    Snapshot, TreeNode,
};
use crate::Result;
use std::collections::HashSet;
use tracing::{debug, info};

/// Id of the anchor node the root hangs from
pub const ROOTS: &str = "roots";
/// Id of the anchor node the pending ops hang from
pub const OPS: &str = "ops";

/// How a block was reached
///
/// A value link points at record data (entry values, commit data, op
/// targets); everything else is structural.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkKind {
    Structural,
    Value,
}

/// A pending visit on the walk stack
#[derive(Debug)]
struct Visit {
    parent: Option<Endpoint>,
    link: Link,
    kind: LinkKind,
}

/// Walks a snapshot depth-first and records every block it reaches
///
/// The walk uses an explicit stack, so deeply nested trees do not grow the
/// call stack. Children are pushed in reverse so nodes and edges come out
/// in pre-order.
pub struct MstWalker<'a> {
    snapshot: &'a Snapshot,
    config: &'a DiagramConfig,
    graph: GraphBuilder,
    /// Blocks already expanded; revisits only add the incoming edge
    expanded: HashSet<Cid>,
    stack: Vec<Visit>,
}

impl<'a> MstWalker<'a> {
    pub fn new(snapshot: &'a Snapshot, config: &'a DiagramConfig) -> Self {
        MstWalker {
            snapshot,
            config,
            graph: GraphBuilder::new(),
            expanded: HashSet::new(),
            stack: Vec::new(),
        }
    }

    /// Walk the root, then every op, then every stored block
    ///
    /// The last pass draws blocks nothing links to (orphans) as unparented
    /// roots; blocks already drawn are skipped.
    pub fn build(mut self) -> Result<GraphBuilder> {
        let snapshot = self.snapshot;

        self.graph.add_node(DotNode::new(ROOTS, Shape::Circle));
        self.walk(
            Some(Endpoint::new(ROOTS)),
            Link::Cid(snapshot.root.clone()),
            LinkKind::Structural,
        )?;

        self.graph.add_node(DotNode::new(OPS, Shape::Circle));
        for (index, op) in snapshot.ops.iter().enumerate() {
            let id = format!("op{}", index);
            let color = self.color(LinkKind::Structural);
            self.graph.add_edge(
                Some(&Endpoint::new(OPS)),
                &Endpoint::with_port(id.as_str(), "a"),
                color,
            );
            self.add_op_node(&id, op);
            self.walk(
                Some(Endpoint::with_port(id.as_str(), "c")),
                op.link(),
                LinkKind::Value,
            )?;
        }

        let reached = self.expanded.len();
        for cid in snapshot.store.cids() {
            self.walk(None, Link::Cid(cid), LinkKind::Structural)?;
        }
        let orphans = self.expanded.len() - reached;

        info!(
            nodes = self.graph.node_count(),
            edges = self.graph.edge_count(),
            orphans,
            "built MST diagram"
        );
        Ok(self.graph)
    }

    fn walk(&mut self, parent: Option<Endpoint>, link: Link, kind: LinkKind) -> Result<()> {
        self.stack.push(Visit { parent, link, kind });
        while let Some(visit) = self.stack.pop() {
            self.visit(visit)?;
        }
        Ok(())
    }

    fn color(&self, kind: LinkKind) -> &'a str {
        let config = self.config;
        match kind {
            LinkKind::Structural => &config.structural_color,
            LinkKind::Value => &config.value_color,
        }
    }

    fn visit(&mut self, visit: Visit) -> Result<()> {
        let Visit { parent, link, kind } = visit;
        let color = self.color(kind);

        let cid = match link {
            Link::Null => {
                let id = self.graph.add_null_node(color);
                self.graph
                    .add_edge(parent.as_ref(), &Endpoint::new(id), color);
                return Ok(());
            }
            Link::Cid(cid) => cid,
        };

        let target = Endpoint::with_port(cid.as_str(), "t");
        if !self.expanded.insert(cid.clone()) {
            self.graph.add_edge(parent.as_ref(), &target, color);
            return Ok(());
        }

        let children = match self.snapshot.store.resolve(&cid)? {
            Some(Block::Tree(node)) => {
                debug!(%cid, entries = node.entries.len(), "tree node");
                self.add_tree_node(&cid, &node);
                self.tree_children(&cid, &node)
            }
            Some(Block::Commit(commit)) => {
                debug!(%cid, did = %commit.did, "commit node");
                self.add_commit_node(&cid, &commit, color);
                commit
                    .data
                    .map(|data| Visit {
                        parent: Some(Endpoint::with_port(cid.as_str(), "t")),
                        link: data,
                        kind: LinkKind::Value,
                    })
                    .into_iter()
                    .collect()
            }
            Some(Block::Record(record)) => {
                debug!(%cid, record_type = %record.record_type, "record");
                self.add_record_node(&cid, &record, color);
                Vec::new()
            }
            None => {
                debug!(%cid, ?kind, "block not in store");
                self.add_missing_node(&cid, kind, color);
                Vec::new()
            }
        };

        self.graph.add_edge(parent.as_ref(), &target, color);
        self.stack.extend(children.into_iter().rev());
        Ok(())
    }

    /// Child visits of a tree node, in walk order
    fn tree_children(&self, cid: &Cid, node: &TreeNode) -> Vec<Visit> {
        let mut children = Vec::new();
        let mut push = |port: String, link: &Option<Link>, kind: LinkKind| {
            let Some(link) = link else { return };
            if link.is_null() && kind == LinkKind::Structural && !self.config.null_links {
                return;
            }
            children.push(Visit {
                parent: Some(Endpoint::with_port(cid.as_str(), port)),
                link: link.clone(),
                kind,
            });
        };

        push("l".into(), &node.left, LinkKind::Structural);
        for (index, entry) in node.entries.iter().enumerate() {
            let port = format!("e{}:s", index);
            push(port.clone(), &entry.value, LinkKind::Value);
            push(port, &entry.tree, LinkKind::Structural);
        }
        children
    }

    fn add_tree_node(&mut self, cid: &Cid, node: &TreeNode) {
        let keys = entry_keys(cid, node);
        let entries = if keys.is_empty() {
            vec![Field::text("empty")]
        } else {
            keys.iter()
                .enumerate()
                .map(|(index, key)| {
                    let mut text = format!("e{}\n{}", index, KeyLabel::parse(key));
                    if self.config.show_depth {
                        text.push_str(&format!(" d{}", leading_zero_depth(key)));
                    }
                    Field::port(format!("e{}", index), text)
                })
                .collect()
        };

        self.graph.add_node(
            DotNode::new(cid.as_str(), Shape::Record).with_label(Label::Record(vec![
                Field::port("t", cid.short()),
                Field::port("l", "l"),
                Field::Group(entries),
            ])),
        );
    }

    fn add_commit_node(&mut self, cid: &Cid, commit: &CommitNode, color: &str) {
        let mut fields = vec![
            Field::port("t", cid.short()),
            Field::text(commit.did.as_str()),
            Field::text(if commit.is_signed() { "signed" } else { "unsigned" }),
        ];
        if let Some(rev) = &commit.rev {
            fields.push(Field::text(format!("rev: {}", rev)));
        }

        self.graph.add_node(
            DotNode::new(cid.as_str(), Shape::Record)
                .with_color(color)
                .with_label(Label::Record(fields)),
        );
    }

    fn add_record_node(&mut self, cid: &Cid, record: &Record, color: &str) {
        let mut fields = vec![
            Field::port("t", format!("{} {}", cid.short(), record.type_tag())),
            Field::text(format!(
                "text: {}",
                truncate(&record.text, self.config.text_limit)
            )),
        ];
        if let Some(uri) = &record.reply_to {
            fields.push(Field::text(format!("reply to: {}", uri)));
        }
        if let Some(embed) = &record.embed {
            fields.push(Field::text(embed.summary()));
        }

        self.graph.add_node(
            DotNode::new(cid.as_str(), Shape::Record)
                .with_color(color)
                .with_label(Label::Record(fields)),
        );
    }

    fn add_missing_node(&mut self, cid: &Cid, kind: LinkKind, color: &str) {
        let what = match kind {
            LinkKind::Value => "external data",
            LinkKind::Structural => "external node",
        };
        self.graph.add_node(
            DotNode::new(cid.as_str(), Shape::Record)
                .with_color(color)
                .with_label(Label::Record(vec![
                    Field::port("t", cid.short()),
                    Field::text(what),
                ])),
        );
    }

    fn add_op_node(&mut self, id: &str, op: &Operation) {
        let path = format!(
            "{}/{}",
            collection_tag(&op.path.coll),
            short_rkey(&op.path.rkey)
        );
        self.graph.add_node(
            DotNode::new(id, Shape::Record).with_label(Label::Record(vec![
                Field::port("a", format!("op {}", op.action)),
                Field::port("c", path),
            ])),
        );
    }
}

/// Build the MST diagram for a snapshot
pub fn build_mst_graph(snapshot: &Snapshot, config: &DiagramConfig) -> Result<GraphBuilder> {
    MstWalker::new(snapshot, config).build()
}
