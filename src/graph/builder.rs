//! Deduplicating graph accumulator

use super::dot::{dot_id, DotNode, Label, Shape};
use indexmap::{IndexMap, IndexSet};
use std::io::Write;

/// One end of an edge: a node id and an optional record port
///
/// Ports may carry a compass point, e.g. `e0:s`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    pub id: String,
    pub port: Option<String>,
}

impl Endpoint {
    pub fn new(id: impl Into<String>) -> Self {
        Endpoint {
            id: id.into(),
            port: None,
        }
    }

    pub fn with_port(id: impl Into<String>, port: impl Into<String>) -> Self {
        Endpoint {
            id: id.into(),
            port: Some(port.into()),
        }
    }

    fn render(&self) -> String {
        match &self.port {
            Some(port) => format!("{}:{}", dot_id(&self.id), port),
            None => dot_id(&self.id),
        }
    }
}

/// Accumulates DOT nodes and edges for one diagram
///
/// Nodes are unique by id and edges by their rendered text. Both keep
/// first-insertion order so identical input gives identical output.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    nodes: IndexMap<String, DotNode>,
    edges: IndexSet<String>,
    /// Number of null placeholders created so far
    nulls: usize,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node; ignored if a node with the same id exists
    ///
    /// Returns true if the node was added.
    pub fn add_node(&mut self, node: DotNode) -> bool {
        if self.nodes.contains_key(&node.id) {
            return false;
        }
        self.nodes.insert(node.id.clone(), node);
        true
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<&DotNode> {
        self.nodes.get(id)
    }

    /// Register an edge; ignored when there is no source or the exact edge
    /// already exists
    ///
    /// Returns true if the edge was added.
    pub fn add_edge(&mut self, from: Option<&Endpoint>, to: &Endpoint, color: &str) -> bool {
        let Some(from) = from.filter(|f| !f.id.is_empty()) else {
            return false;
        };
        let edge = format!("{} -> {} [color={}]", from.render(), to.render(), dot_id(color));
        self.edges.insert(edge)
    }

    /// Create a fresh null placeholder node and return its id
    pub fn add_null_node(&mut self, color: &str) -> String {
        self.nulls += 1;
        let id = format!("null{}", self.nulls);
        self.add_node(
            DotNode::new(id.as_str(), Shape::Record)
                .with_color(color)
                .with_label(Label::Text("null".into())),
        );
        id
    }

    pub fn nodes(&self) -> impl Iterator<Item = &DotNode> {
        self.nodes.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = &str> {
        self.edges.iter().map(String::as_str)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Write the graph as DOT: header, nodes, edges, footer
    pub fn write_dot<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        writeln!(out, "digraph {{ rankdir=LR")?;
        for node in self.nodes.values() {
            writeln!(out, "{}", node)?;
        }
        for edge in &self.edges {
            writeln!(out, "{}", edge)?;
        }
        writeln!(out, "}}")
    }

    /// Render the graph as a DOT string
    pub fn to_dot(&self) -> String {
        let mut out = Vec::new();
        // Writing into a Vec cannot fail
        let _ = self.write_dot(&mut out);
        String::from_utf8_lossy(&out).into_owned()
    }
}
