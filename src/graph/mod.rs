//! Graph description output
//!
//! Diagrams are accumulated in a [`GraphBuilder`] and written as Graphviz
//! DOT text. Layout is left to Graphviz.

mod builder;
mod dot;

pub use builder::{Endpoint, GraphBuilder};
pub use dot::{dot_id, escape_html, escape_quoted, escape_record, DotNode, Field, Label, Shape};
