//! Post thread diagrams
//!
//! Renders an `app.bsky.feed.getPostThread` response: the anchor post, its
//! chain of parents, and the tree of replies below every post reached.

use crate::config::DiagramConfig;
use crate::graph::{escape_html, DotNode, Endpoint, GraphBuilder, Label, Shape};
use crate::model::truncate;
use crate::Result;
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;
use tracing::info;

/// A node of a thread response
///
/// `post` is absent for placeholders such as `notFoundPost` or
/// `blockedPost`; those are skipped.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ThreadView {
    #[serde(default)]
    pub post: Option<PostView>,
    #[serde(default)]
    pub parent: Option<Box<ThreadView>>,
    #[serde(default)]
    pub replies: Vec<ThreadView>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PostView {
    pub uri: String,
    pub author: Author,
    #[serde(default)]
    pub record: PostRecord,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Author {
    pub handle: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct PostRecord {
    #[serde(default)]
    pub text: String,
}

#[derive(Deserialize)]
struct ThreadResponse {
    thread: ThreadView,
}

impl ThreadView {
    /// Parse the `thread` field of a getPostThread response
    pub fn from_json(json: &str) -> Result<Self> {
        let response: ThreadResponse = serde_json::from_str(json)?;
        Ok(response.thread)
    }
}

impl PostView {
    /// Node id derived from the post URI
    ///
    /// `at://did:plc:abc/app.bsky.feed.post/3kxyz` becomes `plc_abc_3kxyz`.
    pub fn node_id(&self) -> String {
        static INVALID: OnceLock<Regex> = OnceLock::new();
        let invalid =
            INVALID.get_or_init(|| Regex::new(r"[^-_0-9A-Za-z]+").expect("valid regex"));

        let id = self
            .uri
            .replace("at://did:", "")
            .replace("app.bsky.feed.post/", "");
        invalid.replace_all(&id, "_").into_owned()
    }

    /// Record key: the last path segment of the URI
    pub fn rkey(&self) -> &str {
        self.uri.rsplit('/').next().unwrap_or_default()
    }
}

enum Task<'t> {
    /// Draw `parent` above the post with id `child`
    Parent { child: String, parent: &'t ThreadView },
    /// Draw each of `replies` below the post with id `post`
    Replies { post: String, replies: &'t [ThreadView] },
    Reply { post: String, reply: &'t ThreadView },
}

/// Walks a thread and records its posts and reply relations
pub struct ThreadWalker<'a> {
    config: &'a DiagramConfig,
    graph: GraphBuilder,
}

impl<'a> ThreadWalker<'a> {
    pub fn new(config: &'a DiagramConfig) -> Self {
        ThreadWalker {
            config,
            graph: GraphBuilder::new(),
        }
    }

    /// Walk from the anchor post up through its parents and down through
    /// every reply, in pre-order
    pub fn build(mut self, thread: &ThreadView) -> GraphBuilder {
        let config = self.config;
        let Some(post) = &thread.post else {
            return self.graph;
        };

        let id = self.add_post(post);
        let mut stack = vec![Task::Replies {
            post: id.clone(),
            replies: &thread.replies,
        }];
        if let Some(parent) = &thread.parent {
            stack.push(Task::Parent { child: id, parent });
        }

        while let Some(task) = stack.pop() {
            match task {
                Task::Parent { child, parent } => {
                    let Some(post) = &parent.post else { continue };
                    let id = self.add_post(post);
                    self.add_edge(&id, &child, &config.parent_color);
                    stack.push(Task::Replies {
                        post: id.clone(),
                        replies: &parent.replies,
                    });
                    if let Some(grandparent) = &parent.parent {
                        stack.push(Task::Parent {
                            child: id,
                            parent: grandparent,
                        });
                    }
                }
                Task::Replies { post, replies } => {
                    stack.extend(replies.iter().rev().map(|reply| Task::Reply {
                        post: post.clone(),
                        reply,
                    }));
                }
                Task::Reply { post, reply } => {
                    let Some(reply_post) = &reply.post else { continue };
                    let id = self.add_post(reply_post);
                    self.add_edge(&post, &id, &config.reply_color);
                    stack.push(Task::Replies {
                        post: id.clone(),
                        replies: &reply.replies,
                    });
                    if let Some(parent) = &reply.parent {
                        stack.push(Task::Parent { child: id, parent });
                    }
                }
            }
        }

        info!(
            posts = self.graph.node_count(),
            edges = self.graph.edge_count(),
            "built thread diagram"
        );
        self.graph
    }

    fn add_edge(&mut self, from: &str, to: &str, color: &str) {
        self.graph
            .add_edge(Some(&Endpoint::new(from)), &Endpoint::new(to), color);
    }

    fn add_post(&mut self, post: &PostView) -> String {
        let config = self.config;
        let id = post.node_id();
        let color = if config.is_highlighted(&post.author.handle) {
            &config.highlight_color
        } else {
            &config.structural_color
        };
        let label = format!(
            "<table border=\"0\"><tr><td>{}</td></tr><tr><td>{}</td></tr><tr><td>{}</td></tr></table>",
            escape_html(post.rkey()),
            escape_html(&post.author.handle),
            escape_html(truncate(&post.record.text, config.text_limit)),
        );
        self.graph.add_node(
            DotNode::new(id.as_str(), Shape::Box)
                .with_color(color.as_str())
                .with_label(Label::Html(label)),
        );
        id
    }
}

/// Build the diagram for a thread
pub fn build_thread_graph(thread: &ThreadView, config: &DiagramConfig) -> GraphBuilder {
    ThreadWalker::new(config).build(thread)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn post(rkey: &str, handle: &str, text: &str) -> serde_json::Value {
        json!({
            "uri": format!("at://did:plc:abc/app.bsky.feed.post/{}", rkey),
            "author": { "handle": handle },
            "record": { "text": text }
        })
    }

    fn thread(value: serde_json::Value) -> ThreadView {
        ThreadView::from_json(&json!({ "thread": value }).to_string()).unwrap()
    }

    #[test]
    fn test_node_id_from_uri() {
        let view: PostView = serde_json::from_value(post("3kxyz", "a.test", "")).unwrap();
        assert_eq!(view.node_id(), "plc_abc_3kxyz");
        assert_eq!(view.rkey(), "3kxyz");
    }

    #[test]
    fn test_parents_and_replies() {
        let view = thread(json!({
            "post": post("anchor", "b.test", "middle"),
            "parent": {
                "post": post("top", "a.test", "root post"),
                "parent": null
            },
            "replies": [
                { "post": post("r1", "c.test", "first reply"), "replies": [
                    { "post": post("r1a", "d.test", "nested") }
                ] },
                { "$type": "app.bsky.feed.defs#notFoundPost", "uri": "at://gone" },
                { "post": post("r2", "e.test", "second reply") }
            ]
        }));

        let graph = build_thread_graph(&view, &DiagramConfig::default());
        let ids: Vec<&str> = graph.nodes().map(|n| n.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "plc_abc_anchor",
                "plc_abc_top",
                "plc_abc_r1",
                "plc_abc_r1a",
                "plc_abc_r2"
            ]
        );

        let edges: Vec<&str> = graph.edges().collect();
        assert_eq!(
            edges,
            vec![
                "plc_abc_top -> plc_abc_anchor [color=red]",
                "plc_abc_anchor -> plc_abc_r1 [color=green]",
                "plc_abc_r1 -> plc_abc_r1a [color=green]",
                "plc_abc_anchor -> plc_abc_r2 [color=green]",
            ]
        );
    }

    #[test]
    fn test_label_is_escaped_and_truncated() {
        let view = thread(json!({
            "post": post("p1", "x.test", "<b>bold</b> & a very long tail that goes past the limit")
        }));
        let graph = build_thread_graph(&view, &DiagramConfig::default());
        let node = graph.node("plc_abc_p1").unwrap();
        assert_eq!(
            node.label,
            Some(Label::Html(
                "<table border=\"0\"><tr><td>p1</td></tr><tr><td>x.test</td></tr>\
                 <tr><td>&lt;b&gt;bold&lt;/b&gt; &amp; a very long tail</td></tr></table>"
                    .to_string()
            ))
        );
    }

    #[test]
    fn test_highlighted_author() {
        let view = thread(json!({
            "post": post("p1", "me.test", "hi"),
            "replies": [ { "post": post("p2", "other.test", "yo") } ]
        }));
        let config = DiagramConfig {
            highlight_handles: vec!["me.test".into()],
            ..DiagramConfig::default()
        };
        let graph = build_thread_graph(&view, &config);
        assert_eq!(
            graph.node("plc_abc_p1").unwrap().color.as_deref(),
            Some("red")
        );
        assert_eq!(
            graph.node("plc_abc_p2").unwrap().color.as_deref(),
            Some("black")
        );
    }

    #[test]
    fn test_missing_anchor_post_gives_empty_graph() {
        let view = thread(json!({ "$type": "app.bsky.feed.defs#blockedPost" }));
        let graph = build_thread_graph(&view, &DiagramConfig::default());
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.edge_count(), 0);
    }
}
