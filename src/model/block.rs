//! Decoded block shapes and shape-based classification

use super::cid::{deserialize_link, tail, Cid, Link};
use crate::{Error, Result};
use serde::Deserialize;
use serde_json::{Map, Value};

/// A block resolved from the store, classified once by shape
#[derive(Clone, Debug)]
pub enum Block {
    /// An MST node
    Tree(TreeNode),
    /// A repository commit (signed or unsigned) pointing at its data
    Commit(CommitNode),
    /// An application record such as a post
    Record(Record),
}

/// An MST node: a left sub-tree link and prefix-compressed entries
#[derive(Clone, Debug, Deserialize)]
pub struct TreeNode {
    #[serde(rename = "l", default, deserialize_with = "deserialize_link")]
    pub left: Option<Link>,
    #[serde(rename = "e")]
    pub entries: Vec<Entry>,
}

/// One key slot in a tree node
///
/// `prefix_len` counts bytes shared with the *first* entry's key in the
/// same node.
#[derive(Clone, Debug, Deserialize)]
pub struct Entry {
    #[serde(rename = "p")]
    pub prefix_len: usize,
    #[serde(rename = "k")]
    pub key_suffix: String,
    #[serde(rename = "v", default, deserialize_with = "deserialize_link")]
    pub value: Option<Link>,
    #[serde(rename = "t", default, deserialize_with = "deserialize_link")]
    pub tree: Option<Link>,
}

/// A repository commit
#[derive(Clone, Debug, Deserialize)]
pub struct CommitNode {
    pub did: String,
    #[serde(default)]
    pub rev: Option<String>,
    #[serde(default)]
    sig: Option<Value>,
    #[serde(default, deserialize_with = "deserialize_link")]
    pub data: Option<Link>,
}

impl CommitNode {
    /// True if the commit carries a signature that is not empty, zero or false
    pub fn is_signed(&self) -> bool {
        match &self.sig {
            None | Some(Value::Null) | Some(Value::Bool(false)) => false,
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Object(o)) => !o.is_empty(),
            Some(Value::Array(a)) => !a.is_empty(),
            Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
            Some(Value::Bool(true)) => true,
        }
    }
}

/// An application record, summarized for display
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    pub record_type: String,
    pub text: String,
    /// URI of the post this record replies to
    pub reply_to: Option<String>,
    pub embed: Option<Embed>,
}

impl Record {
    /// Last dot-separated component of the record type
    pub fn type_tag(&self) -> &str {
        self.record_type.rsplit('.').next().unwrap_or_default()
    }

    fn from_object(obj: &Map<String, Value>) -> Self {
        let record_type = str_at(obj.get("$type"), &[]).unwrap_or_default();
        let text = str_at(obj.get("text"), &[]).unwrap_or_default();
        let reply_to = obj
            .get("reply")
            .filter(|r| !r.is_null())
            .map(|r| str_at(Some(r), &["parent", "uri"]).unwrap_or_else(|| "?".into()));
        let embed = obj
            .get("embed")
            .filter(|e| !e.is_null())
            .map(Embed::from_value);

        Record {
            record_type,
            text,
            reply_to,
            embed,
        }
    }
}

/// A post embed, reduced to what a diagram label shows
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Embed {
    Images(usize),
    Quote(String),
    QuoteWithMedia(String),
    External { title: String, uri: String },
    Video,
    /// Any embed type not listed above
    Unknown(String),
}

impl Embed {
    pub const IMAGES: &'static str = "app.bsky.embed.images";
    pub const RECORD: &'static str = "app.bsky.embed.record";
    pub const RECORD_WITH_MEDIA: &'static str = "app.bsky.embed.recordWithMedia";
    pub const EXTERNAL: &'static str = "app.bsky.embed.external";
    pub const VIDEO: &'static str = "app.bsky.embed.video";

    pub fn from_value(embed: &Value) -> Self {
        let etype = str_at(Some(embed), &["$type"]).unwrap_or_default();
        let field = |path: &[&str]| str_at(Some(embed), path).unwrap_or_else(|| "?".into());
        match etype.as_str() {
            Self::IMAGES => Embed::Images(
                embed
                    .get("images")
                    .and_then(Value::as_array)
                    .map_or(0, Vec::len),
            ),
            Self::RECORD => Embed::Quote(field(&["record", "uri"])),
            Self::RECORD_WITH_MEDIA => Embed::QuoteWithMedia(field(&["record", "record", "uri"])),
            Self::EXTERNAL => Embed::External {
                title: field(&["external", "title"]),
                uri: field(&["external", "uri"]),
            },
            Self::VIDEO => Embed::Video,
            _ => Embed::Unknown(etype.clone()),
        }
    }

    /// Short human-readable summary
    pub fn summary(&self) -> String {
        match self {
            Embed::Images(n) => format!("images: {} images", n),
            Embed::Quote(uri) => format!("quote: {}", uri),
            Embed::QuoteWithMedia(uri) => format!("quote: {} with media", uri),
            Embed::External { title, uri } => format!("preview: {} at {}", title, uri),
            Embed::Video => "video".to_string(),
            Embed::Unknown(etype) => format!("unknown embed {}", etype),
        }
    }
}

impl Block {
    /// Classify a raw block by the fields it carries
    ///
    /// Checked in order: `e` (tree node), `data` (commit), `$type` (record).
    /// Anything else is an error.
    pub fn classify(cid: &Cid, value: &Value) -> Result<Block> {
        let obj = value
            .as_object()
            .ok_or_else(|| unrecognized(cid, value))?;

        if obj.contains_key("e") {
            let node = TreeNode::deserialize(value).map_err(|e| malformed(cid, e))?;
            Ok(Block::Tree(node))
        } else if obj.contains_key("data") {
            let node = CommitNode::deserialize(value).map_err(|e| malformed(cid, e))?;
            Ok(Block::Commit(node))
        } else if obj.contains_key("$type") {
            Ok(Block::Record(Record::from_object(obj)))
        } else {
            Err(unrecognized(cid, value))
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Block::Tree(_) => "tree",
            Block::Commit(_) => "commit",
            Block::Record(_) => "record",
        }
    }
}

fn unrecognized(cid: &Cid, value: &Value) -> Error {
    Error::UnrecognizedBlock {
        cid: cid.to_string(),
        block: value.to_string(),
    }
}

fn malformed(cid: &Cid, err: serde_json::Error) -> Error {
    Error::MalformedBlock {
        cid: cid.to_string(),
        reason: err.to_string(),
    }
}

/// Follow `path` through nested objects and return the string found there
fn str_at(value: Option<&Value>, path: &[&str]) -> Option<String> {
    let mut current = value?;
    for key in path {
        current = current.get(key)?;
    }
    current.as_str().map(str::to_string)
}

/// Truncate `text` to at most `limit` characters
pub fn truncate(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((i, _)) => &text[..i],
        None => text,
    }
}

/// Collection tag of an NSID such as `app.bsky.feed.post`
pub fn collection_tag(nsid: &str) -> &str {
    nsid.rsplit('.').next().unwrap_or_default()
}

/// Abbreviated record key for labels
pub fn short_rkey(rkey: &str) -> &str {
    tail(rkey, super::cid::SHORT_LEN)
}
