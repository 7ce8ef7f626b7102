//! Key reconstruction and key-derived metadata
//!
//! Entry keys in a tree node are prefix-compressed: each entry stores how
//! many leading bytes it shares with the node's *first* key, plus the
//! remaining suffix.

use crate::model::{collection_tag, short_rkey, Cid, Entry, TreeNode};
use sha2::{Digest, Sha256};
use tracing::debug;

/// Expand one entry's key against the first key of its node
///
/// Returns `None` if the prefix length runs past the base key or splits a
/// UTF-8 character.
pub fn full_key(base_key: &str, entry: &Entry) -> Option<String> {
    let prefix = base_key.get(..entry.prefix_len)?;
    let mut key = String::with_capacity(prefix.len() + entry.key_suffix.len());
    key.push_str(prefix);
    key.push_str(&entry.key_suffix);
    Some(key)
}

/// Reconstruct the full key of every entry in a node
///
/// A prefix length longer than the first key is capped at its length, and
/// one that splits a character is moved back to the character start. The
/// first entry's own prefix is applied against itself the same way.
pub fn entry_keys(cid: &Cid, node: &TreeNode) -> Vec<String> {
    let Some(first) = node.entries.first() else {
        return Vec::new();
    };

    let base_key = &first.key_suffix;
    node.entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            full_key(base_key, entry).unwrap_or_else(|| {
                debug!(%cid, index, prefix_len = entry.prefix_len, "capping prefix length");
                let mut key = clamp_prefix(base_key, entry.prefix_len).to_string();
                key.push_str(&entry.key_suffix);
                key
            })
        })
        .collect()
}

/// The longest prefix of `base_key` no longer than `len` bytes that ends on
/// a character boundary
fn clamp_prefix(base_key: &str, len: usize) -> &str {
    let mut end = len.min(base_key.len());
    while !base_key.is_char_boundary(end) {
        end -= 1;
    }
    &base_key[..end]
}

/// Compact description of a record key like `app.bsky.feed.post/3kabc1`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyLabel {
    /// Last component of the collection NSID, e.g. `post`
    pub collection: String,
    /// Trailing characters of the record key
    pub rkey: String,
}

impl KeyLabel {
    pub fn parse(key: &str) -> Self {
        let mut parts = key.splitn(3, '/');
        let collection = parts
            .next()
            .map(collection_tag)
            .filter(|c| !c.is_empty())
            .unwrap_or("?");
        let rkey = parts.next().map(short_rkey).unwrap_or("?");
        KeyLabel {
            collection: collection.to_string(),
            rkey: rkey.to_string(),
        }
    }
}

impl std::fmt::Display for KeyLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.collection, self.rkey)
    }
}

/// SHA-256 of a key
pub fn key_hash(key: &str) -> [u8; 32] {
    let digest = Sha256::digest(key.as_bytes());
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&digest);
    hash
}

/// The MST layer a key belongs to
///
/// Leading zero bits of the key's SHA-256, counted in 2-bit chunks
/// (fanout 4).
pub fn leading_zero_depth(key: &str) -> u32 {
    let mut zeros = 0;
    for byte in key_hash(key) {
        if byte == 0 {
            zeros += 8;
        } else {
            zeros += byte.leading_zeros();
            break;
        }
    }
    zeros / 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Link;

    fn entry(prefix_len: usize, key_suffix: &str) -> Entry {
        Entry {
            prefix_len,
            key_suffix: key_suffix.to_string(),
            value: Some(Link::Null),
            tree: None,
        }
    }

    fn node(entries: Vec<Entry>) -> TreeNode {
        TreeNode {
            left: None,
            entries,
        }
    }

    #[test]
    fn test_prefix_always_refers_to_first_entry() {
        // Chained against the previous key, entry 2 would read "app.bsky.feed.posepost/3kcccc".
        let node = node(vec![
            entry(0, "app.bsky.feed.like/3kaaaa"),
            entry(14, "post/3kbbbb"),
            entry(17, "epost/3kcccc"),
        ]);
        let keys = entry_keys(&Cid::new("bafy"), &node);
        assert_eq!(
            keys,
            vec![
                "app.bsky.feed.like/3kaaaa",
                "app.bsky.feed.post/3kbbbb",
                "app.bsky.feed.likepost/3kcccc",
            ]
        );
    }

    #[test]
    fn test_keys_ascend_in_well_formed_node() {
        let node = node(vec![
            entry(0, "app.bsky.feed.post/3k2aaa"),
            entry(22, "bbb"),
            entry(21, "3ccc"),
            entry(14, "repost/3k1aaa"),
        ]);
        let keys = entry_keys(&Cid::new("bafy"), &node);
        for pair in keys.windows(2) {
            assert!(pair[0] <= pair[1], "{} > {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_empty_node_has_no_keys() {
        assert!(entry_keys(&Cid::new("bafy"), &node(vec![])).is_empty());
    }

    #[test]
    fn test_prefix_past_base_key_is_capped() {
        let node = node(vec![
            entry(0, "app.bsky.actor.profile/self"),
            entry(9, "feed.post/3kaaaa"),
            entry(30, "b"),
        ]);
        let keys = entry_keys(&Cid::new("bafytree"), &node);
        assert_eq!(
            keys,
            vec![
                "app.bsky.actor.profile/self",
                "app.bsky.feed.post/3kaaaa",
                "app.bsky.actor.profile/selfb",
            ]
        );
    }

    #[test]
    fn test_prefix_inside_a_character_moves_back() {
        // "é" spans bytes 1..3
        let node = node(vec![entry(0, "héllo"), entry(2, "x")]);
        assert_eq!(entry_keys(&Cid::new("bafy"), &node), vec!["héllo", "hx"]);
        assert!(full_key("héllo", &entry(2, "x")).is_none());
    }

    #[test]
    fn test_nonzero_first_prefix_applies_to_itself() {
        let keys = entry_keys(&Cid::new("bafy"), &node(vec![entry(3, "abc")]));
        assert_eq!(keys, vec!["abcabc"]);
    }

    #[test]
    fn test_key_label() {
        let label = KeyLabel::parse("app.bsky.feed.post/3kabc1");
        assert_eq!(label.collection, "post");
        assert_eq!(label.rkey, "abc1");
        assert_eq!(label.to_string(), "post/abc1");

        assert_eq!(KeyLabel::parse("nokey").to_string(), "nokey/?");
        assert_eq!(KeyLabel::parse("").to_string(), "?/?");
    }

    #[test]
    fn test_leading_zero_depth_known_keys() {
        assert_eq!(leading_zero_depth("2653ae71"), 0);
        assert_eq!(leading_zero_depth("blue"), 1);
        assert_eq!(leading_zero_depth("app.bsky.feed.post/454397e440ec"), 4);
        assert_eq!(leading_zero_depth("app.bsky.feed.post/9adeb165882c"), 8);
    }
}
