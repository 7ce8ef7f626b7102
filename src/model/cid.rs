//! Content identifiers and link fields

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Number of trailing characters shown as a block's title
pub const SHORT_LEN: usize = 4;

/// An opaque content identifier naming a block
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "LinkRepr", into = "String")]
pub struct Cid(String);

impl Cid {
    pub fn new(cid: impl Into<String>) -> Self {
        Cid(cid.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The last few characters, used as a compact title in diagrams
    pub fn short(&self) -> &str {
        tail(&self.0, SHORT_LEN)
    }
}

impl fmt::Display for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cid({})", self.0)
    }
}

impl From<&str> for Cid {
    fn from(s: &str) -> Self {
        Cid(s.to_string())
    }
}

impl From<String> for Cid {
    fn from(s: String) -> Self {
        Cid(s)
    }
}

impl From<Cid> for String {
    fn from(cid: Cid) -> Self {
        cid.0
    }
}

/// A link as it appears on the wire: a bare CID string or a DAG-JSON
/// `{"$link": "<cid>"}` object
#[derive(Deserialize)]
#[serde(untagged)]
enum LinkRepr {
    Plain(String),
    Tagged {
        #[serde(rename = "$link")]
        link: String,
    },
}

impl From<LinkRepr> for Cid {
    fn from(repr: LinkRepr) -> Self {
        match repr {
            LinkRepr::Plain(s) | LinkRepr::Tagged { link: s } => Cid(s),
        }
    }
}

/// The value of a link field that is present in a block
///
/// A field missing from the block altogether is modelled as `None` around
/// this type; `Null` means the field exists but holds no link.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Link {
    Null,
    Cid(Cid),
}

impl Link {
    pub fn cid(&self) -> Option<&Cid> {
        match self {
            Link::Null => None,
            Link::Cid(cid) => Some(cid),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Link::Null)
    }
}

impl From<Option<Cid>> for Link {
    fn from(cid: Option<Cid>) -> Self {
        cid.map_or(Link::Null, Link::Cid)
    }
}

impl From<&str> for Link {
    fn from(s: &str) -> Self {
        Link::Cid(Cid::from(s))
    }
}

/// Deserialize an optional link field, keeping `null` distinct from a
/// missing field. Use together with `#[serde(default)]`.
///
/// An empty CID, plain or `$link`, is read as `null`.
pub(crate) fn deserialize_link<'de, D>(deserializer: D) -> Result<Option<Link>, D::Error>
where
    D: Deserializer<'de>,
{
    let cid: Option<Cid> = Option::deserialize(deserializer)?;
    Ok(Some(Link::from(cid.filter(|cid| !cid.as_str().is_empty()))))
}

/// The last `n` characters of `s`
pub fn tail(s: &str, n: usize) -> &str {
    let count = s.chars().count();
    if count <= n {
        return s;
    }
    let start = s
        .char_indices()
        .nth(count - n)
        .map(|(i, _)| i)
        .unwrap_or(0);
    &s[start..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Holder {
        #[serde(default, deserialize_with = "deserialize_link")]
        l: Option<Link>,
    }

    #[test]
    fn test_link_null_vs_missing() {
        let missing: Holder = serde_json::from_value(json!({})).unwrap();
        assert_eq!(missing.l, None);

        let null: Holder = serde_json::from_value(json!({ "l": null })).unwrap();
        assert_eq!(null.l, Some(Link::Null));

        let plain: Holder = serde_json::from_value(json!({ "l": "bafyabcd" })).unwrap();
        assert_eq!(plain.l, Some(Link::from("bafyabcd")));
    }

    #[test]
    fn test_dag_json_link() {
        let tagged: Holder =
            serde_json::from_value(json!({ "l": { "$link": "bafyxyz1" } })).unwrap();
        assert_eq!(tagged.l, Some(Link::from("bafyxyz1")));
    }

    #[test]
    fn test_empty_link_is_null() {
        let plain: Holder = serde_json::from_value(json!({ "l": "" })).unwrap();
        assert_eq!(plain.l, Some(Link::Null));

        let tagged: Holder = serde_json::from_value(json!({ "l": { "$link": "" } })).unwrap();
        assert_eq!(tagged.l, Some(Link::Null));
    }

    #[test]
    fn test_short() {
        assert_eq!(Cid::new("bafyreiabcd1234").short(), "1234");
        assert_eq!(Cid::new("ab").short(), "ab");
        assert_eq!(tail("héllo", 4), "éllo");
    }
}
