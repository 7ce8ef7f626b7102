//! Diagram configuration
//!
//! Stored in ~/.config/mstviz/config.json. Every field is optional in the
//! file; missing fields take their defaults.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Colors, label limits and toggles for both diagram kinds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagramConfig {
    /// Color of structural links (roots, sub-trees, op anchors)
    pub structural_color: String,
    /// Color of value links (entry values, commit data, op targets)
    pub value_color: String,
    /// Thread diagrams: color of parent → child edges
    pub parent_color: String,
    /// Thread diagrams: color of post → reply edges
    pub reply_color: String,
    /// Thread diagrams: node color for highlighted authors
    pub highlight_color: String,
    /// Thread diagrams: author handles drawn in `highlight_color`
    pub highlight_handles: Vec<String>,
    /// Maximum characters of post text shown in a label
    pub text_limit: usize,
    /// Draw placeholders for null `l`/`t` sub-tree links
    pub null_links: bool,
    /// Append the key depth to each tree entry label
    pub show_depth: bool,
    /// Graphviz binary used for non-DOT output formats
    pub dot_binary: String,
}

impl Default for DiagramConfig {
    fn default() -> Self {
        DiagramConfig {
            structural_color: "black".into(),
            value_color: "red".into(),
            parent_color: "red".into(),
            reply_color: "green".into(),
            highlight_color: "red".into(),
            highlight_handles: Vec::new(),
            text_limit: 30,
            null_links: true,
            show_depth: false,
            dot_binary: "dot".into(),
        }
    }
}

impl DiagramConfig {
    /// Default config file location (~/.config/mstviz/config.json)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("mstviz").join("config.json"))
    }

    /// Load configuration
    ///
    /// An explicit `path` must exist. Without one, the default location is
    /// used if present, otherwise the built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Read a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// True if `handle` should be drawn in the highlight color
    pub fn is_highlighted(&self, handle: &str) -> bool {
        self.highlight_handles.iter().any(|h| h == handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_partial_file_uses_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "value_color": "blue", "highlight_handles": ["alice.test"] }}"#).unwrap();

        let config = DiagramConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.value_color, "blue");
        assert_eq!(config.structural_color, "black");
        assert_eq!(config.text_limit, 30);
        assert!(config.is_highlighted("alice.test"));
        assert!(!config.is_highlighted("bob.test"));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = DiagramConfig::load(Some(&dir.path().join("nope.json"))).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_invalid_file_is_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = DiagramConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
