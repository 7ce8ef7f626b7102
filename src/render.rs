//! Writing diagrams out
//!
//! DOT text goes to stdout or a file. Image formats are produced by
//! handing a temporary DOT file to the Graphviz `dot` binary.

use crate::config::DiagramConfig;
use crate::graph::GraphBuilder;
use crate::{Error, Result};
use std::io::Write;
use std::path::Path;
use std::process::Command;
use std::str::FromStr;
use tracing::{debug, info};

/// Output formats, named after Graphviz's `-T` values
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Dot,
    Png,
    Svg,
    Pdf,
    Ps,
    Jpg,
    Gif,
    Json,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Dot => "dot",
            OutputFormat::Png => "png",
            OutputFormat::Svg => "svg",
            OutputFormat::Pdf => "pdf",
            OutputFormat::Ps => "ps",
            OutputFormat::Jpg => "jpg",
            OutputFormat::Gif => "gif",
            OutputFormat::Json => "json",
        }
    }

    /// Guess the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| Error::Render(format!("no extension on {}", path.display())))?;
        ext.parse()
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "dot" | "gv" => Ok(OutputFormat::Dot),
            "png" => Ok(OutputFormat::Png),
            "svg" => Ok(OutputFormat::Svg),
            "pdf" => Ok(OutputFormat::Pdf),
            "ps" => Ok(OutputFormat::Ps),
            "jpg" | "jpeg" => Ok(OutputFormat::Jpg),
            "gif" => Ok(OutputFormat::Gif),
            "json" => Ok(OutputFormat::Json),
            other => Err(Error::Render(format!("unsupported output format: {}", other))),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Pick the format: explicit choice, else the output extension, else DOT
pub fn resolve_format(format: Option<OutputFormat>, output: Option<&Path>) -> Result<OutputFormat> {
    match (format, output) {
        (Some(format), _) => Ok(format),
        (None, Some(path)) => OutputFormat::from_path(path),
        (None, None) => Ok(OutputFormat::Dot),
    }
}

/// Write a finished graph
///
/// With no output path the DOT text goes to stdout. Non-DOT formats need
/// an output path and the `dot` binary from the config.
pub fn emit(
    graph: &GraphBuilder,
    output: Option<&Path>,
    format: OutputFormat,
    config: &DiagramConfig,
) -> Result<()> {
    match (format, output) {
        (OutputFormat::Dot, None) => {
            let mut stdout = std::io::stdout().lock();
            graph.write_dot(&mut stdout)?;
            stdout.flush()?;
        }
        (OutputFormat::Dot, Some(path)) => {
            std::fs::write(path, graph.to_dot())?;
            info!(path = %path.display(), "wrote DOT");
        }
        (format, None) => {
            return Err(Error::Render(format!(
                "{} output needs an output path",
                format
            )));
        }
        (format, Some(path)) => run_dot(graph, path, format, &config.dot_binary)?,
    }
    Ok(())
}

/// Lay out `graph` with Graphviz and write the image to `output`
fn run_dot(graph: &GraphBuilder, output: &Path, format: OutputFormat, binary: &str) -> Result<()> {
    let mut source = tempfile::Builder::new()
        .prefix("mstviz-")
        .suffix(".dot")
        .tempfile()?;
    graph.write_dot(&mut source)?;
    source.flush()?;

    let mut command = Command::new(binary);
    command
        .arg(format!("-T{}", format))
        .arg(format!("-o{}", output.display()))
        .arg(source.path());
    debug!(?command, "running graphviz");

    let status = command
        .status()
        .map_err(|e| Error::Render(format!("failed to run {}: {}", binary, e)))?;
    if !status.success() {
        return Err(Error::Render(format!("{} exited with {}", binary, status)));
    }

    info!(path = %output.display(), %format, "rendered diagram");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{DotNode, Shape};
    use std::path::PathBuf;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            OutputFormat::from_path(Path::new("tree.svg")).unwrap(),
            OutputFormat::Svg
        );
        assert_eq!(
            OutputFormat::from_path(Path::new("tree.PNG")).unwrap(),
            OutputFormat::Png
        );
        assert!(OutputFormat::from_path(Path::new("tree")).is_err());
        assert!(OutputFormat::from_path(Path::new("tree.docx")).is_err());
    }

    #[test]
    fn test_resolve_format() {
        let out = PathBuf::from("x.pdf");
        assert_eq!(resolve_format(None, None).unwrap(), OutputFormat::Dot);
        assert_eq!(resolve_format(None, Some(&out)).unwrap(), OutputFormat::Pdf);
        assert_eq!(
            resolve_format(Some(OutputFormat::Dot), Some(&out)).unwrap(),
            OutputFormat::Dot
        );
    }

    #[test]
    fn test_emit_dot_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.dot");
        let mut graph = GraphBuilder::new();
        graph.add_node(DotNode::new("roots", Shape::Circle));

        emit(&graph, Some(&path), OutputFormat::Dot, &DiagramConfig::default()).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "digraph { rankdir=LR\nroots [shape=\"circle\"]\n}\n");
    }

    #[test]
    fn test_image_format_needs_path() {
        let graph = GraphBuilder::new();
        let err = emit(&graph, None, OutputFormat::Png, &DiagramConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Render(_)));
    }

    #[test]
    fn test_missing_graphviz_binary() {
        let dir = tempfile::tempdir().unwrap();
        let config = DiagramConfig {
            dot_binary: dir.path().join("no-such-dot").display().to_string(),
            ..DiagramConfig::default()
        };
        let err = emit(
            &GraphBuilder::new(),
            Some(&dir.path().join("out.png")),
            OutputFormat::Png,
            &config,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Render(_)));
    }
}
