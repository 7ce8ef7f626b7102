//! Graphviz DOT node descriptions

use std::fmt;

/// Node shapes used by the diagrams
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    Circle,
    Record,
    Box,
}

impl Shape {
    pub fn as_str(&self) -> &'static str {
        match self {
            Shape::Circle => "circle",
            Shape::Record => "record",
            Shape::Box => "box",
        }
    }
}

/// One field of a record-shaped label
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Field {
    /// Text with an optional port name edges can attach to
    Text { port: Option<String>, text: String },
    /// A nested group, drawn perpendicular to its parent
    Group(Vec<Field>),
}

impl Field {
    pub fn text(text: impl Into<String>) -> Self {
        Field::Text {
            port: None,
            text: text.into(),
        }
    }

    pub fn port(port: impl Into<String>, text: impl Into<String>) -> Self {
        Field::Text {
            port: Some(port.into()),
            text: text.into(),
        }
    }

    fn render(&self, out: &mut String) {
        match self {
            Field::Text { port, text } => {
                if let Some(port) = port {
                    out.push('<');
                    out.push_str(port);
                    out.push('>');
                }
                out.push_str(&escape_record(text));
            }
            Field::Group(fields) => {
                out.push_str("{ ");
                render_fields(fields, out);
                out.push_str(" }");
            }
        }
    }
}

fn render_fields(fields: &[Field], out: &mut String) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push_str(" | ");
        }
        field.render(out);
    }
}

/// A node label
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Label {
    /// Plain quoted text
    Text(String),
    /// Record fields, `a | <p>b | { c | d }`
    Record(Vec<Field>),
    /// HTML-like label, emitted between `<` and `>` unescaped
    Html(String),
}

impl Label {
    fn render(&self) -> String {
        match self {
            Label::Text(text) => format!("\"{}\"", escape_quoted(text)),
            Label::Record(fields) => {
                let mut out = String::new();
                render_fields(fields, &mut out);
                format!("\"{}\"", out)
            }
            Label::Html(html) => format!("<{}>", html),
        }
    }
}

/// A node declaration in a DOT graph
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DotNode {
    pub id: String,
    pub shape: Shape,
    pub color: Option<String>,
    pub label: Option<Label>,
}

impl DotNode {
    pub fn new(id: impl Into<String>, shape: Shape) -> Self {
        DotNode {
            id: id.into(),
            shape,
            color: None,
            label: None,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn with_label(mut self, label: Label) -> Self {
        self.label = Some(label);
        self
    }
}

impl fmt::Display for DotNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [shape=\"{}\"", dot_id(&self.id), self.shape.as_str())?;
        if let Some(color) = &self.color {
            write!(f, " color=\"{}\"", escape_quoted(color))?;
        }
        if let Some(label) = &self.label {
            write!(f, " label={}", label.render())?;
        }
        write!(f, "]")
    }
}

/// Render an identifier, quoting it unless it is a plain DOT word
pub fn dot_id(id: &str) -> String {
    let plain = id
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain {
        id.to_string()
    } else {
        format!("\"{}\"", escape_quoted(id))
    }
}

/// Escape text for a double-quoted DOT string
pub fn escape_quoted(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '"' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            '\r' => {}
            _ => out.push(c),
        }
    }
    out
}

/// Escape text inside a record label field
///
/// Newlines become DOT's `\n` line break.
pub fn escape_record(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '"' | '\\' | '{' | '}' | '|' | '<' | '>' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            '\r' => {}
            _ => out.push(c),
        }
    }
    out
}

/// Escape text for an HTML-like label
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
