//! Domain types for the template registry.
//!
//! A template body is stored as an ordered list of raw text segments; the
//! body seen by the compiler is the segments concatenated with no separator.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed name for a registered template.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TemplateName(pub String);

impl fmt::Display for TemplateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for TemplateName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TemplateName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl AsRef<str> for TemplateName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// TemplateDefinition
// ---------------------------------------------------------------------------

/// A named template body made of raw text segments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateDefinition {
    pub name: TemplateName,
    pub segments: Vec<String>,
}

impl TemplateDefinition {
    pub fn new(name: impl Into<TemplateName>, segments: Vec<String>) -> Self {
        Self {
            name: name.into(),
            segments,
        }
    }

    /// Single-segment definition.
    pub fn from_body(name: impl Into<TemplateName>, body: impl Into<String>) -> Self {
        Self::new(name, vec![body.into()])
    }

    /// One segment per source line; line terminators are dropped, so the
    /// joined body contains no newlines introduced by the file layout.
    pub fn from_lines(name: impl Into<TemplateName>, source: &str) -> Self {
        let segments = source
            .lines()
            .filter(|line| !line.is_empty())
            .map(str::to_owned)
            .collect();
        Self::new(name, segments)
    }

    /// The flat template body.
    pub fn body(&self) -> String {
        self.segments.concat()
    }
}

/// Catalogue file entry: either a flat body or a list of segments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CatalogueEntry {
    Body(String),
    Segments(Vec<String>),
}

impl CatalogueEntry {
    pub fn into_definition(self, name: TemplateName) -> TemplateDefinition {
        match self {
            CatalogueEntry::Body(body) => TemplateDefinition::from_body(name, body),
            CatalogueEntry::Segments(segments) => TemplateDefinition::new(name, segments),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_joins_segments_without_separator() {
        let def = TemplateDefinition::new(
            "formResponse",
            vec!["<p>".into(), "<% this.msg %>".into(), "</p>".into()],
        );
        assert_eq!(def.body(), "<p><% this.msg %></p>");
    }

    #[test]
    fn from_lines_drops_line_terminators() {
        let def = TemplateDefinition::from_lines("blocker", "<div>\r\n<span></span>\n</div>\n");
        assert_eq!(def.segments.len(), 3);
        assert_eq!(def.body(), "<div><span></span></div>");
    }

    #[test]
    fn template_name_display() {
        assert_eq!(TemplateName::from("layer").to_string(), "layer");
    }
}
