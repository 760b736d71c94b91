use crate::error::{PreviewError, PreviewResult};
use crate::identifier::declares_component;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Accepted shapes of user-supplied source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Raw HTML markup, inserted verbatim into the mount point.
    Html,
    /// A JSX fragment body, wrapped in `<>...</>` and mounted.
    Jsx,
    /// A self-contained component definition (function or const style).
    Component,
}

impl Dialect {
    pub const ALL: [Dialect; 3] = [Dialect::Html, Dialect::Jsx, Dialect::Component];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Html => "html",
            Dialect::Jsx => "jsx",
            Dialect::Component => "component",
        }
    }

    /// Language tag for fenced code blocks.
    pub fn fence_language(&self) -> &'static str {
        match self {
            Dialect::Html => "html",
            Dialect::Jsx | Dialect::Component => "jsx",
        }
    }

    /// Guess the dialect of a file from its extension (without the dot).
    /// Script extensions are components when `text` declares one.
    pub fn from_extension(extension: &str, text: &str) -> Dialect {
        match extension.to_ascii_lowercase().as_str() {
            "jsx" | "tsx" | "js" if declares_component(text) => Dialect::Component,
            "jsx" | "tsx" | "js" => Dialect::Jsx,
            _ => Dialect::Html,
        }
    }

    /// Only the HTML dialect goes through the structural pre-check.
    pub fn needs_structure_check(&self) -> bool {
        matches!(self, Dialect::Html)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = PreviewError;

    fn from_str(s: &str) -> PreviewResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "html" => Ok(Dialect::Html),
            "jsx" => Ok(Dialect::Jsx),
            "component" => Ok(Dialect::Component),
            _ => Err(PreviewError::UnknownDialect(s.to_string())),
        }
    }
}
