use crate::dialect::Dialect;
use serde::{Deserialize, Serialize};

/// The text currently in the editor together with its dialect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    pub text: String,
    pub dialect: Dialect,
}

impl SourceDocument {
    pub fn new(text: impl Into<String>, dialect: Dialect) -> Self {
        Self {
            text: text.into(),
            dialect,
        }
    }

    /// Empty or whitespace-only text never reaches the bootstrapper.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Snapshot of the input taken for one scheduled render.
///
/// `generation` increases with every accepted edit; a request whose
/// generation is no longer current has been superseded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    pub generation: u64,
    pub source: SourceDocument,
    pub is_dark: bool,
}

impl RenderRequest {
    pub fn new(generation: u64, source: SourceDocument, is_dark: bool) -> Self {
        Self {
            generation,
            source,
            is_dark,
        }
    }
}
