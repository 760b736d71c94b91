use crate::document::AssembledDocument;

/// Current display state of the preview pipeline.
///
/// `Empty -> Pending -> {Rendered | Failed} -> Pending -> ...`; `Empty`
/// is reachable only when the text becomes blank and `Failed` only
/// through the structural check. Mount-time errors stay inside a
/// `Rendered` document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RenderOutcome {
    #[default]
    Empty,
    Pending,
    Rendered(AssembledDocument),
    Failed(String),
}

impl RenderOutcome {
    pub fn is_pending(&self) -> bool {
        matches!(self, RenderOutcome::Pending)
    }

    pub fn document(&self) -> Option<&AssembledDocument> {
        match self {
            RenderOutcome::Rendered(doc) => Some(doc),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            RenderOutcome::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// Short lowercase name, used in logs and status payloads.
    pub fn label(&self) -> &'static str {
        match self {
            RenderOutcome::Empty => "empty",
            RenderOutcome::Pending => "pending",
            RenderOutcome::Rendered(_) => "rendered",
            RenderOutcome::Failed(_) => "failed",
        }
    }
}
