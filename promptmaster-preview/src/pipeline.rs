//! Synchronous preparation of one render request: structural check,
//! bootstrap generation and document assembly.

use crate::bootstrap::build_bootstrap;
use crate::document::assemble;
use crate::outcome::RenderOutcome;
use crate::source::{RenderRequest, SourceDocument};
use crate::structure::check_structure;

/// Prepare the outcome for `request`.
///
/// Structural problems in HTML input become `Failed` and no document is
/// assembled; everything else yields a `Rendered` document whose own
/// script contains mount-time failures.
pub fn render(request: &RenderRequest) -> RenderOutcome {
    render_source(&request.source, request.is_dark)
}

pub fn render_source(source: &SourceDocument, is_dark: bool) -> RenderOutcome {
    if source.is_blank() {
        return RenderOutcome::Empty;
    }

    if source.dialect.needs_structure_check() {
        if let Err(e) = check_structure(&source.text) {
            tracing::debug!(error = %e, "structural check rejected source");
            return RenderOutcome::Failed(e.to_string());
        }
    }

    let script = build_bootstrap(&source.text, source.dialect);
    RenderOutcome::Rendered(assemble(&script, is_dark))
}
