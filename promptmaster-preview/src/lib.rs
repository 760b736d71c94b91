//! # promptmaster live preview
//!
//! Renders untrusted, user-supplied markup into an isolated document.
//! Three dialects are accepted: raw HTML, a JSX fragment, or a full
//! component with local state.
//!
//! ## Pieces
//! - [`bootstrap`] builds the mount script for a dialect (first error
//!   containment layer, inside the document)
//! - [`document`] wraps the script into a complete document
//! - [`structure`] rejects unbalanced HTML before anything is assembled
//!   (second containment layer)
//! - [`scheduler`] debounces edits, cancels superseded work and tracks
//!   the [`RenderOutcome`]
//! - [`host`] owns the isolated surface and recreates it on every render
//!
//! ## Example: one-shot render
//! ```ignore
//! use promptmaster_preview::{render_source, Dialect, SourceDocument};
//!
//! let source = SourceDocument::new("<div class=\"p-4\">Hello</div>", Dialect::Html);
//! let outcome = render_source(&source, false);
//! let html = outcome.document().expect("rendered").as_str();
//! ```
//!
//! ## Example: live preview
//! ```ignore
//! use promptmaster_preview::{MemorySurfaces, PreviewScheduler, RenderHost, SchedulerConfig};
//!
//! let (host, _task) = RenderHost::spawn(MemorySurfaces::new());
//! let scheduler = PreviewScheduler::spawn(SchedulerConfig::default(), host);
//! scheduler.submit(SourceDocument::new("const App = () => <b>hi</b>;", Dialect::Component))?;
//! let outcome = scheduler.settled().await;
//! ```

pub mod bootstrap;
pub mod dialect;
pub mod document;
pub mod error;
pub mod host;
pub mod identifier;
pub mod outcome;
pub mod pipeline;
pub mod scheduler;
pub mod source;
pub mod structure;
pub mod theme;

// --- Core types ---
pub use dialect::Dialect;
pub use document::AssembledDocument;
pub use error::{PreviewError, PreviewResult};
pub use outcome::RenderOutcome;
pub use source::{RenderRequest, SourceDocument};
pub use theme::Theme;

// --- Runtime ---
pub use host::{Frame, MemorySurfaces, RenderHost, RenderHostHandle, RenderSurface, SurfaceFactory};
pub use scheduler::{PreviewScheduler, PreviewState, SchedulerConfig};

pub use bootstrap::build_bootstrap;
pub use document::assemble;
pub use identifier::{guess_component_name, FALLBACK_COMPONENT};
pub use pipeline::{render, render_source};
pub use structure::check_structure;
