//! promptmaster: live preview, Elementor prompt builder and JSON export.
//!
//! The preview itself lives in `promptmaster_preview`; this crate adds
//! everything around it: settings, prompt construction, the AI call,
//! JSON conversion and the local HTTP host used by `promptmaster watch`.

pub mod ai_client;
pub mod cli;
pub mod elementor;
pub mod error;
pub mod input;
pub mod portals;
pub mod prompt;
pub mod server;
pub mod settings;
pub mod toast;
pub mod watch;

pub use error::{AppError, AppResult};
pub use prompt::{build_prompt, PromptConfig, DEFAULT_PROMPT_TEMPLATE};
pub use server::{router, AppState, PreviewStatus, ServedSurfaces};
pub use settings::{Settings, SettingsStore};
