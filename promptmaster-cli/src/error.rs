use promptmaster_preview::PreviewError;
use std::path::PathBuf;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Preview(#[from] PreviewError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Nothing to convert: the source is empty")]
    EmptySource,

    #[error("Invalid JSON format: {0}")]
    InvalidJson(String),

    #[error("Invalid setting '{key}': {reason}")]
    InvalidSetting { key: String, reason: String },

    #[error("No API key configured. Set it with `promptmaster settings set ai.api_key <key>` or PROMPTMASTER_API_KEY")]
    MissingApiKey,

    #[error("AI endpoint returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("AI endpoint returned no message content")]
    EmptyResponse,

    #[error("Cannot read {path}: {source}")]
    ReadSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AppError {
    pub(crate) fn invalid_setting(key: &str, reason: impl Into<String>) -> Self {
        AppError::InvalidSetting {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}
