use thiserror::Error;

pub type PreviewResult<T> = Result<T, PreviewError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreviewError {
    #[error("Syntax error in HTML structure at line {line}, column {column}: {message}")]
    Structure {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Unknown dialect '{0}'. Expected one of: html, jsx, component")]
    UnknownDialect(String),

    #[error("Render surface error: {0}")]
    Surface(String),

    #[error("Render host has shut down")]
    HostClosed,

    #[error("Preview scheduler has shut down")]
    SchedulerClosed,
}

impl PreviewError {
    /// Shorthand used by the structure checker.
    pub(crate) fn structure(line: usize, column: usize, message: impl Into<String>) -> Self {
        PreviewError::Structure {
            line,
            column,
            message: message.into(),
        }
    }

    /// True for errors caused by the source text rather than the pipeline.
    pub fn is_structural(&self) -> bool {
        matches!(self, PreviewError::Structure { .. })
    }
}
