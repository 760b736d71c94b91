use crate::error::{AppError, AppResult};
use promptmaster_preview::Dialect;
use std::path::Path;

/// Read a source file, keeping the path in the error.
pub fn read_source(path: &Path) -> AppResult<String> {
    std::fs::read_to_string(path).map_err(|source| AppError::ReadSource {
        path: path.to_path_buf(),
        source,
    })
}

/// Dialect for a file on disk; files without an extension are HTML.
pub fn detect_dialect(path: &Path, text: &str) -> Dialect {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    Dialect::from_extension(ext, text)
}
