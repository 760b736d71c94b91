//! Handling of the JSON the AI sends back.
//!
//! The verbatim reply is what users download. The reshaped import file
//! wraps the elements in the envelope Elementor's template importer
//! expects.

use crate::error::{AppError, AppResult};
use chrono::{DateTime, TimeZone};
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};

pub const FILE_PREFIX: &str = "elementor-ai-";
const DEFAULT_TEMPLATE_TYPE: &str = "page";

/// Parse `text` as JSON. A markdown code fence around it is ignored.
pub fn validate_json(text: &str) -> AppResult<Value> {
    serde_json::from_str(strip_code_fence(text))
        .map_err(|e| AppError::InvalidJson(e.to_string()))
}

/// Strip a surrounding ```json fence from a reply, if any.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(start) = trimmed.find("```") else {
        return trimmed;
    };
    let after = &trimmed[start + 3..];
    let body_start = after.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after[body_start..];
    match body.rfind("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

/// `elementor-ai-MMDDhhmmss.json` for `now`.
pub fn download_filename<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("{}{}.json", FILE_PREFIX, now.format("%m%d%H%M%S"))
}

/// Wrap `value` into `{ type, siteurl, elements }`.
pub fn reshape(value: &Value, site_url: Option<&str>) -> Value {
    let elements = value
        .get("content")
        .or_else(|| value.get("elements"))
        .cloned()
        .unwrap_or_else(|| match value {
            Value::Array(_) => value.clone(),
            other => Value::Array(vec![other.clone()]),
        });

    let template_type = value
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_TEMPLATE_TYPE);

    let site_url = site_url
        .filter(|url| !url.trim().is_empty())
        .or_else(|| value.get("siteurl").and_then(Value::as_str))
        .unwrap_or("");

    json!({
        "type": template_type,
        "siteurl": site_url,
        "elements": elements,
    })
}

/// Files written by [`export`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFiles {
    pub raw: PathBuf,
    pub import: PathBuf,
}

/// Validate `text`, then write the JSON verbatim (without any code fence)
/// plus a reshaped `*.import.json` into `dir`.
pub fn export<Tz: TimeZone>(
    text: &str,
    dir: &Path,
    site_url: Option<&str>,
    now: &DateTime<Tz>,
) -> AppResult<ExportedFiles>
where
    Tz::Offset: std::fmt::Display,
{
    let json = strip_code_fence(text);
    let value = validate_json(json)?;
    fs::create_dir_all(dir)?;

    let raw = dir.join(download_filename(now));
    let import = raw.with_extension("import.json");

    fs::write(&raw, json)?;
    fs::write(&import, serde_json::to_string_pretty(&reshape(&value, site_url))?)?;

    tracing::info!(raw = %raw.display(), import = %import.display(), "elementor template exported");
    Ok(ExportedFiles { raw, import })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    #[test]
    fn filename_uses_month_day_time() {
        let now = Utc.with_ymd_and_hms(2024, 3, 7, 9, 5, 2).unwrap();
        assert_eq!(download_filename(&now), "elementor-ai-0307090502.json");
    }

    #[test]
    fn invalid_json_is_reported() {
        assert!(matches!(validate_json("{not json"), Err(AppError::InvalidJson(_))));
        assert!(validate_json("  {\"a\": 1}\n").is_ok());
    }

    #[test]
    fn fenced_reply_is_accepted() {
        let reply = "```json\n{\"type\": \"page\"}\n```";
        assert_eq!(validate_json(reply).unwrap(), json!({ "type": "page" }));
        assert_eq!(strip_code_fence("```\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fence("  {\"a\":1} "), "{\"a\":1}");
    }

    #[test]
    fn reshape_prefers_content() {
        let value = json!({
            "type": "section",
            "content": [{ "id": "a" }],
            "elements": [{ "id": "b" }],
        });
        assert_eq!(
            reshape(&value, Some("https://example.com")),
            json!({
                "type": "section",
                "siteurl": "https://example.com",
                "elements": [{ "id": "a" }],
            })
        );
    }

    #[test]
    fn reshape_falls_back_to_elements_then_array_then_value() {
        let elements = json!({ "elements": [{ "id": "b" }] });
        assert_eq!(reshape(&elements, None)["elements"], json!([{ "id": "b" }]));

        let array = json!([{ "id": "c" }]);
        assert_eq!(reshape(&array, None)["elements"], json!([{ "id": "c" }]));

        let single = json!({ "version": "0.4", "type": "container" });
        let reshaped = reshape(&single, None);
        assert_eq!(reshaped["elements"], json!([single]));
        assert_eq!(reshaped["type"], json!("container"));
    }

    #[test]
    fn reshape_defaults() {
        let reshaped = reshape(&json!({ "siteurl": "https://from-input" }), None);
        assert_eq!(reshaped["type"], json!("page"));
        assert_eq!(reshaped["siteurl"], json!("https://from-input"));

        let reshaped = reshape(&json!([]), Some(""));
        assert_eq!(reshaped["siteurl"], json!(""));
    }
}
