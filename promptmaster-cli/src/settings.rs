//! Persistent user settings.
//!
//! One JSON file, loaded once at startup and rewritten on every change.
//! Values taken from the environment override the file for the current
//! process only and are never written back.

use crate::error::{AppError, AppResult};
use crate::prompt::{PromptConfig, DEFAULT_PROMPT_TEMPLATE};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const SETTINGS_PATH_ENV: &str = "PROMPTMASTER_SETTINGS";
pub const AI_ENDPOINT_ENV: &str = "PROMPTMASTER_AI_ENDPOINT";
pub const API_KEY_ENV: &str = "PROMPTMASTER_API_KEY";
pub const MODEL_ENV: &str = "PROMPTMASTER_MODEL";

pub const DEFAULT_AI_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Keys accepted by [`Settings::set`].
pub const SETTING_KEYS: &[&str] = &[
    "dark_mode",
    "include_rtl",
    "use_grids",
    "optimize_svgs",
    "custom_prompt",
    "site_url",
    "ai.endpoint",
    "ai.api_key",
    "ai.model",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiSettings {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_AI_ENDPOINT.to_string(),
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub dark_mode: bool,
    pub prompt: PromptConfig,
    pub custom_prompt: Option<String>,
    pub site_url: Option<String>,
    pub ai: AiSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dark_mode: true,
            prompt: PromptConfig::default(),
            custom_prompt: None,
            site_url: None,
            ai: AiSettings::default(),
        }
    }
}

impl Settings {
    /// The prompt template in effect: the custom one if set.
    pub fn template(&self) -> &str {
        match self.custom_prompt.as_deref() {
            Some(custom) if !custom.trim().is_empty() => custom,
            _ => DEFAULT_PROMPT_TEMPLATE,
        }
    }

    pub fn set(&mut self, key: &str, value: &str) -> AppResult<()> {
        match key {
            "dark_mode" => self.dark_mode = parse_flag(key, value)?,
            "include_rtl" => self.prompt.include_rtl = parse_flag(key, value)?,
            "use_grids" => self.prompt.use_grids = parse_flag(key, value)?,
            "optimize_svgs" => self.prompt.optimize_svgs = parse_flag(key, value)?,
            "custom_prompt" => self.custom_prompt = non_empty(value),
            "site_url" => self.site_url = non_empty(value),
            "ai.endpoint" => self.ai.endpoint = value.trim().to_string(),
            "ai.api_key" => self.ai.api_key = value.trim().to_string(),
            "ai.model" => self.ai.model = value.trim().to_string(),
            _ => {
                return Err(AppError::invalid_setting(
                    key,
                    format!("unknown key, expected one of: {}", SETTING_KEYS.join(", ")),
                ))
            }
        }
        Ok(())
    }

    /// Copy safe to print: the API key is masked.
    pub fn masked(&self) -> Settings {
        let mut copy = self.clone();
        copy.ai.api_key = mask_secret(&self.ai.api_key);
        copy
    }
}

fn parse_flag(key: &str, value: &str) -> AppResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(AppError::invalid_setting(
            key,
            format!("expected true or false, got '{}'", other),
        )),
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// `sk-abcdef123456` -> `sk-a…3456`; short secrets are fully hidden.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    match chars.len() {
        0 => String::new(),
        n if n <= 8 => "*".repeat(n),
        n => {
            let head: String = chars[..4].iter().collect();
            let tail: String = chars[n - 4..].iter().collect();
            format!("{head}…{tail}")
        }
    }
}

/// Process-level overrides read from the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        Self {
            endpoint: read(AI_ENDPOINT_ENV),
            api_key: read(API_KEY_ENV),
            model: read(MODEL_ENV),
        }
    }

    fn apply(&self, settings: &mut Settings) {
        if let Some(endpoint) = &self.endpoint {
            settings.ai.endpoint = endpoint.clone();
        }
        if let Some(api_key) = &self.api_key {
            settings.ai.api_key = api_key.clone();
        }
        if let Some(model) = &self.model {
            settings.ai.model = model.clone();
        }
    }
}

pub struct SettingsStore {
    path: PathBuf,
    stored: Settings,
    overrides: EnvOverrides,
}

impl SettingsStore {
    /// `$PROMPTMASTER_SETTINGS`, else `<config dir>/promptmaster/settings.json`.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var(SETTINGS_PATH_ENV) {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("promptmaster")
            .join("settings.json")
    }

    pub fn load() -> Self {
        Self::open(Self::default_path(), EnvOverrides::from_env())
    }

    /// Load `path`. A missing file yields defaults; an unreadable one is
    /// logged and also yields defaults.
    pub fn open(path: impl Into<PathBuf>, overrides: EnvOverrides) -> Self {
        let path = path.into();
        let stored = match read_settings(&path) {
            Ok(Some(settings)) => {
                tracing::debug!(path = %path.display(), "settings loaded");
                settings
            }
            Ok(None) => Settings::default(),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "ignoring unreadable settings file"
                );
                Settings::default()
            }
        };
        Self {
            path,
            stored,
            overrides,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Settings in effect for this process (file plus environment).
    pub fn settings(&self) -> Settings {
        let mut effective = self.stored.clone();
        self.overrides.apply(&mut effective);
        effective
    }

    /// Change one key and persist.
    pub fn set(&mut self, key: &str, value: &str) -> AppResult<()> {
        self.stored.set(key, value)?;
        self.save()?;
        tracing::info!(key, "setting updated");
        Ok(())
    }

    pub fn update(&mut self, change: impl FnOnce(&mut Settings)) -> AppResult<()> {
        change(&mut self.stored);
        self.save()
    }

    /// Pretty JSON, written to a sibling temp file and renamed into place.
    pub fn save(&self) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&self.stored)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

fn read_settings(path: &Path) -> AppResult<Option<Settings>> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    Ok(Some(serde_json::from_str(&text)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults() {
        let settings = Settings::default();
        assert!(settings.dark_mode);
        assert_eq!(settings.ai.model, "gpt-4o");
        assert_eq!(settings.template(), DEFAULT_PROMPT_TEMPLATE);
    }

    #[test]
    fn set_flags_and_strings() {
        let mut settings = Settings::default();
        settings.set("include_rtl", "off").unwrap();
        settings.set("dark_mode", "false").unwrap();
        settings.set("ai.model", " gpt-4o-mini ").unwrap();
        settings.set("custom_prompt", "Convert {{CODE}}").unwrap();

        assert!(!settings.prompt.include_rtl);
        assert!(!settings.dark_mode);
        assert_eq!(settings.ai.model, "gpt-4o-mini");
        assert_eq!(settings.template(), "Convert {{CODE}}");

        settings.set("custom_prompt", "").unwrap();
        assert_eq!(settings.custom_prompt, None);
    }

    #[test]
    fn rejects_unknown_keys_and_bad_flags() {
        let mut settings = Settings::default();
        assert!(matches!(
            settings.set("theme", "dark"),
            Err(AppError::InvalidSetting { .. })
        ));
        assert!(matches!(
            settings.set("use_grids", "maybe"),
            Err(AppError::InvalidSetting { .. })
        ));
    }

    #[test]
    fn masks_api_key() {
        assert_eq!(mask_secret(""), "");
        assert_eq!(mask_secret("short"), "*****");
        assert_eq!(mask_secret("sk-abcdef123456"), "sk-a…3456");

        let mut settings = Settings::default();
        settings.ai.api_key = "sk-abcdef123456".to_string();
        assert_eq!(settings.masked().ai.api_key, "sk-a…3456");
        assert_eq!(settings.ai.api_key, "sk-abcdef123456");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"dark_mode": false}"#).unwrap();
        assert!(!settings.dark_mode);
        assert!(settings.prompt.use_grids);
        assert_eq!(settings.ai.endpoint, DEFAULT_AI_ENDPOINT);
    }

    #[test]
    fn env_overrides_ignore_blank_values() {
        let overrides = EnvOverrides::from_lookup(|name| match name {
            API_KEY_ENV => Some("sk-env".to_string()),
            MODEL_ENV => Some("  ".to_string()),
            _ => None,
        });
        assert_eq!(overrides.api_key.as_deref(), Some("sk-env"));
        assert_eq!(overrides.model, None);
    }
}
