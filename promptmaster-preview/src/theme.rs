use serde::{Deserialize, Serialize};

const REFERENCE_PREFIX: &str = "$theme.";

/// Foreground/background tokens for the preview document.
///
/// The theme never changes behaviour, only these two colors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub foreground: String,
    pub background: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self::light()
    }
}

impl Theme {
    pub fn light() -> Self {
        Self {
            foreground: "#000000".to_string(),
            background: "#ffffff".to_string(),
        }
    }

    pub fn dark() -> Self {
        Self {
            foreground: "#e2e8f0".to_string(),
            background: "#0f172a".to_string(),
        }
    }

    pub fn for_mode(is_dark: bool) -> Self {
        if is_dark {
            Self::dark()
        } else {
            Self::light()
        }
    }

    /// Resolve a theme variable reference (e.g. `$theme.background`).
    pub fn resolve(&self, reference: &str) -> Option<&str> {
        match reference.strip_prefix(REFERENCE_PREFIX)? {
            "foreground" => Some(&self.foreground),
            "background" => Some(&self.background),
            _ => None,
        }
    }

    /// Replace every known `$theme.<token>` reference in `template`.
    /// Unknown references are left untouched.
    pub fn apply(&self, template: &str) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(at) = rest.find(REFERENCE_PREFIX) {
            out.push_str(&rest[..at]);
            let tail = &rest[at..];
            let token_len = tail[REFERENCE_PREFIX.len()..]
                .find(|c: char| !c.is_ascii_alphanumeric() && c != '_')
                .map(|n| n + REFERENCE_PREFIX.len())
                .unwrap_or(tail.len());
            let reference = &tail[..token_len];
            match self.resolve(reference) {
                Some(value) => out.push_str(value),
                None => out.push_str(reference),
            }
            rest = &tail[token_len..];
        }
        out.push_str(rest);
        out
    }
}
