//! Wraps a bootstrap script into one complete, self-contained document.

use crate::bootstrap::MOUNT_ID;
use crate::theme::Theme;
use std::fmt;
use std::sync::Arc;

/// Styling utility engine.
pub const TAILWIND_SRC: &str = "https://cdn.tailwindcss.com";
/// UI runtime.
pub const REACT_SRC: &str = "https://unpkg.com/react@18/umd/react.production.min.js";
pub const REACT_DOM_SRC: &str = "https://unpkg.com/react-dom@18/umd/react-dom.production.min.js";
/// JSX transform.
pub const BABEL_SRC: &str = "https://unpkg.com/@babel/standalone@7/babel.min.js";

/// Base document styles; only the `$theme.*` tokens vary between modes.
const STYLE_TEMPLATE: &str = "body{background:$theme.background;color:$theme.foreground;padding:1.5rem;\
font-family:ui-sans-serif,system-ui,-apple-system,sans-serif;min-height:100vh;margin:0;overflow-x:hidden;}\
*{max-width:100%;box-sizing:border-box;}\
.preview-error{margin:0;padding:1rem;border:1px solid #ef4444;border-radius:0.5rem;background:#fef2f2;color:#b91c1c;\
font-family:ui-monospace,monospace;font-size:0.8rem;white-space:pre-wrap;}\
.preview-missing{padding:1rem;border:1px dashed #f59e0b;border-radius:0.5rem;color:#b45309;font-size:0.85rem;}";

/// A complete renderable document. Cheap to clone.
#[derive(Clone, PartialEq, Eq)]
pub struct AssembledDocument(Arc<str>);

impl AssembledDocument {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Contents of the `<style>` block.
    pub fn style_block(&self) -> Option<&str> {
        let start = self.0.find("<style>")? + "<style>".len();
        let end = self.0[start..].find("</style>")? + start;
        Some(&self.0[start..end])
    }
}

impl fmt::Debug for AssembledDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssembledDocument")
            .field("bytes", &self.0.len())
            .finish()
    }
}

impl fmt::Display for AssembledDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AssembledDocument {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Assemble a document for `bootstrap_script`. Pure: identical inputs
/// give byte-identical output.
pub fn assemble(bootstrap_script: &str, is_dark: bool) -> AssembledDocument {
    assemble_with_theme(bootstrap_script, &Theme::for_mode(is_dark))
}

pub fn assemble_with_theme(bootstrap_script: &str, theme: &Theme) -> AssembledDocument {
    let style = theme.apply(STYLE_TEMPLATE);
    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<script src="{tailwind}"></script>
<script crossorigin src="{react}"></script>
<script crossorigin src="{react_dom}"></script>
<script src="{babel}"></script>
<style>{style}</style>
</head>
<body>
<div id="{mount}"></div>
<script>
{script}</script>
</body>
</html>
"#,
        tailwind = TAILWIND_SRC,
        react = REACT_SRC,
        react_dom = REACT_DOM_SRC,
        babel = BABEL_SRC,
        style = style,
        mount = MOUNT_ID,
        script = bootstrap_script,
    );
    AssembledDocument(Arc::from(html))
}
