//! Conversion prompt construction.
//!
//! A template is plain text with `{{PLACEHOLDER}}` markers. The user's
//! code is substituted last, so markers inside the code stay literal.

use crate::error::{AppError, AppResult};
use promptmaster_preview::{check_structure, Dialect};
use serde::{Deserialize, Serialize};

pub const CODE: &str = "{{CODE}}";
pub const LANGUAGE: &str = "{{LANGUAGE}}";
pub const RTL_INSTRUCTION: &str = "{{RTL_INSTRUCTION}}";
pub const GRID_INSTRUCTION: &str = "{{GRID_INSTRUCTION}}";
pub const SVG_INSTRUCTION: &str = "{{SVG_INSTRUCTION}}";

/// Toggles that switch parts of the prompt on or off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    pub include_rtl: bool,
    pub use_grids: bool,
    pub optimize_svgs: bool,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            include_rtl: true,
            use_grids: true,
            optimize_svgs: true,
        }
    }
}

impl PromptConfig {
    fn rtl_instruction(&self) -> &'static str {
        if self.include_rtl {
            "- Detect Persian/Arabic content. If present, mirror flex alignments (e.g., 'flex-start' becomes 'flex-end') and switch horizontal padding/margin logic for RTL compatibility."
        } else {
            "- Standard LTR alignment."
        }
    }

    fn grid_instruction(&self) -> &'static str {
        if self.use_grids {
            "- **Internal Elements**: Use Flexbox containers primarily. Use \"Elementor Grid Container\" ONLY for complex bento-style layouts or asymmetrical grids."
        } else {
            "- **Internal Elements**: Use Flexbox containers only. Do not use Grid Containers."
        }
    }

    fn svg_instruction(&self) -> &'static str {
        if self.optimize_svgs {
            "   - Convert all UI icons to optimized, minified SVG code.\n   - Place SVGs inside \"HTML\" widgets or \"Icon\" widgets with custom SVG upload structure."
        } else {
            "   - Keep icons as they appear in the source; use the \"Icon\" widget with the closest library icon."
        }
    }
}

pub const DEFAULT_PROMPT_TEMPLATE: &str = r#"
Act as a Senior WordPress & Elementor Full-Stack Developer with 10+ years of experience in high-performance UI conversion. Your task is to convert the provided [HTML/React] code into a valid, production-ready Elementor JSON Template (Schema v3.0+).

### CORE ARCHITECTURAL RULES:
1. **Container Hierarchy (Flexbox First)**:
   - **Section (Outer)**: Set "content_width" to "full".
   - **Wrapper (Inner)**: Set "content_width" to "boxed" (1140px).
   {{GRID_INSTRUCTION}}
2. **Responsive Precision**:
   - You MUST explicitly define responsive values for **Desktop**, **tablet**, and **mobile** devices.
   - Adjust "flex_direction", "padding", "margin", "gap", and "font_size" for each breakpoint.
3. **RTL Optimization**:
   {{RTL_INSTRUCTION}}
4. **Performance**:
   - Avoid deep nesting.
   - Use Elementor's native widget settings for 95% of styling.
   - Use "custom_css" only for complex CSS pseudo-elements (::before, ::after) or hover transitions that the UI cannot handle natively.

### WIDGET MAPPING STRATEGY:
1. **Headings & Text**: Map to "Heading" and "Text Editor" widgets. Ensure HTML tags (h1-h6, p) are preserved.
2. **Media**:
   - Images -> "Image" widget.
   - Backgrounds -> Container "background_overlay" or "background".
3. **Icons & SVGs**:
{{SVG_INSTRUCTION}}
   - **CRITICAL**: Escape all double quotes (") with backslashes (\") within SVG strings to prevent JSON parsing errors.
4. **Interactive Elements**: Map buttons to the "Button" widget. Map lists to "Icon List" where applicable.

### OUTPUT REQUIREMENTS (STRICT):
1. **Pure JSON**: Return ONLY the JSON code block. No explanations, no "Here is your JSON".
2. **Prettified**: The JSON must be well-indented and human-readable.
3. **Completeness**: Every single div, span, and style from the source must be accounted for in the Elementor structure.
4. **JSON FORMAT**: always include "version": "0.4", "title": "{generate_title}", "type": "container" at the top of the JSON.

---
### INPUT CODE TO CONVERT:
```{{LANGUAGE}}
{{CODE}}
```
---

Generate the complete Elementor JSON now.
"#;

/// Fill `template` for `code`.
///
/// Blank code is rejected, and so is HTML that fails the structural
/// check; neither would produce a useful conversion.
pub fn build_prompt(
    template: &str,
    code: &str,
    dialect: Dialect,
    config: &PromptConfig,
) -> AppResult<String> {
    if code.trim().is_empty() {
        return Err(AppError::EmptySource);
    }
    if dialect.needs_structure_check() {
        check_structure(code)?;
    }

    let prompt = template
        .replace(LANGUAGE, dialect.fence_language())
        .replace(RTL_INSTRUCTION, config.rtl_instruction())
        .replace(GRID_INSTRUCTION, config.grid_instruction())
        .replace(SVG_INSTRUCTION, config.svg_instruction())
        .replace(CODE, code);
    Ok(prompt.trim().to_string())
}
