//! Generates the inline script that mounts user content inside the
//! isolated document.
//!
//! Every dialect shares one frame: the body runs inside `try/catch`, and
//! window-level `error` / `unhandledrejection` listeners redirect late
//! failures into the mount point. User text is always embedded as a
//! JavaScript string literal (see [`js_string_literal`]), never spliced
//! in as source, so a malformed snippet cannot break out of the
//! surrounding `<script>` element. JSX is compiled at run time by the
//! in-document transform, which means syntax errors are caught by the
//! same frame.

use crate::dialect::Dialect;
use crate::identifier::guess_component_name;
use regex::Regex;
use std::sync::OnceLock;

/// Id of the element user content is mounted into.
pub const MOUNT_ID: &str = "root";

/// Hooks and helpers made available to component snippets without imports.
const COMPONENT_GLOBALS: &[&str] = &[
    "useState",
    "useEffect",
    "useRef",
    "useMemo",
    "useCallback",
    "useReducer",
    "useContext",
    "Fragment",
];

const FRAME_HEAD: &str = r#"(function () {
  var root = document.getElementById("root");
  function showError(err) {
    var box = document.createElement("pre");
    box.className = "preview-error";
    box.textContent = err && err.message ? err.message : String(err);
    root.replaceChildren(box);
  }
  window.addEventListener("error", function (event) {
    event.preventDefault();
    showError(event.error || event.message);
  });
  window.addEventListener("unhandledrejection", function (event) {
    event.preventDefault();
    showError(event.reason);
  });
  try {
"#;

const FRAME_TAIL: &str = r#"  } catch (err) {
    showError(err);
  }
})();
"#;

/// Error boundary used by the React based dialects: render-time throws
/// become an inline error block instead of an unmounted tree.
const BOUNDARY: &str = r#"    class PreviewBoundary extends React.Component {
      constructor(props) {
        super(props);
        this.state = { error: null };
      }
      static getDerivedStateFromError(error) {
        return { error: error };
      }
      render() {
        if (this.state.error) {
          var err = this.state.error;
          return React.createElement("pre", { className: "preview-error" }, err && err.message ? err.message : String(err));
        }
        return this.props.children;
      }
    }
    function mount(type) {
      ReactDOM.createRoot(root).render(
        React.createElement(PreviewBoundary, null, React.createElement(type))
      );
    }
"#;

/// Build the bootstrap script for `text` in the given dialect.
///
/// Blank text is filtered out upstream and never reaches this function.
pub fn build_bootstrap(text: &str, dialect: Dialect) -> String {
    let body = match dialect {
        Dialect::Html => html_body(text),
        Dialect::Jsx => jsx_body(text),
        Dialect::Component => component_body(text),
    };

    let mut script = String::with_capacity(FRAME_HEAD.len() + body.len() + FRAME_TAIL.len());
    script.push_str(FRAME_HEAD);
    script.push_str(&body);
    script.push_str(FRAME_TAIL);
    script
}

fn html_body(text: &str) -> String {
    format!("    root.innerHTML = {};\n", js_string_literal(text))
}

fn jsx_body(text: &str) -> String {
    let mut body = String::from(BOUNDARY);
    body.push_str(&format!("    var source = {};\n", js_string_literal(text)));
    body.push_str(
        r#"    var program = Babel.transform(
      "var __PreviewFragment = function () { return (<>\n" + source + "\n</>); };",
      { presets: ["react"] }
    ).code;
    var Fragment = new Function("React", program + "\nreturn __PreviewFragment;")(React);
    mount(Fragment);
"#,
    );
    body
}

fn component_body(text: &str) -> String {
    let source = strip_module_syntax(text);
    let component = guess_component_name(&source);
    let name = component.name;

    let params = COMPONENT_GLOBALS
        .iter()
        .map(|g| format!("\"{}\"", g))
        .collect::<Vec<_>>()
        .join(", ");
    let args = COMPONENT_GLOBALS
        .iter()
        .map(|g| format!("React.{}", g))
        .collect::<Vec<_>>()
        .join(", ");

    let mut body = String::from(BOUNDARY);
    body.push_str(&format!("    var source = {};\n", js_string_literal(&source)));
    body.push_str(&format!(
        "    var missing = {};\n",
        js_string_literal(&missing_component_message(&name))
    ));
    body.push_str("    var program = Babel.transform(source, { presets: [\"react\"] }).code;\n");
    body.push_str(&format!(
        "    var resolve = new Function(\"React\", \"ReactDOM\", {params}, \
\"return (function () {{\\n\" + program + \"\\nreturn typeof {name} !== 'undefined' ? {name} : undefined;\\n}})();\");\n"
    ));
    body.push_str(&format!("    var Component = resolve(React, ReactDOM, {args});\n"));
    body.push_str(
        r#"    var renderable = typeof Component === "function" ||
      (Component !== null && typeof Component === "object" && Component.$$typeof !== undefined);
    if (!renderable) {
      var notice = document.createElement("div");
      notice.className = "preview-missing";
      notice.textContent = missing;
      root.replaceChildren(notice);
      return;
    }
    mount(Component);
"#,
    );
    body
}

/// Inline message shown when the guessed identifier does not resolve.
pub fn missing_component_message(name: &str) -> String {
    format!(
        "Component \"{name}\" was not found. Declare it as function {name}() or const {name} = ..."
    )
}

/// Remove ES module syntax the in-document runtime cannot execute:
/// `import` statements are dropped, `export` / `export default` prefixes
/// are stripped and bare `export default Name;` lines are removed.
pub fn strip_module_syntax(source: &str) -> String {
    static IMPORTS: OnceLock<Regex> = OnceLock::new();
    static EXPORT_NAME: OnceLock<Regex> = OnceLock::new();
    static EXPORT_DECL: OnceLock<Regex> = OnceLock::new();

    let imports = IMPORTS.get_or_init(|| {
        Regex::new(r#"(?m)^[ \t]*import\b[^;'"]*?['"][^'"\n]*['"][ \t]*;?[ \t]*$\n?"#)
            .expect("valid regex")
    });
    let export_name = EXPORT_NAME.get_or_init(|| {
        Regex::new(r"(?m)^[ \t]*export\s+default\s+[A-Za-z_$][A-Za-z0-9_$]*[ \t]*;?[ \t]*$\n?")
            .expect("valid regex")
    });
    let export_decl = EXPORT_DECL.get_or_init(|| {
        Regex::new(r"\bexport\s+(?:default\s+)?(function|class|const|let|var|async)\b")
            .expect("valid regex")
    });

    let without_imports = imports.replace_all(source, "");
    let without_names = export_name.replace_all(&without_imports, "");
    export_decl.replace_all(&without_names, "$1").into_owned()
}

/// Encode `text` as a double-quoted JavaScript string literal that is
/// safe to place inside an HTML `<script>` element.
///
/// `<` and `>` are written as `\u003c` / `\u003e`, which neutralises
/// `</script>`, `<!--` and similar sequences; line and paragraph
/// separators are escaped so the literal stays on one line.
pub fn js_string_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn literal_escapes_script_terminators() {
        let lit = js_string_literal("<script>alert(1)</script><!-- x -->");
        assert!(!lit.contains("</script"));
        assert!(!lit.contains("<!--"));
        assert!(!lit.contains('<'));
        assert_eq!(
            lit,
            "\"\\u003cscript\\u003ealert(1)\\u003c/script\\u003e\\u003c!-- x --\\u003e\""
        );
    }

    #[test]
    fn literal_escapes_quotes_backticks_stay() {
        assert_eq!(js_string_literal("a\"b`${c}`\n"), "\"a\\\"b`${c}`\\n\"");
    }

    #[test]
    fn literal_escapes_separators_and_controls() {
        assert_eq!(js_string_literal("\u{2028}\u{0007}"), "\"\\u2028\\u0007\"");
    }

    #[test]
    fn html_dialect_assigns_inner_html() {
        let script = build_bootstrap("<div>A</div>", Dialect::Html);
        let assignment = format!("root.innerHTML = {};", js_string_literal("<div>A</div>"));
        assert!(script.contains(&assignment));
        assert!(script.contains("catch (err)"));
        assert!(!script.contains("Babel.transform"));
    }

    #[test]
    fn html_dialect_cannot_close_the_script() {
        let script = build_bootstrap("</script><script>alert(1)</script>", Dialect::Html);
        assert!(!script.contains("</script>"));
    }

    #[test]
    fn jsx_dialect_wraps_in_fragment_and_mounts() {
        let script = build_bootstrap("<h1>Hi</h1>", Dialect::Jsx);
        assert!(script.contains("(<>\\n\" + source + \"\\n</>)"));
        assert!(script.contains("ReactDOM.createRoot(root)"));
        assert!(script.contains("PreviewBoundary"));
        assert!(script.contains("catch (err)"));
    }

    #[test]
    fn component_dialect_resolves_function_name() {
        let script = build_bootstrap("function Foo(){ return <div>Hi</div>; }", Dialect::Component);
        assert!(script.contains("typeof Foo !== 'undefined' ? Foo : undefined"));
        assert!(script.contains(&js_string_literal(&missing_component_message("Foo"))));
    }

    #[test]
    fn component_dialect_resolves_const_name() {
        let script = build_bootstrap("const Bar = () => <div>Hi</div>;", Dialect::Component);
        assert!(script.contains("typeof Bar !== 'undefined' ? Bar : undefined"));
    }

    #[test]
    fn component_dialect_falls_back_to_app() {
        let script = build_bootstrap("<div>Hi</div>", Dialect::Component);
        assert!(script.contains("typeof App !== 'undefined' ? App : undefined"));
        assert!(script.contains(&js_string_literal(
            "Component \"App\" was not found. Declare it as function App() or const App = ..."
        )));
    }

    #[test]
    fn component_dialect_exposes_hooks() {
        let script = build_bootstrap("const A = () => null;", Dialect::Component);
        assert!(script.contains("\"useState\", \"useEffect\""));
        assert!(script.contains("React.useState, React.useEffect"));
    }

    #[test]
    fn strips_imports_and_exports() {
        let src = "import React, { useState } from 'react';\n\
import {\n  a,\n  b,\n} from \"./x\";\n\
import './styles.css';\n\
export default function Card() {\n  return <div />;\n}\n\
export const Other = 1;\n\
export default Card;\n";
        let stripped = strip_module_syntax(src);
        assert_eq!(
            stripped,
            "function Card() {\n  return <div />;\n}\nconst Other = 1;\n"
        );
    }

    #[test]
    fn strip_keeps_plain_source() {
        let src = "const Bar = () => <div>important: yes</div>;";
        assert_eq!(strip_module_syntax(src), src);
    }

    #[test]
    fn every_dialect_is_wrapped_in_the_frame() {
        for dialect in Dialect::ALL {
            let script = build_bootstrap("<p>x</p>", dialect);
            assert!(script.starts_with("(function () {"));
            assert!(script.ends_with("})();\n"));
            assert!(script.contains("unhandledrejection"));
        }
    }
}
