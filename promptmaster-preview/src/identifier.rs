//! Component name guessing for the `component` dialect.
//!
//! This is a heuristic, not a parser. Known failure modes:
//! - several declarations: the first match wins, so a helper declared
//!   above the component is mounted instead of it;
//! - anonymous default exports (`export default () => ...`) fall back to
//!   [`FALLBACK_COMPONENT`];
//! - components bound through destructuring, `let` or `var` are not seen.

use regex::Regex;
use std::sync::OnceLock;

/// Identifier mounted when no declaration is recognised.
pub const FALLBACK_COMPONENT: &str = "App";

/// Which matcher produced the guessed name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameOrigin {
    FunctionDeclaration,
    ConstDeclaration,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentName {
    pub name: String,
    pub origin: NameOrigin,
}

type Matcher = fn(&str) -> Option<String>;

const MATCHERS: &[(NameOrigin, Matcher)] = &[
    (NameOrigin::FunctionDeclaration, function_declaration),
    (NameOrigin::ConstDeclaration, const_declaration),
];

fn function_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bfunction\s+([A-Za-z_$][A-Za-z0-9_$]*)").expect("valid regex"))
}

fn const_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\bconst\s+([A-Za-z_$][A-Za-z0-9_$]*)\s*(?::[^=]+)?=").expect("valid regex")
    })
}

fn function_declaration(source: &str) -> Option<String> {
    function_regex()
        .captures(source)
        .map(|caps| caps[1].to_string())
}

fn const_declaration(source: &str) -> Option<String> {
    const_regex().captures(source).map(|caps| caps[1].to_string())
}

/// Guess the identifier of the component declared in `source`.
pub fn guess_component_name(source: &str) -> ComponentName {
    MATCHERS
        .iter()
        .find_map(|(origin, matcher)| {
            matcher(source).map(|name| ComponentName {
                name,
                origin: *origin,
            })
        })
        .unwrap_or_else(|| ComponentName {
            name: FALLBACK_COMPONENT.to_string(),
            origin: NameOrigin::Fallback,
        })
}

/// True when `source` contains a recognisable component declaration.
pub fn declares_component(source: &str) -> bool {
    guess_component_name(source).origin != NameOrigin::Fallback
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_declaration_wins() {
        let name = guess_component_name("function Foo(){ return <div>Hi</div>; }");
        assert_eq!(name.name, "Foo");
        assert_eq!(name.origin, NameOrigin::FunctionDeclaration);
    }

    #[test]
    fn const_declaration_is_second() {
        let name = guess_component_name("const Bar = () => <div>Hi</div>;");
        assert_eq!(name.name, "Bar");
        assert_eq!(name.origin, NameOrigin::ConstDeclaration);
    }

    #[test]
    fn function_beats_earlier_const() {
        let src = "const label = 'x';\nfunction Card() { return <p>{label}</p>; }";
        assert_eq!(guess_component_name(src).name, "Card");
    }

    #[test]
    fn typed_const_is_matched() {
        let src = "const Panel: React.FC = () => <section />;";
        assert_eq!(guess_component_name(src).name, "Panel");
    }

    #[test]
    fn destructuring_is_not_a_component() {
        let src = "const { useState } = React;\n<div />";
        let name = guess_component_name(src);
        assert_eq!(name.name, FALLBACK_COMPONENT);
        assert_eq!(name.origin, NameOrigin::Fallback);
    }

    #[test]
    fn export_default_function_is_found() {
        let src = "export default function Hero() { return <h1>Hi</h1>; }";
        assert_eq!(guess_component_name(src).name, "Hero");
    }

    #[test]
    fn fallback_when_nothing_matches() {
        assert_eq!(guess_component_name("<div>Hi</div>").name, "App");
        assert!(!declares_component("<div>Hi</div>"));
    }
}
