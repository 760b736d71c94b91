//! Structural well-formedness check for the `html` dialect.
//!
//! A single pass over the markup keeps a stack of open elements. It is
//! stricter than a browser (which repairs anything) but tolerant of the
//! things HTML allows: void elements, `/>` self-closing tags, optional end
//! tags and raw-text elements.

use crate::error::{PreviewError, PreviewResult};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

/// Elements whose end tag may be omitted; they are closed implicitly by an
/// ancestor's end tag or by the end of the input.
const OPTIONAL_END_ELEMENTS: &[&str] = &[
    "p", "li", "dt", "dd", "option", "optgroup", "tr", "td", "th", "thead", "tbody", "tfoot",
    "colgroup", "rt", "rp", "html", "head", "body",
];

struct OpenElement {
    name: String,
    offset: usize,
}

impl OpenElement {
    fn end_is_optional(&self) -> bool {
        OPTIONAL_END_ELEMENTS.contains(&self.name.as_str())
    }
}

/// Check that `html` is structurally balanced.
///
/// Returns the first problem found as [`PreviewError::Structure`] with a
/// 1-based line and column.
pub fn check_structure(html: &str) -> PreviewResult<()> {
    let bytes = html.as_bytes();
    let len = bytes.len();
    let mut stack: Vec<OpenElement> = Vec::new();
    let mut i = 0;

    while i < len {
        if bytes[i] != b'<' {
            i += 1;
            continue;
        }

        let start = i;
        let rest = &html[i..];

        if rest.starts_with("<!--") {
            match rest[4..].find("-->") {
                Some(end) => {
                    i += 4 + end + 3;
                    continue;
                }
                None => {
                    return Err(error_at(html, start, "comment is never closed (missing '-->')"))
                }
            }
        }

        match bytes.get(i + 1).copied() {
            Some(b'!') | Some(b'?') => match rest.find('>') {
                Some(end) => i += end + 1,
                None => {
                    return Err(error_at(html, start, "declaration is never closed (missing '>')"))
                }
            },
            Some(b'/') if bytes.get(i + 2).is_some_and(|b| b.is_ascii_alphabetic()) => {
                let name_start = i + 2;
                let name_end = scan_name(bytes, name_start);
                let name = html[name_start..name_end].to_ascii_lowercase();
                let tag = find_tag_end(bytes, name_end).ok_or_else(|| {
                    error_at(
                        html,
                        start,
                        format!("closing tag </{}> is never finished (missing '>')", name),
                    )
                })?;
                close_element(html, &mut stack, &name, start)?;
                i = tag.end + 1;
            }
            Some(c) if c.is_ascii_alphabetic() => {
                let name_start = i + 1;
                let name_end = scan_name(bytes, name_start);
                let name = html[name_start..name_end].to_ascii_lowercase();
                let tag = find_tag_end(bytes, name_end).ok_or_else(|| {
                    error_at(html, start, format!("tag <{}> is never finished (missing '>')", name))
                })?;
                i = tag.end + 1;

                if tag.self_closing || VOID_ELEMENTS.contains(&name.as_str()) {
                    continue;
                }

                if RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
                    match find_raw_text_end(html, i, &name) {
                        Some(after) => {
                            i = after;
                            continue;
                        }
                        None => {
                            return Err(error_at(
                                html,
                                start,
                                format!("<{}> is never closed", name),
                            ))
                        }
                    }
                }

                stack.push(OpenElement { name, offset: start });
            }
            // A lone '<' (e.g. "a < b") is text.
            _ => i += 1,
        }
    }

    if let Some(open) = stack.iter().rev().find(|e| !e.end_is_optional()) {
        return Err(error_at(
            html,
            open.offset,
            format!("<{}> is never closed", open.name),
        ));
    }

    Ok(())
}

fn close_element(
    html: &str,
    stack: &mut Vec<OpenElement>,
    name: &str,
    offset: usize,
) -> PreviewResult<()> {
    let Some(pos) = stack.iter().rposition(|e| e.name == name) else {
        // `</br>` and friends are tolerated by every browser.
        if VOID_ELEMENTS.contains(&name) {
            return Ok(());
        }
        return Err(error_at(
            html,
            offset,
            format!("closing tag </{}> has no matching opening tag", name),
        ));
    };

    if let Some(blocking) = stack[pos + 1..].iter().rev().find(|e| !e.end_is_optional()) {
        let (line, column) = position(html, blocking.offset);
        return Err(error_at(
            html,
            offset,
            format!(
                "</{}> found while <{}> (opened at line {}, column {}) is still open",
                name, blocking.name, line, column
            ),
        ));
    }

    stack.truncate(pos);
    Ok(())
}

/// Returns the index just past a tag name starting at `from`.
fn scan_name(bytes: &[u8], from: usize) -> usize {
    let mut j = from;
    while j < bytes.len()
        && (bytes[j].is_ascii_alphanumeric() || matches!(bytes[j], b'-' | b':' | b'_' | b'.'))
    {
        j += 1;
    }
    j
}

struct TagEnd {
    end: usize,
    self_closing: bool,
}

/// Finds the `>` that ends a tag, skipping attribute values.
///
/// The tag is self-closing only when a `/` outside any attribute value
/// sits right before the `>`; in `<a href=/x/>` the slash belongs to the
/// unquoted value.
fn find_tag_end(bytes: &[u8], from: usize) -> Option<TagEnd> {
    let mut j = from;
    let mut after_equals = false;
    let mut in_unquoted = false;
    let mut slash_before = false;
    while j < bytes.len() {
        let b = bytes[j];
        if b == b'>' {
            return Some(TagEnd {
                end: j,
                self_closing: slash_before && !in_unquoted,
            });
        }
        if in_unquoted {
            in_unquoted = !b.is_ascii_whitespace();
        } else if b.is_ascii_whitespace() {
            slash_before = false;
        } else if after_equals {
            after_equals = false;
            slash_before = false;
            if b == b'"' || b == b'\'' {
                j += 1;
                while j < bytes.len() && bytes[j] != b {
                    j += 1;
                }
                if j >= bytes.len() {
                    return None;
                }
            } else {
                in_unquoted = true;
            }
        } else if b == b'=' {
            after_equals = true;
            slash_before = false;
        } else {
            slash_before = b == b'/';
        }
        j += 1;
    }
    None
}

/// Returns the index just past `</name ...>` for a raw-text element.
fn find_raw_text_end(html: &str, from: usize, name: &str) -> Option<usize> {
    let lower = html[from..].to_ascii_lowercase();
    let needle = format!("</{}", name);
    let mut search = 0;
    while let Some(found) = lower[search..].find(&needle) {
        let at = search + found;
        let after_name = at + needle.len();
        match lower.as_bytes().get(after_name) {
            Some(b) if b.is_ascii_whitespace() || *b == b'>' || *b == b'/' => {
                let close = lower[after_name..].find('>')?;
                return Some(from + after_name + close + 1);
            }
            None => return None,
            _ => search = after_name,
        }
    }
    None
}

fn error_at(html: &str, offset: usize, message: impl Into<String>) -> PreviewError {
    let (line, column) = position(html, offset);
    PreviewError::structure(line, column, message)
}

/// 1-based line and character column of a byte offset.
fn position(text: &str, offset: usize) -> (usize, usize) {
    let before = &text[..offset];
    let line = before.matches('\n').count() + 1;
    let column = before
        .rsplit('\n')
        .next()
        .map(|l| l.chars().count())
        .unwrap_or(0)
        + 1;
    (line, column)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn structure_error(html: &str) -> (usize, usize, String) {
        match check_structure(html) {
            Err(PreviewError::Structure {
                line,
                column,
                message,
            }) => (line, column, message),
            other => panic!("expected structure error for {:?}, got {:?}", html, other),
        }
    }

    #[test]
    fn balanced_markup_passes() {
        assert!(check_structure("<div>A</div>").is_ok());
        assert!(check_structure("<div class=\"p-8\"><h2>Hi</h2><p>text</p></div>").is_ok());
    }

    #[test]
    fn crossed_tags_fail() {
        let (line, column, message) = structure_error("<div><span></div>");
        assert_eq!((line, column), (1, 12));
        assert!(message.contains("<span>"), "{}", message);
        assert!(message.contains("line 1, column 6"), "{}", message);
    }

    #[test]
    fn unclosed_element_fails_at_its_opening() {
        let (line, column, message) = structure_error("<section>\n  <div>\n</section>");
        assert_eq!((line, column), (3, 1));
        assert!(message.contains("<div>"));

        let (line, column, _) = structure_error("<main>\n  <div>x</div>");
        assert_eq!((line, column), (1, 1));
    }

    #[test]
    fn stray_closing_tag_fails() {
        let (_, _, message) = structure_error("<div></div></span>");
        assert!(message.contains("</span> has no matching opening tag"));
    }

    #[test]
    fn void_and_self_closing_elements() {
        assert!(check_structure("<div><img src=\"a.png\"><br><input type=text></div>").is_ok());
        assert!(check_structure("<div><Icon /><svg><path d=\"M0 0\"/></svg></div>").is_ok());
        assert!(check_structure("<p>line<br/>break</br></p>").is_ok());
    }

    #[test]
    fn optional_end_tags_close_implicitly() {
        assert!(check_structure("<ul><li>one<li>two</ul>").is_ok());
        assert!(check_structure("<table><tr><td>a<td>b</table>").is_ok());
        assert!(check_structure("<p>trailing paragraph").is_ok());
    }

    #[test]
    fn quoted_attributes_may_contain_angle_brackets() {
        assert!(check_structure("<div title=\"a > b\" data-x='<y>'>ok</div>").is_ok());
    }

    #[test]
    fn raw_text_elements_are_skipped() {
        assert!(check_structure("<script>if (a < b && c > d) { x('</div>'); }</script>").is_ok());
        assert!(check_structure("<style>a > b { color: red }</STYLE>").is_ok());
        let (_, _, message) = structure_error("<script>let x = 1;");
        assert!(message.contains("<script> is never closed"));
    }

    #[test]
    fn comments_and_doctype_are_skipped() {
        assert!(check_structure("<!DOCTYPE html><!-- <div> --><p>x</p>").is_ok());
        let (_, _, message) = structure_error("<div><!-- open</div>");
        assert!(message.contains("comment"));
    }

    #[test]
    fn lone_angle_bracket_is_text() {
        assert!(check_structure("<p>1 < 2 and 3 > 2</p>").is_ok());
    }

    #[test]
    fn unfinished_tag_fails() {
        let (_, _, message) = structure_error("<div class=\"x\"");
        assert!(message.contains("never finished"));
    }

    #[test]
    fn columns_count_characters_not_bytes() {
        let (line, column, _) = structure_error("<p>—</span>");
        assert_eq!((line, column), (1, 5));
    }

    #[test]
    fn slash_ending_unquoted_value_is_not_self_closing() {
        assert!(check_structure("<a href=/docs/>Docs</a>").is_ok());
        assert!(check_structure("<a href=/x/>y</a>").is_ok());
        assert!(check_structure("<p><img src=/a.png/></p>").is_ok());
        let (_, _, message) = structure_error("<div class=a/>x");
        assert_eq!(message, "<div> is never closed");
    }

    #[test]
    fn slash_before_close_still_self_closes() {
        assert!(check_structure("<div/><span class=\"x\" /><my-widget id=w />").is_ok());
        assert!(check_structure("<a href=\"/docs/\"/>").is_ok());
    }
}
