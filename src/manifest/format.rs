//! Format detection for manifest rewrites.
//!
//! Rewritten manifests must diff cleanly against the originals, so the
//! serializer reuses whatever indentation and line endings the file already
//! has instead of imposing a house style.

use serde::Serialize;
use serde_json::Value;
use serde_json::ser::{PrettyFormatter, Serializer};

/// Indent used when the original text has no indented lines at all.
const DEFAULT_INDENT: &str = "  ";

/// Detect the indent unit of `text`: the leading whitespace of the first
/// line that is indented and non-blank.
pub fn detect_indent(text: &str) -> &str {
    for line in text.lines() {
        let content = line.trim_start_matches([' ', '\t']);
        if content.is_empty() || content.len() == line.len() {
            continue;
        }
        return &line[..line.len() - content.len()];
    }
    DEFAULT_INDENT
}

/// Detect the dominant line ending of `text`.
pub fn detect_newline(text: &str) -> &'static str {
    if text.contains("\r\n") { "\r\n" } else { "\n" }
}

/// Serialize `manifest` using the indent and newline style of `original`,
/// with a single trailing newline.
pub fn render_manifest(manifest: &Value, original: &str) -> serde_json::Result<String> {
    let indent = detect_indent(original);
    let newline = detect_newline(original);

    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(indent.as_bytes());
    let mut serializer = Serializer::with_formatter(&mut buffer, formatter);
    manifest.serialize(&mut serializer)?;

    let mut text = String::from_utf8(buffer)
        .map_err(|err| serde::ser::Error::custom(format!("non-UTF8 JSON output: {err}")))?;
    if newline == "\r\n" {
        text = text.replace('\n', "\r\n");
    }
    text.push_str(newline);
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detect_indent_two_spaces() {
        assert_eq!(detect_indent("{\n  \"a\": 1\n}"), "  ");
    }

    #[test]
    fn test_detect_indent_four_spaces() {
        assert_eq!(detect_indent("{\n    \"a\": 1\n}"), "    ");
    }

    #[test]
    fn test_detect_indent_tabs() {
        assert_eq!(detect_indent("{\n\t\"a\": 1\n}"), "\t");
    }

    #[test]
    fn test_detect_indent_skips_blank_lines() {
        assert_eq!(detect_indent("{\n   \n    \"a\": 1\n}"), "    ");
    }

    #[test]
    fn test_detect_indent_defaults_for_minified_input() {
        assert_eq!(detect_indent("{\"a\":1}"), "  ");
    }

    #[test]
    fn test_detect_newline() {
        assert_eq!(detect_newline("{\n}\n"), "\n");
        assert_eq!(detect_newline("{\r\n}\r\n"), "\r\n");
        assert_eq!(detect_newline("{}"), "\n");
    }

    #[test]
    fn test_render_keeps_indent_and_appends_newline() {
        let original = "{\n\t\"name\": \"a\"\n}\n";
        let rendered = render_manifest(&json!({"name": "a"}), original).unwrap();
        assert_eq!(rendered, "{\n\t\"name\": \"a\"\n}\n");
    }

    #[test]
    fn test_render_converts_to_crlf() {
        let original = "{\r\n  \"name\": \"a\"\r\n}\r\n";
        let rendered = render_manifest(&json!({"name": "a", "version": "1.0.0"}), original).unwrap();
        assert_eq!(rendered, "{\r\n  \"name\": \"a\",\r\n  \"version\": \"1.0.0\"\r\n}\r\n");
    }

    #[test]
    fn test_render_minified_input_gets_default_indent() {
        let rendered = render_manifest(&json!({"name": "a"}), "{\"name\":\"a\"}").unwrap();
        assert_eq!(rendered, "{\n  \"name\": \"a\"\n}\n");
    }
}
