//! Parse and serialize primitives for watched documents.
//!
//! `serde_json` does the actual parsing; this module classifies its failures
//! into positional syntax errors, end-of-input errors and errors that are not
//! about a bad character, and provides the single-character corrective edit
//! used by the repair engine.

use crate::Result;
use serde::Deserialize;
use serde_json::error::Category;
use serde_json::Value;
use thiserror::Error;

/// Serialization artifact stripped from every normalized document.
pub const UNDEFINED_ARTIFACT: &str = "undefined,";

/// Deepest array/object nesting accepted as a document.
pub const MAX_NESTING: usize = 1024;

/// Parser messages for failures that point at well-formed input.
///
/// Deleting the addressed character would destroy data, so these are never
/// corrected in place.
const NOT_A_BAD_CHARACTER: &[&str] = &[
    "number out of range",
    "recursion limit exceeded",
    "lone leading surrogate in hex escape",
    "unexpected end of hex escape",
    "invalid unicode code point",
];

/// What kind of parse failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A malformed character at a known position.
    Syntax,
    /// The input ended before the document was complete.
    Eof,
    /// A position is known but the character there is not at fault
    /// (unrepresentable escapes, numbers, nesting past [`MAX_NESTING`]).
    Unrepresentable,
}

/// A parse failure with the position reported by the parser.
///
/// `line` is 1-based. `column` is the 1-based byte column within that line;
/// a column of 0 means the parser stopped before the first character of the line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub message: String,
    pub kind: ParseErrorKind,
}

impl ParseError {
    fn from_json(err: &serde_json::Error) -> Self {
        let message = err.to_string();
        Self {
            line: err.line(),
            column: err.column(),
            kind: classify(err.classify(), &message),
            message,
        }
    }
}

fn classify(category: Category, message: &str) -> ParseErrorKind {
    match category {
        Category::Eof => ParseErrorKind::Eof,
        Category::Syntax if !NOT_A_BAD_CHARACTER.iter().any(|m| message.starts_with(m)) => {
            ParseErrorKind::Syntax
        }
        _ => ParseErrorKind::Unrepresentable,
    }
}

/// Position of the first bracket that opens a level deeper than [`MAX_NESTING`].
///
/// Brackets inside string literals are skipped.
fn excessive_nesting(text: &str) -> Option<(usize, usize)> {
    let mut depth = 0usize;
    let mut line = 1usize;
    let mut line_start = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, b) in text.bytes().enumerate() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
        } else {
            match b {
                b'"' => in_string = true,
                b'[' | b'{' => {
                    depth += 1;
                    if depth > MAX_NESTING {
                        return Some((line, i - line_start + 1));
                    }
                }
                b']' | b'}' => depth = depth.saturating_sub(1),
                _ => {}
            }
        }
        if b == b'\n' {
            line += 1;
            line_start = i + 1;
        }
    }
    None
}

fn from_str_unbounded(text: &str) -> serde_json::Result<Value> {
    let mut de = serde_json::Deserializer::from_str(text);
    de.disable_recursion_limit();
    let value = Value::deserialize(serde_stacker::Deserializer::new(&mut de))?;
    de.end()?;
    Ok(value)
}

/// Parse text into a JSON document.
///
/// Numbers keep their source text, so integers wider than 64 bits and
/// exponents outside the `f64` range survive a round trip unchanged.
pub fn parse(text: &str) -> std::result::Result<Value, ParseError> {
    if let Some((line, column)) = excessive_nesting(text) {
        return Err(ParseError {
            line,
            column,
            message: format!(
                "nesting deeper than {} levels at line {} column {}",
                MAX_NESTING, line, column
            ),
            kind: ParseErrorKind::Unrepresentable,
        });
    }
    from_str_unbounded(text).map_err(|e| ParseError::from_json(&e))
}

/// Serialize a document to compact canonical text.
pub fn serialize(doc: &Value) -> Result<String> {
    Ok(serde_json::to_string(doc)?)
}

/// Serialize a document and strip the `undefined,` artifact.
pub fn normalize(doc: &Value) -> Result<String> {
    let text = serialize(doc)?;
    Ok(text.replace(UNDEFINED_ARTIFACT, ""))
}

/// Locate the character addressed by a 1-based line and 1-based byte column.
///
/// Returns the byte offset of that character within the whole text and the
/// character itself.
fn locate(text: &str, line: usize, column: usize) -> Option<(usize, char)> {
    if line == 0 || column == 0 {
        return None;
    }

    let target = text.split('\n').nth(line - 1)?;
    let line_start: usize = text.split('\n').take(line - 1).map(|l| l.len() + 1).sum();
    let byte = column - 1;

    target
        .char_indices()
        .find(|(i, c)| byte >= *i && byte < i + c.len_utf8())
        .map(|(i, c)| (line_start + i, c))
}

/// Delete the single character at `line`/`column`, keeping every line break.
///
/// Returns `None` when the position does not address a character in `text`.
pub fn remove_char_at(text: &str, line: usize, column: usize) -> Option<String> {
    let (at, ch) = locate(text, line, column)?;

    let mut out = String::with_capacity(text.len());
    out.push_str(&text[..at]);
    out.push_str(&text[at + ch.len_utf8()..]);
    Some(out)
}

/// Render the offending line prefixed with its number and a caret under `column`.
///
/// Tabs before the column are echoed in the marker row so the caret lines up
/// in a terminal.
pub fn caret_snippet(text: &str, line: usize, column: usize) -> Option<String> {
    if line == 0 {
        return None;
    }
    let content = text.split('\n').nth(line - 1)?;
    let content = content.strip_suffix('\r').unwrap_or(content);

    let gutter = format!("{} | ", line);
    let prefix_end = column.saturating_sub(1).min(content.len());
    let prefix: String = content
        .char_indices()
        .take_while(|(i, _)| *i < prefix_end)
        .map(|(_, c)| if c == '\t' { '\t' } else { ' ' })
        .collect();

    Some(format!(
        "{gutter}{content}\n{}{prefix}^",
        " ".repeat(gutter.len())
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let doc = parse(r#"{"a": 1, "b": [true, null]}"#).unwrap();
        assert_eq!(doc["a"], 1);
        assert_eq!(doc["b"][0], true);
    }

    #[test]
    fn test_parse_reports_position_of_bad_character() {
        let err = parse("{\"a\": 1x}").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::Syntax);
        assert_eq!(err.line, 1);
        assert_eq!(err.column, 8);
        assert_eq!(&"{\"a\": 1x}"[err.column - 1..err.column], "x");
    }

    #[test]
    fn test_parse_reports_position_on_later_line() {
        let text = "{\n  \"a\": 1,\n  \"b\": ?2\n}";
        let err = parse(text).unwrap_err();
        assert_eq!(err.line, 3);
        assert_eq!(err.column, 8);
        assert_eq!(err.kind, ParseErrorKind::Syntax);
    }

    #[test]
    fn test_parse_eof() {
        let err = parse(r#"{"a": 1"#).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::Eof);

        let err = parse("").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::Eof);
        assert_eq!(err.column, 0);
    }

    #[test]
    fn test_numbers_keep_their_source_text() {
        let doc = parse(r#"{"x": 1e400, "y": 2}"#).unwrap();
        assert_eq!(normalize(&doc).unwrap(), r#"{"x":1e400,"y":2}"#);

        let doc = parse(r#"{"id": 12345678901234567890123}"#).unwrap();
        assert_eq!(normalize(&doc).unwrap(), r#"{"id":12345678901234567890123}"#);
    }

    #[test]
    fn test_deep_nesting_within_limit_parses() {
        let text = format!("{}{}", "[".repeat(200), "]".repeat(200));
        let doc = parse(&text).unwrap();
        assert_eq!(normalize(&doc).unwrap(), text);
    }

    #[test]
    fn test_nesting_past_limit_is_not_a_bad_character() {
        let text = format!("{}{}", "[".repeat(MAX_NESTING + 1), "]".repeat(MAX_NESTING + 1));
        let err = parse(&text).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::Unrepresentable);
        assert_eq!((err.line, err.column), (1, MAX_NESTING + 1));

        // Brackets inside strings do not count.
        let text = format!(r#"["{}"]"#, "[".repeat(MAX_NESTING + 1));
        assert!(parse(&text).is_ok());
    }

    #[test]
    fn test_lone_surrogate_is_not_a_bad_character() {
        let err = parse(r#"{"s": "\ud800"}"#).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::Unrepresentable);

        let err = parse(r#"["\udc00"]"#).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::Unrepresentable);
    }

    #[test]
    fn test_classify_by_message() {
        assert_eq!(
            classify(Category::Syntax, "number out of range at line 1 column 11"),
            ParseErrorKind::Unrepresentable
        );
        assert_eq!(
            classify(Category::Syntax, "recursion limit exceeded at line 1 column 129"),
            ParseErrorKind::Unrepresentable
        );
        assert_eq!(
            classify(Category::Syntax, "expected value at line 1 column 2"),
            ParseErrorKind::Syntax
        );
        assert_eq!(
            classify(Category::Eof, "EOF while parsing a value at line 1 column 0"),
            ParseErrorKind::Eof
        );
    }

    #[test]
    fn test_normalize_is_compact_and_keeps_key_order() {
        let doc = parse("{\n  \"zeta\": 1,\n  \"alpha\": [1, 2]\n}").unwrap();
        assert_eq!(normalize(&doc).unwrap(), r#"{"zeta":1,"alpha":[1,2]}"#);
    }

    #[test]
    fn test_normalize_strips_undefined_artifact() {
        let doc = parse(r#"{"note": "undefined, maybe", "n": 1}"#).unwrap();
        assert_eq!(normalize(&doc).unwrap(), r#"{"note":" maybe","n":1}"#);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let doc = parse(r#"{"a": {"b": [1, 2.5, "x"]}, "c": null}"#).unwrap();
        let once = normalize(&doc).unwrap();
        let twice = normalize(&parse(&once).unwrap()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_remove_char_at_single_line() {
        assert_eq!(
            remove_char_at("{\"a\": 1x}", 1, 8).as_deref(),
            Some("{\"a\": 1}")
        );
    }

    #[test]
    fn test_remove_char_at_keeps_line_breaks() {
        let text = "{\n  \"a\": 1,\n  \"b\": ?2\n}";
        let fixed = remove_char_at(text, 3, 8).unwrap();
        assert_eq!(fixed, "{\n  \"a\": 1,\n  \"b\": 2\n}");
    }

    #[test]
    fn test_remove_char_at_multibyte() {
        // "é" occupies bytes 6..8 of the line; column 8 lands on its second byte.
        let text = "{\"a\": é1}";
        assert_eq!(remove_char_at(text, 1, 8).as_deref(), Some("{\"a\": 1}"));
    }

    #[test]
    fn test_remove_char_at_out_of_range() {
        assert_eq!(remove_char_at("{}", 1, 0), None);
        assert_eq!(remove_char_at("{}", 1, 3), None);
        assert_eq!(remove_char_at("{}", 2, 1), None);
        assert_eq!(remove_char_at("{}", 0, 1), None);
    }

    #[test]
    fn test_caret_snippet_alignment() {
        let snippet = caret_snippet("{\"a\": 1x}", 1, 8).unwrap();
        let rows: Vec<&str> = snippet.lines().collect();
        assert_eq!(rows[0], "1 | {\"a\": 1x}");
        assert_eq!(rows[1], "           ^");
        assert_eq!(rows[1].find('^'), rows[0].find('x'));
    }

    #[test]
    fn test_caret_snippet_keeps_tabs() {
        let snippet = caret_snippet("{\n\t\"a\": x\n}", 2, 7).unwrap();
        let rows: Vec<&str> = snippet.lines().collect();
        assert_eq!(rows[0], "2 | \t\"a\": x");
        assert_eq!(rows[1], "    \t     ^");
    }
}
