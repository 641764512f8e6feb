// Parsing of AI-extracted paper metadata
// Author: kelexine (https://github.com/kelexine)

use super::prompts::PaperMetadata;
use crate::error::{GatewayError, Result};
use crate::security::{sanitize_input, DEFAULT_INPUT_MAX_CHARS};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

/// Shorter text rarely holds enough to identify a paper.
pub const MIN_SOURCE_CHARS: usize = 50;

/// Characters of paper text sent along with the extraction prompt.
pub const SOURCE_MAX_CHARS: usize = 3000;

const UNTITLED: &str = "Untitled";
const UNKNOWN_AUTHOR: &str = "Unknown";

lazy_static! {
    /// First `{` through last `}`; models like to wrap JSON in prose or fences.
    static ref JSON_OBJECT: Regex = Regex::new(r"(?s)\{.*\}").unwrap();
}

/// Turn a model reply into validated metadata.
///
/// Every text field is sanitized. A missing title becomes `Untitled`, missing
/// authors become `Unknown`, and a year outside 1901..=2099 is replaced by
/// `current_year`.
pub fn parse_metadata_reply(reply: &str, current_year: i32) -> Result<PaperMetadata> {
    let block = JSON_OBJECT
        .find(reply)
        .ok_or_else(|| GatewayError::GeminiApi("no JSON object in metadata reply".to_string()))?;
    let value: Value = serde_json::from_str(block.as_str())?;

    let title = text_field(&value["title"]).unwrap_or_else(|| UNTITLED.to_string());

    let authors: Vec<String> = value["authors"]
        .as_array()
        .map(|list| list.iter().filter_map(text_field).collect())
        .unwrap_or_default();
    let authors = if authors.is_empty() {
        vec![UNKNOWN_AUTHOR.to_string()]
    } else {
        authors
    };

    let year = value["year"]
        .as_i64()
        .filter(|year| *year > 1900 && *year < 2100)
        .map(|year| year as i32)
        .unwrap_or(current_year);

    Ok(PaperMetadata {
        title,
        authors,
        publication: text_field(&value["journal"]).unwrap_or_default(),
        year,
        volume: text_field(&value["volume"]),
        issue: text_field(&value["issue"]),
        pages: text_field(&value["pages"]),
    })
}

/// Strings and numbers are accepted; volumes and issues often come back as numbers.
fn text_field(value: &Value) -> Option<String> {
    let raw = match value {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        _ => return None,
    };
    let clean = sanitize_input(&raw, DEFAULT_INPUT_MAX_CHARS);
    (!clean.is_empty()).then_some(clean)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_fenced_json() {
        let reply = r#"Here you go:
```json
{"title": "Attention Is All You Need", "authors": ["Vaswani, A.", " "], "year": 2017,
 "journal": "NeurIPS", "volume": 30, "issue": "", "pages": "5998-6008"}
```"#;
        let metadata = parse_metadata_reply(reply, 2026).unwrap();

        assert_eq!(metadata.title, "Attention Is All You Need");
        assert_eq!(metadata.authors, vec!["Vaswani, A."]);
        assert_eq!(metadata.year, 2017);
        assert_eq!(metadata.publication, "NeurIPS");
        assert_eq!(metadata.volume.as_deref(), Some("30"));
        assert_eq!(metadata.issue, None);
        assert_eq!(metadata.pages.as_deref(), Some("5998-6008"));
    }

    #[test]
    fn test_defaults_for_missing_fields() {
        let metadata = parse_metadata_reply(r#"{"year": 1850}"#, 2026).unwrap();
        assert_eq!(metadata.title, "Untitled");
        assert_eq!(metadata.authors, vec!["Unknown"]);
        assert_eq!(metadata.year, 2026);
        assert_eq!(metadata.publication, "");

        let metadata = parse_metadata_reply(r#"{"year": 2100}"#, 2026).unwrap();
        assert_eq!(metadata.year, 2026);
    }

    #[test]
    fn test_fields_are_sanitized() {
        let reply = r#"{"title": "<script>x()</script>Deep & Wide", "authors": ["O'Neil, C."]}"#;
        let metadata = parse_metadata_reply(reply, 2026).unwrap();
        assert_eq!(metadata.title, "Deep &amp; Wide");
        assert_eq!(metadata.authors, vec!["O&#x27;Neil, C."]);
    }

    #[test]
    fn test_reply_without_json_is_an_error() {
        let err = parse_metadata_reply("I could not find any metadata.", 2026).unwrap_err();
        assert!(matches!(err, GatewayError::GeminiApi(_)));

        let err = parse_metadata_reply("{not json}", 2026).unwrap_err();
        assert!(matches!(err, GatewayError::Json(_)));
    }
}
