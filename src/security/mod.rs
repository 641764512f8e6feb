//! Input hygiene for prompts and API key checks.
//!
//! Everything a user types ends up inside a prompt sent to Gemini, so it is
//! trimmed, length-limited and stripped of template and script fragments
//! first. API keys are validated for shape before any network call is made.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

/// Default maximum prompt length in characters.
pub const DEFAULT_PROMPT_MAX_CHARS: usize = 1000;

/// Default maximum length for [`sanitize_input`].
pub const DEFAULT_INPUT_MAX_CHARS: usize = 5000;

/// Google API keys start with this prefix.
const API_KEY_PREFIX: &str = "AIza";

const MIN_API_KEY_LEN: usize = 30;

lazy_static! {
    static ref MUSTACHE_TEMPLATE: Regex = Regex::new(r"\{\{.*?\}\}").unwrap();
    static ref DOLLAR_TEMPLATE: Regex = Regex::new(r"\$\{.*?\}").unwrap();
    static ref SCRIPT_BLOCK: Regex = Regex::new(r"(?is)<script\b.*?</script>").unwrap();
    static ref EVENT_HANDLER: Regex = Regex::new(r#"(?i)\s*on\w+\s*=\s*["'][^"']*["']"#).unwrap();
    static ref JAVASCRIPT_URL: Regex = Regex::new(r"(?i)javascript:").unwrap();
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyValidationError {
    #[error("API key is required")]
    Missing,

    #[error("Please replace the placeholder with your actual API key")]
    Placeholder,

    #[error("API key is too short")]
    TooShort,

    #[error("Invalid API key format. Gemini keys start with \"AIza\"")]
    BadFormat,
}

/// Check that `api_key` looks like a real Gemini key.
///
/// Placeholders are rejected before the length check so that a short
/// `your_key` gets the more useful message.
pub fn validate_api_key(api_key: Option<&str>) -> Result<(), KeyValidationError> {
    let key = match api_key.map(str::trim) {
        Some(key) if !key.is_empty() => key,
        _ => return Err(KeyValidationError::Missing),
    };

    if key.contains("your_") || key.contains("YOUR_") {
        return Err(KeyValidationError::Placeholder);
    }

    if key.len() < MIN_API_KEY_LEN {
        return Err(KeyValidationError::TooShort);
    }

    if !key.starts_with(API_KEY_PREFIX) {
        return Err(KeyValidationError::BadFormat);
    }

    Ok(())
}

/// Prepare free text for inclusion in a prompt.
///
/// Trims, keeps at most `max_chars` characters, then removes `{{...}}` and
/// `${...}` template fragments and `<script>` blocks.
pub fn sanitize_prompt(input: &str, max_chars: usize) -> String {
    let truncated: String = input.trim().chars().take(max_chars).collect();
    let without_mustache = MUSTACHE_TEMPLATE.replace_all(&truncated, "");
    let without_dollar = DOLLAR_TEMPLATE.replace_all(&without_mustache, "");
    SCRIPT_BLOCK.replace_all(&without_dollar, "").into_owned()
}

/// Make untrusted text safe to store and display as HTML.
///
/// Stricter than [`sanitize_prompt`]: also drops inline event handlers and
/// `javascript:` URLs, then escapes the HTML special characters. Text is not
/// trimmed.
pub fn sanitize_input(input: &str, max_chars: usize) -> String {
    let truncated: String = input.chars().take(max_chars).collect();
    let cleaned = SCRIPT_BLOCK.replace_all(&truncated, "");
    let cleaned = EVENT_HANDLER.replace_all(&cleaned, "");
    let cleaned = JAVASCRIPT_URL.replace_all(&cleaned, "");
    let cleaned = MUSTACHE_TEMPLATE.replace_all(&cleaned, "");
    let cleaned = DOLLAR_TEMPLATE.replace_all(&cleaned, "");
    escape_html(&cleaned)
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Shorten a secret for display: first four and last four characters.
pub fn mask_sensitive(data: &str) -> String {
    let chars: Vec<char> = data.chars().collect();
    if chars.len() < 10 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}
