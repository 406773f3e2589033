//! Field-level string transforms shared by the mapper and the cleaners.

use crate::constants::layout::EMPTY_PARTITION_SEGMENT;
use crate::constants::schema::{MISSING_TOKEN, TAG_SEPARATOR};

/// Collapse runs of whitespace into single spaces and trim.
pub fn normalize_inline_whitespace<T: AsRef<str>>(text: T) -> String {
    let mut normalized = String::new();
    let mut seen_space = false;
    for ch in text.as_ref().chars() {
        if ch.is_whitespace() {
            if !seen_space {
                normalized.push(' ');
                seen_space = true;
            }
        } else {
            normalized.push(ch);
            seen_space = false;
        }
    }
    normalized.trim().to_string()
}

/// True when `value` is the literal missing-value token (case-insensitive).
pub fn is_missing_marker(value: &str) -> bool {
    value.eq_ignore_ascii_case(MISSING_TOKEN)
}

/// Blank out a field that holds exactly the missing-value token.
pub fn blank_missing(value: String) -> String {
    if value == MISSING_TOKEN {
        String::new()
    } else {
        value
    }
}

/// Whitespace-normalize a field and blank the missing-value token.
pub fn normalize_field<T: AsRef<str>>(value: T) -> String {
    blank_missing(normalize_inline_whitespace(value))
}

/// Lowercase, trim, and de-duplicate a comma-joined tag list.
///
/// Empty tokens are dropped; first occurrence order is preserved.
pub fn normalize_tags(tags: &str) -> String {
    let mut seen: Vec<String> = Vec::new();
    for token in tags.split(TAG_SEPARATOR) {
        let token = token.trim().to_lowercase();
        if token.is_empty() || seen.contains(&token) {
            continue;
        }
        seen.push(token);
    }
    seen.join(TAG_SEPARATOR)
}

/// Percent-escape a value for use as a single path segment.
pub fn escape_path_segment(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '%' | '=' | '\n' | '\r'
            | '\t' => {
                let mut buf = [0u8; 4];
                for byte in ch.encode_utf8(&mut buf).bytes() {
                    escaped.push_str(&format!("%{byte:02X}"));
                }
            }
            _ => escaped.push(ch),
        }
    }
    if escaped.is_empty() {
        EMPTY_PARTITION_SEGMENT.to_string()
    } else if escaped == "." || escaped == ".." {
        escaped.replace('.', "%2E")
    } else {
        escaped
    }
}
