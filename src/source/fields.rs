//! Field probing and coercion for heterogeneous raw records.

use serde_json::{Map, Value};

use crate::utils::is_missing_marker;

/// A raw record as delivered by an acquisition backend.
pub type RawRecord = Map<String, Value>;

/// Coerce any JSON value into text.
///
/// Lists are joined with `", "`, objects are serialized, null is empty.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        Value::Array(items) => items
            .iter()
            .map(value_to_text)
            .filter(|item| !item.trim().is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => value.to_string(),
    }
}

/// First candidate field whose trimmed text is non-empty and not the missing
/// marker; empty when none qualifies.
pub fn first_present(record: &RawRecord, candidates: &[&str]) -> String {
    for key in candidates {
        let Some(value) = record.get(*key) else {
            continue;
        };
        if value.is_null() {
            continue;
        }
        let text = value_to_text(value);
        let text = text.trim();
        if !text.is_empty() && !is_missing_marker(text) {
            return text.to_string();
        }
    }
    String::new()
}

/// Flatten a list-typed field into one string joined by `separator`.
///
/// Accepts a JSON array, a string holding a JSON-encoded array, or a plain
/// scalar (returned as text). Blank and missing-marker items are skipped.
pub fn list_text(value: Option<&Value>, separator: &str) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::Array(items)) => join_items(items, separator),
        Some(Value::String(text)) => match decode_json_list(text) {
            Some(items) => join_items(&items, separator),
            None => text.trim().to_string(),
        },
        Some(other) => value_to_text(other),
    }
}

fn join_items(items: &[Value], separator: &str) -> String {
    items
        .iter()
        .map(value_to_text)
        .filter(|item| {
            let trimmed = item.trim();
            !trimmed.is_empty() && !is_missing_marker(trimmed)
        })
        .collect::<Vec<_>>()
        .join(separator)
}

fn decode_json_list(text: &str) -> Option<Vec<Value>> {
    let trimmed = text.trim();
    if !trimmed.starts_with('[') {
        return None;
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Array(items)) => Some(items),
        _ => None,
    }
}

/// Use `title` when present, otherwise a placeholder derived from the id.
pub fn title_or_placeholder(
    title: String,
    prefix: &str,
    dataset_id: &str,
    fallback: &str,
) -> String {
    if !title.is_empty() {
        title
    } else if !dataset_id.is_empty() {
        format!("{prefix}_{dataset_id}")
    } else {
        format!("{prefix}_{fallback}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawRecord {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn first_present_skips_null_blank_and_missing_marker() {
        let record = raw(json!({
            "a": null,
            "b": "   ",
            "c": "none",
            "d": "  picked  ",
            "e": "later"
        }));
        assert_eq!(first_present(&record, &["a", "b", "c", "d", "e"]), "picked");
        assert_eq!(first_present(&record, &["e", "d"]), "later");
        assert_eq!(first_present(&record, &["zzz"]), "");
    }

    #[test]
    fn first_present_coerces_scalars() {
        let record = raw(json!({"rating": 1500, "flag": true, "list": ["x", "y"]}));
        assert_eq!(first_present(&record, &["rating"]), "1500");
        assert_eq!(first_present(&record, &["flag"]), "true");
        assert_eq!(first_present(&record, &["list"]), "x, y");
    }

    #[test]
    fn list_text_flattens_arrays_and_encoded_arrays() {
        let tags = json!(["dp", "", "greedy"]);
        assert_eq!(list_text(Some(&tags), ","), "dp,greedy");

        let encoded = json!("[\"def a(): pass\", \"def b(): pass\"]");
        assert_eq!(
            list_text(Some(&encoded), "\n\n---\n\n"),
            "def a(): pass\n\n---\n\ndef b(): pass"
        );

        let plain = json!(" print(1) ");
        assert_eq!(list_text(Some(&plain), ","), "print(1)");
        assert_eq!(list_text(None, ","), "");
        assert_eq!(list_text(Some(&Value::Null), ","), "");
    }

    #[test]
    fn title_placeholder_prefers_real_title_then_id() {
        assert_eq!(title_or_placeholder("Two Sum".into(), "leetcode", "1", "problem"), "Two Sum");
        assert_eq!(title_or_placeholder(String::new(), "leetcode", "1", "problem"), "leetcode_1");
        assert_eq!(
            title_or_placeholder(String::new(), "leetcode", "", "problem"),
            "leetcode_problem"
        );
    }
}
