use crate::extract::ModelResponse;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

lazy_static! {
    /// Permissive URL token: an http(s) scheme up to whitespace or closing punctuation
    static ref URL_RE: Regex = Regex::new(r#"(?i)https?://[^\s\]\)>,;"']+"#).unwrap();
}

/// Finds every http(s) URL token in free text, in order of appearance
pub fn find_urls(text: &str) -> Vec<String> {
    URL_RE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Coerces one answer field into a list of link candidates
///
/// * array: its string elements, as written (other element types are skipped)
/// * string: the URL tokens found inside it
/// * anything else: nothing
pub fn urls_from_value(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| item.as_str())
            .map(str::to_string)
            .collect(),
        Value::String(text) => find_urls(text),
        _ => Vec::new(),
    }
}

/// Gathers link candidates from the expected keys of an answer
///
/// Keys are read in the given order. When none of them yields a candidate,
/// the whole raw answer is scanned for URL tokens instead, which recovers
/// links from prose answers and from objects with unexpected keys.
pub fn collect_candidate_urls(response: &ModelResponse, keys: &[&str], raw: &str) -> Vec<String> {
    let mut candidates = Vec::new();

    if let Some(map) = response.as_map() {
        for key in keys {
            if let Some(value) = map.get(*key) {
                candidates.extend(urls_from_value(value));
            }
        }
    }

    if candidates.is_empty() {
        candidates = find_urls(raw);
        if !candidates.is_empty() {
            tracing::debug!(
                "No links under expected keys; recovered {} from raw text",
                candidates.len()
            );
        }
    }

    candidates
}
