use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref SCHEME_RE: Regex = Regex::new(r"(?i)^https?://").unwrap();
}

/// Characters stripped from both ends of a raw URL candidate
///
/// Model output tends to wrap links in prose punctuation, brackets and quotes.
const EDGE_PUNCTUATION: &[char] = &['.', ',', ';', ')', ']', '}', '>', '"', '\''];

/// Normalizes a raw URL candidate taken from model output
///
/// # Normalization Steps
///
/// 1. Trim surrounding whitespace
/// 2. Trim edge punctuation (`.`, `,`, `;`, `)`, `]`, `}`, `>` and quotes)
/// 3. Prepend `https://` when no http(s) scheme is present
///
/// The result is not validated as a URL; classification rejects anything
/// without a usable host.
///
/// # Returns
///
/// * `Some(String)` - The normalized candidate
/// * `None` - Nothing was left after trimming
///
/// # Examples
///
/// ```
/// use sessoes_enricher::url::normalize_url;
///
/// assert_eq!(normalize_url("folha.uol.com.br/b"), Some("https://folha.uol.com.br/b".to_string()));
/// assert_eq!(normalize_url(" \"example.com\" "), Some("https://example.com".to_string()));
/// assert_eq!(normalize_url(" ., "), None);
/// ```
pub fn normalize_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_matches(EDGE_PUNCTUATION).trim();
    if trimmed.is_empty() {
        return None;
    }

    if SCHEME_RE.is_match(trimmed) {
        Some(trimmed.to_string())
    } else {
        Some(format!("https://{}", trimmed))
    }
}
