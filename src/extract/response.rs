use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};

lazy_static! {
    /// A fence marker at the start of any line, with an optional language tag
    static ref FENCE_RE: Regex = Regex::new(r"(?m)^```[A-Za-z0-9_+-]*[ \t]*\r?\n?").unwrap();

    /// Greedy object span: first `{` to the last `}`
    static ref OBJECT_RE: Regex = Regex::new(r"(?s)\{.*\}").unwrap();
}

/// What a model answer turned out to be
#[derive(Debug, Clone, PartialEq)]
pub enum ModelResponse {
    /// A JSON object was recovered
    Success(Map<String, Value>),
    /// Text was present but held no JSON object
    Malformed(String),
    /// Nothing but whitespace and fences
    Empty,
}

impl ModelResponse {
    /// The recovered object, or an empty map
    pub fn into_map(self) -> Map<String, Value> {
        match self {
            Self::Success(map) => map,
            Self::Malformed(_) | Self::Empty => Map::new(),
        }
    }

    pub fn as_map(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::Success(map) => Some(map),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Removes markdown code-fence markers found at the start of any line
pub fn strip_code_fences(text: &str) -> String {
    FENCE_RE.replace_all(text, "").trim().to_string()
}

/// Parses model text into a [`ModelResponse`]
///
/// 1. Strip code-fence lines
/// 2. Parse the cleaned text as JSON
/// 3. Otherwise parse the greedy `{...}` span
/// 4. Otherwise the text is malformed
///
/// A JSON value that parses but is not an object counts as malformed.
/// Never fails; malformed answers are logged at warning level.
///
/// # Examples
///
/// ```
/// use sessoes_enricher::extract::{parse_response, ModelResponse};
///
/// let fenced = parse_response("```json\n{\"a\": 1}\n```");
/// let clean = parse_response("{\"a\": 1}");
/// assert_eq!(fenced, clean);
/// assert!(matches!(parse_response("   "), ModelResponse::Empty));
/// ```
pub fn parse_response(text: &str) -> ModelResponse {
    let cleaned = strip_code_fences(text);
    if cleaned.is_empty() {
        return ModelResponse::Empty;
    }

    if let Some(map) = parse_object(&cleaned) {
        return ModelResponse::Success(map);
    }

    if let Some(span) = OBJECT_RE.find(&cleaned) {
        if let Some(map) = parse_object(span.as_str()) {
            tracing::debug!("Recovered JSON object from surrounding text");
            return ModelResponse::Success(map);
        }
    }

    tracing::warn!(
        "Model answer is not a JSON object ({} chars); continuing with an empty result",
        cleaned.chars().count()
    );
    ModelResponse::Malformed(cleaned)
}

/// Parses model text into a field mapping, empty when nothing was recovered
pub fn extract(text: &str) -> Map<String, Value> {
    parse_response(text).into_map()
}

fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}
