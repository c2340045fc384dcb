//! Gemini REST client
//!
//! Calls `models/{model}:generateContent` and classifies failures:
//!
//! | Condition | Error |
//! |-----------|-------|
//! | HTTP 429, or `RESOURCE_EXHAUSTED` in the error body | RateLimited |
//! | HTTP 400, 401, 403, 404 and other 4xx | Fatal |
//! | HTTP 408, 5xx | Transient |
//! | Timeout, connection failure, unreadable body | Transient |

use crate::client::{ClientError, GenerationRequest, GenerativeClient};
use crate::config::ApiConfig;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Builds the HTTP client used for model calls
pub fn build_http_client(config: &ApiConfig) -> Result<Client, reqwest::Error> {
    let user_agent = format!(
        "{}/{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Client for the Gemini `generateContent` endpoint
pub struct GeminiClient {
    http: Client,
    endpoint: String,
    api_key: String,
    json_with_search: bool,
}

impl GeminiClient {
    pub fn new(config: &ApiConfig, api_key: impl Into<String>) -> Result<Self, reqwest::Error> {
        Ok(Self {
            http: build_http_client(config)?,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            json_with_search: config.json_with_search,
        })
    }

    fn url_for(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.endpoint, model)
    }
}

#[async_trait]
impl GenerativeClient for GeminiClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ClientError> {
        let body = GenerateContentRequest::from_request(request);

        let response = self
            .http
            .post(self.url_for(&request.model))
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        let text = response.text().await.map_err(classify_transport_error)?;

        if !status.is_success() {
            return Err(classify_status(status, &text));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&text)
            .map_err(|e| ClientError::Transient(format!("unreadable response body: {}", e)))?;

        Ok(parsed.text())
    }

    fn supports_json_with_search(&self) -> bool {
        self.json_with_search
    }
}

/// Maps a non-success HTTP status (and its error body) to a client error
pub fn classify_status(status: StatusCode, body: &str) -> ClientError {
    let detail = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .map(|envelope| envelope.error);

    let message = match &detail {
        Some(detail) if !detail.message.is_empty() => {
            format!("HTTP {}: {}", status.as_u16(), detail.message)
        }
        _ => format!("HTTP {}", status.as_u16()),
    };

    let exhausted = detail
        .as_ref()
        .map_or(false, |d| d.status == "RESOURCE_EXHAUSTED");

    if status == StatusCode::TOO_MANY_REQUESTS || exhausted {
        ClientError::RateLimited(message)
    } else if status == StatusCode::REQUEST_TIMEOUT || status.is_server_error() {
        ClientError::Transient(message)
    } else {
        ClientError::Fatal(message)
    }
}

fn classify_transport_error(e: reqwest::Error) -> ClientError {
    if e.is_timeout() {
        ClientError::Transient("request timeout".to_string())
    } else if e.is_connect() {
        ClientError::Transient("connection failed".to_string())
    } else if e.is_builder() {
        ClientError::Fatal(e.to_string())
    } else {
        ClientError::Transient(e.to_string())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
    generation_config: GenerationConfig,
}

impl GenerateContentRequest {
    fn from_request(request: &GenerationRequest) -> Self {
        let tools = if request.web_search {
            vec![Tool {
                google_search: GoogleSearch {},
            }]
        } else {
            Vec::new()
        };

        Self {
            system_instruction: Content::text(None, &request.system_instruction),
            contents: vec![Content::text(Some("user"), &request.prompt)],
            tools,
            generation_config: GenerationConfig {
                temperature: request.temperature,
                response_mime_type: request
                    .json_output
                    .then(|| "application/json".to_string()),
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

impl Content {
    fn text(role: Option<&str>, text: &str) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![Part {
                text: Some(text.to_string()),
            }],
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Debug, Serialize)]
struct GoogleSearch {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// Text parts of the first candidate, concatenated
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}
