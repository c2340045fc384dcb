//! Gemini client tests against a mock HTTP server

use crate::common::{config_for, read};
use serde_json::json;
use sessoes_enricher::client::{GeminiClient, GenerationRequest};
use sessoes_enricher::config::ApiConfig;
use sessoes_enricher::{process_table, ClientError, GenerativeClient};
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GENERATE_PATH: &str = "/v1beta/models/gemini-2.5-flash:generateContent";

fn api_config(server: &MockServer) -> ApiConfig {
    ApiConfig {
        endpoint: server.uri(),
        timeout_secs: 5,
        ..ApiConfig::default()
    }
}

fn request(web_search: bool, json_output: bool) -> GenerationRequest {
    GenerationRequest {
        model: "gemini-2.5-flash".to_string(),
        system_instruction: "Responda em JSON.".to_string(),
        prompt: "tema: Caso X".to_string(),
        web_search,
        json_output,
        temperature: 0.1,
    }
}

fn answer(parts: &[&str]) -> serde_json::Value {
    let parts: Vec<_> = parts.iter().map(|text| json!({ "text": text })).collect();
    json!({
        "candidates": [{ "content": { "role": "model", "parts": parts } }]
    })
}

#[tokio::test]
async fn test_generate_sends_request_and_joins_parts() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", "chave-teste"))
        .and(body_partial_json(json!({
            "systemInstruction": { "parts": [{ "text": "Responda em JSON." }] },
            "contents": [{ "role": "user", "parts": [{ "text": "tema: Caso X" }] }],
            "tools": [{ "google_search": {} }],
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(answer(&["{\"noticia_TSE\": ", "[]}"])))
        .expect(1)
        .mount(&server)
        .await;

    let client = GeminiClient::new(&api_config(&server), "chave-teste").unwrap();
    let text = client.generate(&request(true, false)).await.unwrap();

    assert_eq!(text, "{\"noticia_TSE\": []}");
}

#[tokio::test]
async fn test_json_mode_sets_response_mime_type() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(body_partial_json(json!({
            "generationConfig": { "responseMimeType": "application/json" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(answer(&["{}"])))
        .expect(1)
        .mount(&server)
        .await;

    let client = GeminiClient::new(&api_config(&server), "k").unwrap();
    assert_eq!(client.generate(&request(false, true)).await.unwrap(), "{}");
}

#[tokio::test]
async fn test_quota_errors_are_rate_limited() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": { "code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED" }
        })))
        .mount(&server)
        .await;

    let client = GeminiClient::new(&api_config(&server), "k").unwrap();
    let error = client.generate(&request(false, false)).await.unwrap_err();

    assert_eq!(
        error,
        ClientError::RateLimited("HTTP 429: Quota exceeded".to_string())
    );
}

#[tokio::test]
async fn test_permission_denied_is_fatal() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": { "code": 403, "message": "Permission denied", "status": "PERMISSION_DENIED" }
        })))
        .mount(&server)
        .await;

    let client = GeminiClient::new(&api_config(&server), "k").unwrap();
    let error = client.generate(&request(false, false)).await.unwrap_err();

    assert!(error.is_fatal());
}

#[tokio::test]
async fn test_server_errors_are_transient() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&server)
        .await;

    let client = GeminiClient::new(&api_config(&server), "k").unwrap();
    let error = client.generate(&request(false, false)).await.unwrap_err();

    assert_eq!(error, ClientError::Transient("HTTP 503".to_string()));
}

#[tokio::test]
async fn test_unreadable_body_is_transient() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let client = GeminiClient::new(&api_config(&server), "k").unwrap();
    let error = client.generate(&request(false, false)).await.unwrap_err();

    assert!(matches!(error, ClientError::Transient(_)));
}

#[tokio::test]
async fn test_end_to_end_run_against_mock_server() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(answer(&[
            "```json\n{\"noticia_TSE\": [\"https://www.tse.jus.br/x\"], \"noticia_TRE\": [\"https://tre-sp.jus.br/y\"], \"noticia_geral\": []}\n```",
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = config_for(dir.path(), "tema,relator\nCaso X,Min. A\n,\n");
    config.api = api_config(&server);
    let client = GeminiClient::new(&config.api, "k").unwrap();

    process_table(&config, &client).await.unwrap();

    assert_eq!(
        read(&config.resolved_output_path()),
        "tema,relator,noticia_TSE,noticia_TRE,noticia_geral\n\
         Caso X,Min. A,https://www.tse.jus.br/x,https://tre-sp.jus.br/y,\n\
         ,,,,\n"
    );
}
