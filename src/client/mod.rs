//! Generative model clients
//!
//! This module defines the boundary to the external text-generation service:
//! - The [`GenerativeClient`] trait and its request type
//! - The error conditions a client can report
//! - The Gemini REST implementation and a network-free dry-run client
//! - The retry wrapper that every model call goes through

mod dry_run;
mod gemini;
mod retry;

pub use dry_run::DryRunClient;
pub use gemini::{build_http_client, GeminiClient};
pub use retry::{AttemptOutcome, RetryCaller, RetryDecision, RetryPolicy};

use async_trait::async_trait;
use thiserror::Error;

/// Conditions a client distinguishes when a call fails
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Quota exhausted; worth retrying after a long pause
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Network blip, timeout, server error or empty answer
    #[error("transient failure: {0}")]
    Transient(String),

    /// Rejected request (permission, credential, bad model name)
    #[error("request rejected: {0}")]
    Fatal(String),
}

impl ClientError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }
}

/// Failure of a model call after the retry policy has run its course
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    #[error("non-retryable failure: {0}")]
    Fatal(ClientError),

    #[error("gave up after {attempts} attempts, last error: {last}")]
    Exhausted { attempts: u32, last: ClientError },
}

impl CallError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }
}

/// One text-generation request
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub model: String,
    pub system_instruction: String,
    pub prompt: String,
    /// Ground the answer with the search tool
    pub web_search: bool,
    /// Ask for a JSON document as the response body
    pub json_output: bool,
    pub temperature: f32,
}

impl GenerationRequest {
    /// Drops JSON mode when it is requested together with search and the
    /// client cannot combine the two; search takes priority
    pub fn reconcile(mut self, json_with_search: bool) -> Self {
        if self.web_search && self.json_output && !json_with_search {
            self.json_output = false;
        }
        self
    }
}

/// A text-generation service
#[async_trait]
pub trait GenerativeClient: Send + Sync {
    /// Sends one request and returns the answer text
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ClientError>;

    /// Whether JSON mode and the search tool can be used in one request
    fn supports_json_with_search(&self) -> bool {
        false
    }
}
