//! Retry-call wrapper
//!
//! Every model call goes through [`RetryCaller`]. The decision of what to do
//! after an attempt is a pure function of the attempt number, the error and
//! a jitter value, so it can be tested without sleeping.

use crate::client::{CallError, ClientError, GenerationRequest, GenerativeClient};
use crate::config::RetryConfig;
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Longest wait between two attempts
pub const MAX_BACKOFF: Duration = Duration::from_secs(3600);

/// Retry policy for model calls
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | Fatal (permission, credential) | Give up immediately |
/// | Rate limited | Cool down, retry; on the last attempt cool down, then give up |
/// | Transient (server, network, empty answer) | Wait `base^attempt + jitter`, retry |
/// | Attempts exhausted | Give up with the last error |
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts per call
    pub max_retries: u32,
    pub backoff_base: f64,
    pub rate_limit_cooldown: Duration,
}

/// What to do after a failed attempt
#[derive(Debug, Clone, PartialEq)]
pub enum RetryDecision {
    Retry(Duration),
    GiveUp { cooldown: Option<Duration> },
}

/// What to do after any attempt
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    Success(String),
    Retry {
        delay: Duration,
        error: ClientError,
    },
    GiveUp {
        error: CallError,
        cooldown: Option<Duration>,
    },
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries.max(1),
            backoff_base: config.backoff_base,
            rate_limit_cooldown: Duration::from_secs(config.rate_limit_cooldown_secs),
        }
    }

    /// Exponential backoff for a zero-based attempt, capped at [`MAX_BACKOFF`];
    /// jitter is clamped to [0, 1)
    pub fn backoff(&self, attempt: u32, jitter: f64) -> Duration {
        let jitter = if jitter.is_finite() {
            jitter.clamp(0.0, 0.999_999)
        } else {
            0.0
        };
        let exponent = attempt.min(30) as i32;
        Duration::try_from_secs_f64(self.backoff_base.powi(exponent) + jitter)
            .map_or(MAX_BACKOFF, |delay| delay.min(MAX_BACKOFF))
    }

    /// Decides what follows a failed zero-based `attempt`
    pub fn decide(&self, attempt: u32, error: &ClientError, jitter: f64) -> RetryDecision {
        let last_attempt = attempt + 1 >= self.max_retries;

        match error {
            ClientError::Fatal(_) => RetryDecision::GiveUp { cooldown: None },
            ClientError::RateLimited(_) if last_attempt => RetryDecision::GiveUp {
                cooldown: Some(self.rate_limit_cooldown),
            },
            ClientError::RateLimited(_) => RetryDecision::Retry(self.rate_limit_cooldown),
            ClientError::Transient(_) if last_attempt => RetryDecision::GiveUp { cooldown: None },
            ClientError::Transient(_) => RetryDecision::Retry(self.backoff(attempt, jitter)),
        }
    }

    /// Evaluates the result of a zero-based `attempt`
    ///
    /// Blank answer text counts as a transient failure.
    pub fn evaluate(
        &self,
        attempt: u32,
        result: Result<String, ClientError>,
        jitter: f64,
    ) -> AttemptOutcome {
        let error = match result {
            Ok(text) if !text.trim().is_empty() => return AttemptOutcome::Success(text),
            Ok(_) => ClientError::Transient("empty response".to_string()),
            Err(e) => e,
        };

        match self.decide(attempt, &error, jitter) {
            RetryDecision::Retry(delay) => AttemptOutcome::Retry { delay, error },
            RetryDecision::GiveUp { cooldown } => {
                let error = if error.is_fatal() {
                    CallError::Fatal(error)
                } else {
                    CallError::Exhausted {
                        attempts: attempt + 1,
                        last: error,
                    }
                };
                AttemptOutcome::GiveUp { error, cooldown }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

/// Runs model calls under a [`RetryPolicy`]
pub struct RetryCaller<'a> {
    client: &'a dyn GenerativeClient,
    policy: RetryPolicy,
}

impl<'a> RetryCaller<'a> {
    pub fn new(client: &'a dyn GenerativeClient, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Calls the model until it answers, the error is fatal, or attempts run out
    pub async fn call(&self, request: &GenerationRequest) -> Result<String, CallError> {
        let request = request
            .clone()
            .reconcile(self.client.supports_json_with_search());
        let mut attempt = 0;

        loop {
            tracing::debug!(
                "Calling {} (attempt {}/{}, prompt {} chars, search={}, json={})",
                request.model,
                attempt + 1,
                self.policy.max_retries,
                request.prompt.chars().count(),
                request.web_search,
                request.json_output
            );

            let started = Instant::now();
            let result = self.client.generate(&request).await;
            let elapsed = started.elapsed();

            if let Ok(text) = &result {
                tracing::debug!(
                    "Answer received in {:.1}s ({} chars)",
                    elapsed.as_secs_f64(),
                    text.chars().count()
                );
            }

            match self.policy.evaluate(attempt, result, rand::random::<f64>()) {
                AttemptOutcome::Success(text) => return Ok(text),
                AttemptOutcome::Retry { delay, error } => {
                    tracing::warn!(
                        "Attempt {}/{} failed: {}; retrying in {:.1}s",
                        attempt + 1,
                        self.policy.max_retries,
                        error,
                        delay.as_secs_f64()
                    );
                    sleep(delay).await;
                }
                AttemptOutcome::GiveUp { error, cooldown } => {
                    if let Some(cooldown) = cooldown {
                        tracing::warn!(
                            "Quota still exhausted; cooling down {}s before moving on",
                            cooldown.as_secs()
                        );
                        sleep(cooldown).await;
                    }
                    return Err(error);
                }
            }

            attempt += 1;
        }
    }
}
