use crate::client::{ClientError, GenerationRequest, GenerativeClient};
use async_trait::async_trait;
use sha2::{Digest, Sha256};

/// Client that never touches the network
///
/// Answers are derived from a SHA-256 of the prompt, so the same record
/// always gets the same placeholder. JSON-shaped requests (including search
/// requests whose JSON mode was dropped) get an object carrying one link
/// under the authority domain; plain text requests get a bracketed marker.
pub struct DryRunClient {
    authority_domain: String,
}

impl DryRunClient {
    pub fn new(authority_domain: impl Into<String>) -> Self {
        Self {
            authority_domain: authority_domain.into(),
        }
    }

    fn digest(prompt: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(prompt.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[async_trait]
impl GenerativeClient for DryRunClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ClientError> {
        let digest = Self::digest(&request.prompt);
        let short = &digest[..12];

        if request.json_output || request.web_search {
            let answer = serde_json::json!({
                "dry_run": true,
                "placeholder": format!("https://www.{}/dry-run/{}", self.authority_domain, short),
            });
            Ok(answer.to_string())
        } else {
            Ok(format!("[dry-run {}]", short))
        }
    }

    fn supports_json_with_search(&self) -> bool {
        true
    }
}
