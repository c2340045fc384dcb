//! Shared fixtures for the integration tests

use async_trait::async_trait;
use sessoes_enricher::client::GenerationRequest;
use sessoes_enricher::config::Config;
use sessoes_enricher::{ClientError, GenerativeClient};
use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::sync::Mutex;

/// Mock model client
///
/// Scripted answers are served first, in order. Once the script is empty,
/// every news request is answered with one authority link derived from the
/// `tema:` line of its prompt, so the same record always gets the same
/// answer across runs.
#[derive(Default)]
pub struct MockClient {
    script: Mutex<VecDeque<Result<String, ClientError>>>,
    prompts: Mutex<Vec<String>>,
    /// Records whose `tema` is listed here fail with a fatal error
    fatal_temas: Vec<String>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scripted(answers: Vec<Result<String, ClientError>>) -> Self {
        Self {
            script: Mutex::new(answers.into()),
            ..Self::default()
        }
    }

    pub fn failing_on(tema: &str) -> Self {
        Self {
            fatal_temas: vec![tema.to_string()],
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

/// The `tema:` value of a news prompt, if present
fn tema_of(prompt: &str) -> Option<&str> {
    prompt
        .lines()
        .find_map(|line| line.strip_prefix("tema: "))
        .map(str::trim)
}

#[async_trait]
impl GenerativeClient for MockClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ClientError> {
        self.prompts.lock().unwrap().push(request.prompt.clone());

        if let Some(answer) = self.script.lock().unwrap().pop_front() {
            return answer;
        }

        let tema = tema_of(&request.prompt).unwrap_or("sem-tema");
        if self.fatal_temas.iter().any(|t| t == tema) {
            return Err(ClientError::Fatal("HTTP 403: permission denied".to_string()));
        }

        let slug = tema.to_lowercase().replace(' ', "-");
        Ok(format!(
            r#"{{"noticia_TSE": ["https://www.tse.jus.br/{slug}"], "noticia_TRE": [], "noticia_geral": ["https://g1.globo.com/{slug}"]}}"#
        ))
    }
}

/// Writes `body` as the input table and returns a config pointing at it
pub fn config_for(dir: &Path, body: &str) -> Config {
    let input = dir.join("sessoes.csv");
    fs::write(&input, body).unwrap();

    let mut config = Config::default();
    config.run.input_path = input;
    config.run.output_path = Some(dir.join("saida.csv"));
    config.retry.rate_limit_cooldown_secs = 5;
    config
}

/// Five sessions, one of them blank
pub const SESSIONS: &str = "\
tema,relator,partes
Caso A,Min. X,PT x PL
Caso B,Min. Y,\"MDB, PSD\"
,,
Caso D,Min. X,\"Linha 1
Linha 2\"
Caso E,Min. Z,
";

pub fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}
