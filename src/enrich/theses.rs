use crate::client::{CallError, GenerationRequest, RetryCaller};
use crate::config::Config;
use crate::enrich::prompts::{
    justification_prompt, thesis_prompt, NO_THESIS_MARKER, THESIS_SYSTEM_INSTRUCTION,
};
use crate::enrich::Enricher;
use crate::extract::strip_code_fences;
use crate::storage::Record;
use async_trait::async_trait;

pub const THESIS_COLUMNS: [&str; 3] = ["Tese", "Justificativa", "Resultado"];

const PENDING_MARKER: &str = "há repercussão geral";
const PENDING_THESIS: &str = "Repercussão geral reconhecida, mas mérito pendente de julgamento.";

pub const OUTCOME_PENDING: &str = "Aguardando julgamento";
pub const OUTCOME_FIXED: &str = "Tese fixada";
pub const OUTCOME_INFRA: &str = "Infraconstitucional";

/// Thesis, justification and outcome of general-repercussion rulings
pub struct ThesisEnricher {
    ementa_column: String,
    columns: Vec<String>,
    model: String,
    temperature: f32,
}

impl ThesisEnricher {
    pub fn new(config: &Config) -> Self {
        Self {
            ementa_column: config.task.ementa_column.clone(),
            columns: THESIS_COLUMNS.iter().map(|c| c.to_string()).collect(),
            model: config.api.model.clone(),
            temperature: config.api.temperature,
        }
    }

    fn request(&self, prompt: String) -> GenerationRequest {
        GenerationRequest {
            model: self.model.clone(),
            system_instruction: THESIS_SYSTEM_INSTRUCTION.to_string(),
            prompt,
            web_search: false,
            json_output: false,
            temperature: self.temperature,
        }
    }
}

/// Whether the model reported that no thesis was fixed
fn is_no_thesis(answer: &str) -> bool {
    answer
        .trim_matches(|c: char| c.is_whitespace() || c == '"' || c == '.')
        .eq_ignore_ascii_case(NO_THESIS_MARKER)
}

#[async_trait]
impl Enricher for ThesisEnricher {
    fn output_columns(&self) -> &[String] {
        &self.columns
    }

    fn context(&self, record: &Record) -> String {
        record.get(&self.ementa_column).trim().to_string()
    }

    fn precomputed(&self, context: &str) -> Option<Vec<String>> {
        if context.to_lowercase().contains(PENDING_MARKER) {
            Some(vec![
                PENDING_THESIS.to_string(),
                String::new(),
                OUTCOME_PENDING.to_string(),
            ])
        } else {
            None
        }
    }

    async fn enrich(
        &self,
        caller: &RetryCaller<'_>,
        context: &str,
    ) -> Result<Vec<String>, CallError> {
        let thesis = strip_code_fences(&caller.call(&self.request(thesis_prompt(context))).await?);

        if is_no_thesis(&thesis) {
            return Ok(vec![
                NO_THESIS_MARKER.to_string(),
                String::new(),
                OUTCOME_INFRA.to_string(),
            ]);
        }

        // A thesis without its justification is still written
        let justification = match caller
            .call(&self.request(justification_prompt(&thesis)))
            .await
        {
            Ok(text) => text.trim().to_string(),
            Err(error) if error.is_fatal() => return Err(error),
            Err(error) => {
                tracing::warn!("Justification unavailable, keeping the thesis: {}", error);
                String::new()
            }
        };

        Ok(vec![thesis, justification, OUTCOME_FIXED.to_string()])
    }
}
