use crate::client::{CallError, GenerationRequest, RetryCaller};
use crate::config::{ClassifierConfig, Config, NewsLayout};
use crate::enrich::prompts::{news_prompt, NEWS_SYSTEM_INSTRUCTION};
use crate::enrich::{build_context, Enricher};
use crate::extract::{collect_candidate_urls, parse_response};
use crate::storage::Record;
use crate::url::{ClassifiedUrls, DomainRules};
use crate::ConfigError;
use async_trait::async_trait;

/// Output columns of the joined layout, also the answer keys the model is asked for
pub const NEWS_COLUMNS: [&str; 3] = ["noticia_TSE", "noticia_TRE", "noticia_geral"];

/// News links for session items
pub struct NewsEnricher {
    rules: DomainRules,
    classifier: ClassifierConfig,
    context_fields: Vec<String>,
    max_field_length: usize,
    layout: NewsLayout,
    max_overflow: usize,
    columns: Vec<String>,
    model: String,
    temperature: f32,
    web_search: bool,
}

impl NewsEnricher {
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let layout = config.task.news_layout;
        let max_overflow = match layout {
            NewsLayout::Joined => 0,
            NewsLayout::Spread => config.task.max_overflow_columns,
        };

        let mut columns: Vec<String> = NEWS_COLUMNS.iter().map(|c| c.to_string()).collect();
        columns.extend((1..=max_overflow).map(|n| format!("{}_{}", NEWS_COLUMNS[2], n)));

        Ok(Self {
            rules: DomainRules::from_config(&config.classifier)?,
            classifier: config.classifier.clone(),
            context_fields: config.task.context_fields.clone(),
            max_field_length: config.task.max_field_length,
            layout,
            max_overflow,
            columns,
            model: config.api.model.clone(),
            temperature: config.api.temperature,
            web_search: config.api.web_search,
        })
    }

    /// Classifies a raw model answer into links by category
    pub fn classify_answer(&self, raw: &str) -> ClassifiedUrls {
        let response = parse_response(raw);
        let candidates = collect_candidate_urls(&response, &NEWS_COLUMNS, raw);
        ClassifiedUrls::from_candidates(candidates, &self.rules)
    }

    /// Lays classified links out over the output columns
    pub fn values_for(&self, links: &ClassifiedUrls) -> Vec<String> {
        let mut values = vec![
            ClassifiedUrls::join(&links.primary),
            ClassifiedUrls::join(&links.regional),
        ];

        match self.layout {
            NewsLayout::Joined => values.push(ClassifiedUrls::join(&links.general)),
            NewsLayout::Spread => {
                let mut general = links.general.iter();
                values.push(general.next().cloned().unwrap_or_default());

                let overflow: Vec<String> = general.cloned().collect();
                if overflow.len() > self.max_overflow {
                    tracing::warn!(
                        "{} general links do not fit in {} overflow columns; extra links dropped",
                        overflow.len(),
                        self.max_overflow
                    );
                }
                for n in 0..self.max_overflow {
                    values.push(overflow.get(n).cloned().unwrap_or_default());
                }
            }
        }

        values
    }
}

#[async_trait]
impl Enricher for NewsEnricher {
    fn output_columns(&self) -> &[String] {
        &self.columns
    }

    fn context(&self, record: &Record) -> String {
        build_context(record, &self.context_fields, self.max_field_length)
    }

    async fn enrich(
        &self,
        caller: &RetryCaller<'_>,
        context: &str,
    ) -> Result<Vec<String>, CallError> {
        let request = GenerationRequest {
            model: self.model.clone(),
            system_instruction: NEWS_SYSTEM_INSTRUCTION.to_string(),
            prompt: news_prompt(context, &self.classifier),
            web_search: self.web_search,
            json_output: true,
            temperature: self.temperature,
        };

        let raw = caller.call(&request).await?;
        let links = self.classify_answer(&raw);
        tracing::debug!(
            "Links found: {} authority, {} regional, {} general",
            links.primary.len(),
            links.regional.len(),
            links.general.len()
        );

        Ok(self.values_for(&links))
    }
}
