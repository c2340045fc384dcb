use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
///
/// Assembled once at startup (defaults, then the optional TOML file, then
/// command-line overrides) and passed by reference into the processor.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub run: RunConfig,
    pub api: ApiConfig,
    pub retry: RetryConfig,
    pub task: TaskConfig,
    pub classifier: ClassifierConfig,
}

impl Config {
    /// Output path to use: the configured one, or one derived from the input
    pub fn resolved_output_path(&self) -> PathBuf {
        match &self.run.output_path {
            Some(path) => path.clone(),
            None => derive_output_path(&self.run.input_path, self.task.kind.output_suffix()),
        }
    }

    /// Sidecar checkpoint path for the given output path
    pub fn checkpoint_path(output: &Path) -> PathBuf {
        let mut name = output.as_os_str().to_os_string();
        name.push(".checkpoint.json");
        PathBuf::from(name)
    }

    /// Number of records to consider, given the input size and `limit`
    pub fn total_for(&self, available: usize) -> usize {
        match self.run.limit {
            0 => available,
            limit => available.min(limit),
        }
    }
}

/// Derives `<stem><suffix>.<ext>` next to the input (extension defaults to csv)
pub fn derive_output_path(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = input
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "csv".to_string());
    input.with_file_name(format!("{}{}.{}", stem, suffix, ext))
}

/// How written progress is tracked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProgressMode {
    /// Append to the output CSV; the resume point is its row count
    #[default]
    Stream,
    /// Keep results in a JSON checkpoint; write the CSV once at completion
    Checkpoint,
}

/// Run-level options
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RunConfig {
    /// Input table (CSV, UTF-8, header row)
    pub input_path: PathBuf,

    /// Output table; derived from the input path when absent
    pub output_path: Option<PathBuf>,

    /// Process only the first N records (0 = all)
    pub limit: usize,

    /// Continue from an existing output instead of starting over
    pub resume: bool,

    /// Bypass the model and fabricate deterministic placeholder answers
    pub dry_run: bool,

    /// Records written between durable flushes
    pub batch_size: usize,

    /// Log progress every N records
    pub progress_every: usize,

    pub mode: ProgressMode,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("sessoes_all_2024_2025.csv"),
            output_path: None,
            limit: 0,
            resume: false,
            dry_run: false,
            batch_size: 1,
            progress_every: 10,
            mode: ProgressMode::Stream,
        }
    }
}

/// Generative API options
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ApiConfig {
    pub model: String,

    /// Base URL of the generative language API
    pub endpoint: String,

    pub timeout_secs: u64,

    /// Pause after every model call (milliseconds)
    pub delay_ms: u64,

    /// Attach the search tool to news requests
    pub web_search: bool,

    pub temperature: f32,

    /// Whether JSON response mode may be combined with the search tool
    pub json_with_search: bool,

    /// Read from the environment, never from the file
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            endpoint: "https://generativelanguage.googleapis.com".to_string(),
            timeout_secs: 120,
            delay_ms: 0,
            web_search: true,
            temperature: 0.1,
            json_with_search: false,
            api_key: None,
        }
    }
}

/// What to do when a record's model call cannot be completed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Write the record with empty output columns and keep going
    Degrade,
    /// Stop the run; already written records stay on disk
    Abort,
}

/// Retry and failure handling options
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RetryConfig {
    /// Attempts per model call
    pub max_retries: u32,

    /// Exponential backoff base in seconds (`base^attempt + jitter`)
    pub backoff_base: f64,

    /// Fixed cool-down after a quota error
    pub rate_limit_cooldown_secs: u64,

    pub on_exhausted: FailurePolicy,

    pub on_fatal: FailurePolicy,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base: 2.0,
            rate_limit_cooldown_secs: 60,
            on_exhausted: FailurePolicy::Degrade,
            on_fatal: FailurePolicy::Abort,
        }
    }
}

/// Which enrichment to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskKind {
    /// News links for electoral-court session items
    #[default]
    News,
    /// Thesis, justification and outcome for general-repercussion rulings
    Theses,
}

impl TaskKind {
    pub fn output_suffix(&self) -> &'static str {
        match self {
            Self::News => "_noticias",
            Self::Theses => "_teses",
        }
    }
}

/// How general-news links are laid out in the output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NewsLayout {
    /// One cell, links joined with ", "
    #[default]
    Joined,
    /// First link in `noticia_geral`, the rest in `noticia_geral_1..=N`
    Spread,
}

/// Task options
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TaskConfig {
    pub kind: TaskKind,

    /// Record fields sent to the model, in this order
    pub context_fields: Vec<String>,

    /// Longer field values are cut to this many characters
    pub max_field_length: usize,

    pub news_layout: NewsLayout,

    /// Overflow columns reserved by the spread layout
    pub max_overflow_columns: usize,

    /// Column holding the ruling summary for the theses task
    pub ementa_column: String,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            kind: TaskKind::News,
            context_fields: [
                "tema",
                "punchline",
                "numero_processo",
                "classe_processo",
                "tribunal",
                "origem",
                "data_sessao",
                "relator",
                "partes",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            max_field_length: 300,
            news_layout: NewsLayout::Joined,
            max_overflow_columns: 50,
            ementa_column: "Ementa".to_string(),
        }
    }
}

/// Rule used for the general-news category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GeneralPolicy {
    /// Only hosts on the allow-list
    #[default]
    AllowList,
    /// Allow-list plus any host outside the authority suffix
    NonJudicial,
}

/// Domain taxonomy used to classify links
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ClassifierConfig {
    /// Primary authority domain (the domain itself and every subdomain)
    pub authority_domain: String,

    /// Label prefix of regional courts (`<prefix>-xx.<suffix>`)
    pub regional_prefix: String,

    /// Judicial suffix shared by the regional courts
    pub authority_suffix: String,

    /// News outlets accepted as general links
    pub general_domains: Vec<String>,

    pub general_policy: GeneralPolicy,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            authority_domain: "tse.jus.br".to_string(),
            regional_prefix: "tre".to_string(),
            authority_suffix: "jus.br".to_string(),
            general_domains: [
                "folha.uol.com.br",
                "estadao.com.br",
                "gazetadopovo.com.br",
                "cnnbrasil.com.br",
                "cnn.com",
                "conjur.com.br",
                "migalhas.com.br",
                "g1.globo.com",
                "oglobo.globo.com",
                "poder360.com.br",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            general_policy: GeneralPolicy::AllowList,
        }
    }
}
