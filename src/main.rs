//! Sessoes-Enricher main entry point
//!
//! This is the command-line interface for the court session enricher.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use sessoes_enricher::client::{DryRunClient, GeminiClient};
use sessoes_enricher::config::{
    load_config_with_hash, validate, validate_credentials, Config, ProgressMode, TaskKind,
};
use sessoes_enricher::{process_table, GenerativeClient};
use tracing_subscriber::EnvFilter;

/// Environment variables searched for the API key, in order
const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "GOOGLE_API_KEY"];

/// Sessoes-Enricher: resumable AI enrichment for court session tables
///
/// Reads a CSV of court session records, asks a generative model about each
/// one, and appends news links (or ruling theses) as new columns. An
/// interrupted run continues where it stopped with --resume.
#[derive(Parser, Debug)]
#[command(name = "sessoes-enricher")]
#[command(version = "1.0.0")]
#[command(about = "Resumable AI enrichment for court session tables", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (optional)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Input CSV table
    #[arg(short, long, value_name = "CSV")]
    input: Option<PathBuf>,

    /// Output CSV table (default: input name plus a task suffix)
    #[arg(short, long, value_name = "CSV")]
    output: Option<PathBuf>,

    /// Model identifier
    #[arg(short, long)]
    model: Option<String>,

    /// Process only the first N records (0 = all)
    #[arg(short, long)]
    limit: Option<usize>,

    /// Pause after every model call, in milliseconds
    #[arg(long, value_name = "MS")]
    delay: Option<u64>,

    /// Attempts per model call
    #[arg(long)]
    max_retries: Option<u32>,

    /// Continue from an existing output instead of starting over
    #[arg(long)]
    resume: bool,

    /// Records written between durable flushes
    #[arg(long)]
    batch_size: Option<usize>,

    /// Enrichment task
    #[arg(long, value_enum)]
    task: Option<TaskArg>,

    /// Progress tracking mode
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Bypass the model and write deterministic placeholder answers
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TaskArg {
    News,
    Theses,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Stream,
    Checkpoint,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {:#}", e);
            return Err(e.into());
        }
    };

    handle_run(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sessoes_enricher=info,warn"),
            1 => EnvFilter::new("sessoes_enricher=debug,info"),
            2 => EnvFilter::new("sessoes_enricher=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Assembles the run configuration: defaults, then the file, then flags
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("loading {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", &hash[..12]);
            config
        }
        None => Config::default(),
    };

    apply_overrides(&mut config, cli);
    validate(&config)?;

    config.api.api_key = API_KEY_VARS
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|key| !key.trim().is_empty());
    validate_credentials(&config)?;

    Ok(config)
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(input) = &cli.input {
        config.run.input_path = input.clone();
    }
    if let Some(output) = &cli.output {
        config.run.output_path = Some(output.clone());
    }
    if let Some(model) = &cli.model {
        config.api.model = model.clone();
    }
    if let Some(limit) = cli.limit {
        config.run.limit = limit;
    }
    if let Some(delay) = cli.delay {
        config.api.delay_ms = delay;
    }
    if let Some(max_retries) = cli.max_retries {
        config.retry.max_retries = max_retries;
    }
    if let Some(batch_size) = cli.batch_size {
        config.run.batch_size = batch_size;
    }
    if let Some(task) = cli.task {
        config.task.kind = match task {
            TaskArg::News => TaskKind::News,
            TaskArg::Theses => TaskKind::Theses,
        };
    }
    if let Some(mode) = cli.mode {
        config.run.mode = match mode {
            ModeArg::Stream => ProgressMode::Stream,
            ModeArg::Checkpoint => ProgressMode::Checkpoint,
        };
    }
    config.run.resume |= cli.resume;
    config.run.dry_run |= cli.dry_run;
}

/// Handles the enrichment run
async fn handle_run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let client: Box<dyn GenerativeClient> = if config.run.dry_run {
        tracing::info!("Dry run: the model is bypassed and answers are placeholders");
        Box::new(DryRunClient::new(config.classifier.authority_domain.clone()))
    } else {
        let key = config.api.api_key.clone().unwrap_or_default();
        Box::new(GeminiClient::new(&config.api, key)?)
    };

    tracing::info!(
        "Task: {:?}, model: {}, mode: {:?}, resume: {}",
        config.task.kind,
        config.api.model,
        config.run.mode,
        config.run.resume
    );

    match process_table(&config, client.as_ref()).await {
        Ok(stats) => {
            if stats.is_complete() {
                tracing::info!(
                    "Enrichment completed: {}",
                    config.resolved_output_path().display()
                );
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Enrichment failed: {}", e);
            Err(e.into())
        }
    }
}
