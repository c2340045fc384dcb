//! Sessoes-Enricher: resumable AI enrichment for court session tables
//!
//! This crate reads a table of Brazilian electoral-court (or supreme-court)
//! session records, asks a generative model about each record, classifies
//! the structured answer, and appends the result to an output table that can
//! be resumed after a crash without reprocessing or corrupting written rows.

pub mod client;
pub mod config;
pub mod enrich;
pub mod extract;
pub mod output;
pub mod processor;
pub mod state;
pub mod storage;
pub mod url;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for enrichment runs
#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Model call failed: {0}")]
    Call(#[from] client::CallError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
///
/// Every variant is raised before the first record is processed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),

    #[error("No API credential found (set GEMINI_API_KEY or GOOGLE_API_KEY, or use --dry-run)")]
    MissingCredential,

    #[error("Input file not found: {}", .0.display())]
    MissingInput(PathBuf),

    #[error(
        "Header of existing output {} does not match the expected header \
         (expected {expected:?}, found {found:?}); use another --output or remove the file",
        path.display()
    )]
    HeaderMismatch {
        path: PathBuf,
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("Checkpoint {} does not belong to this run: {reason}", path.display())]
    CheckpointMismatch { path: PathBuf, reason: String },
}

/// Result type alias for enrichment operations
pub type Result<T> = std::result::Result<T, EnrichError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use client::{CallError, ClientError, GenerativeClient};
pub use config::Config;
pub use extract::{parse_response, ModelResponse};
pub use processor::process_table;
pub use state::RowState;
pub use url::{classify_url, normalize_url, Category, ClassifiedUrls, DomainRules};
