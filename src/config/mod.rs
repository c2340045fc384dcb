//! Configuration module
//!
//! This module handles loading, parsing, and validating the optional TOML
//! configuration file. Every key has a default, so an absent file is the
//! same as an empty one.
//!
//! # Example
//!
//! ```no_run
//! use sessoes_enricher::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("enricher.toml")).unwrap();
//! println!("Retries per call: {}", config.retry.max_retries);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    derive_output_path, ApiConfig, ClassifierConfig, Config, FailurePolicy, GeneralPolicy,
    NewsLayout, ProgressMode, RetryConfig, RunConfig, TaskConfig, TaskKind,
};

// Re-export parser functions
pub use parser::{compute_file_hash, load_config, load_config_with_hash};
pub use validation::{validate, validate_credentials};
