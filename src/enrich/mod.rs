//! Enrichment tasks
//!
//! An [`Enricher`] knows which output columns a task fills, how to derive a
//! record's context block, and how to turn one context into output values
//! through the model. Two tasks exist:
//!
//! - `news`: links about electoral-court session items, classified by domain
//! - `theses`: thesis, justification and outcome for general-repercussion rulings

mod context;
mod news;
pub mod prompts;
mod theses;

pub use context::build_context;
pub use news::{NewsEnricher, NEWS_COLUMNS};
pub use theses::{ThesisEnricher, THESIS_COLUMNS};

use crate::client::{CallError, RetryCaller};
use crate::config::{Config, TaskKind};
use crate::storage::Record;
use crate::ConfigError;
use async_trait::async_trait;

/// One enrichment task
#[async_trait]
pub trait Enricher: Send + Sync {
    /// Output columns, in the order values are returned
    fn output_columns(&self) -> &[String];

    /// Context block for a record; empty means no model call
    fn context(&self, record: &Record) -> String;

    /// Output values decided from the context alone, if any
    fn precomputed(&self, _context: &str) -> Option<Vec<String>> {
        None
    }

    /// Output values for a non-empty context
    async fn enrich(&self, caller: &RetryCaller<'_>, context: &str)
        -> Result<Vec<String>, CallError>;

    /// Values written when no answer is available
    fn empty_values(&self) -> Vec<String> {
        vec![String::new(); self.output_columns().len()]
    }
}

/// Builds the enricher selected by the configuration
pub fn build_enricher(config: &Config) -> Result<Box<dyn Enricher>, ConfigError> {
    match config.task.kind {
        TaskKind::News => Ok(Box::new(NewsEnricher::new(config)?)),
        TaskKind::Theses => Ok(Box::new(ThesisEnricher::new(config))),
    }
}
