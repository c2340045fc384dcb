//! Processor module for enrichment runs
//!
//! This module contains the record loop, including:
//! - Resuming from the first record not yet on disk
//! - Skipping blank records and reusing answers for repeated contexts
//! - Calling the model through the retry wrapper
//! - Degrading or aborting on failed calls, per configuration

mod coordinator;

pub use coordinator::{run_table, Processor};

use crate::client::GenerativeClient;
use crate::config::Config;
use crate::output::RunStatistics;
use crate::EnrichError;

/// Runs a complete enrichment of the configured input table
///
/// This is the main entry point for a run. It will:
/// 1. Read the input table and compute the output schema
/// 2. Open the output (or checkpoint) and find where a previous run stopped
/// 3. Resolve every remaining record in input order
/// 4. Persist each row before moving on
/// 5. Log the completion summary
///
/// # Arguments
///
/// * `config` - The validated run configuration
/// * `client` - The model client
///
/// # Returns
///
/// * `Ok(RunStatistics)` - Run completed
/// * `Err(EnrichError)` - Configuration, storage, or an aborting call failure
pub async fn process_table(
    config: &Config,
    client: &dyn GenerativeClient,
) -> Result<RunStatistics, EnrichError> {
    run_table(config, client).await
}
