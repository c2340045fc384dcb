//! Row processor - main enrichment orchestration logic
//!
//! This module contains the record loop that ties a run together:
//! - Reading the input table and computing the output schema
//! - Opening the row sink at the first unprocessed record
//! - Resolving each record (blank, precomputed, cached or queried)
//! - Applying the failure policy when a model call cannot be completed
//! - Logging progress and the completion summary

use crate::client::{CallError, GenerativeClient, RetryCaller, RetryPolicy};
use crate::config::{Config, FailurePolicy};
use crate::enrich::{build_enricher, Enricher};
use crate::output::RunStatistics;
use crate::state::RowState;
use crate::storage::{open_sink, read_table, OutputSchema, Record};
use crate::{ConfigError, EnrichError};
use std::collections::HashMap;
use std::time::Duration;

/// Main row processor structure
pub struct Processor<'a> {
    config: &'a Config,
    client: &'a dyn GenerativeClient,
    enricher: Box<dyn Enricher>,
    policy: RetryPolicy,
    /// Successful answers keyed by the exact context string
    cache: HashMap<String, Vec<String>>,
}

impl<'a> Processor<'a> {
    /// Creates a new processor
    ///
    /// # Arguments
    ///
    /// * `config` - The validated run configuration
    /// * `client` - The model client every call goes through
    ///
    /// # Returns
    ///
    /// * `Ok(Processor)` - Ready to run
    /// * `Err(ConfigError)` - Missing input file or invalid classifier rules
    pub fn new(config: &'a Config, client: &'a dyn GenerativeClient) -> Result<Self, ConfigError> {
        if !config.run.input_path.is_file() {
            return Err(ConfigError::MissingInput(config.run.input_path.clone()));
        }

        Ok(Self {
            config,
            client,
            enricher: build_enricher(config)?,
            policy: RetryPolicy::from_config(&config.retry),
            cache: HashMap::new(),
        })
    }

    /// Runs the record loop
    ///
    /// Records are handled strictly in input order from the sink's resume
    /// index up to the configured total. Every resolved record is handed to
    /// the sink before the next one starts.
    pub async fn run(&mut self) -> Result<RunStatistics, EnrichError> {
        let config = self.config;
        let table = read_table(&config.run.input_path)?;
        tracing::info!(
            "Loaded {} records ({} columns) from {}",
            table.len(),
            table.header.len(),
            config.run.input_path.display()
        );

        let total = config.total_for(table.len());
        if table.is_empty() {
            tracing::warn!("Input table has no records; nothing to do");
        }

        let schema = OutputSchema::new(&table.header, self.enricher.output_columns());
        let output = config.resolved_output_path();
        let mut sink = open_sink(config, &schema, &output)?;

        let start = sink.resume_index().min(total);
        let mut stats = RunStatistics::new(total, start);

        if start > 0 {
            tracing::info!("Resuming: {} records already in {}", start, output.display());
        }
        if start >= total {
            tracing::info!("All {} records already processed", total);
        } else {
            tracing::info!(
                "Processing records {}..{} into {}",
                start,
                total,
                output.display()
            );
        }

        let delay = Duration::from_millis(config.api.delay_ms);
        let progress_every = config.run.progress_every.max(1);
        let started = std::time::Instant::now();
        let mut handled = 0;

        for mut record in table.records.into_iter().take(total).skip(start) {
            let index = record.index;

            let (state, values) = match self.resolve(&record).await {
                Ok(resolved) => resolved,
                Err(error) => {
                    tracing::error!("Record {}: {}; stopping the run", index, error);
                    sink.flush()?;
                    stats.aborted_at = Some(index);
                    stats.finish();
                    stats.log_summary();
                    return Err(EnrichError::Call(error));
                }
            };

            debug_assert!(state.can_transition_to(RowState::Written));
            record.merge(schema.output_columns(), values);
            sink.write_row(&schema.row_for(&record))?;
            stats.record(state);
            tracing::debug!("Record {}: {} -> {}", index, state, RowState::Written);

            handled += 1;
            if handled % progress_every == 0 || index + 1 == total {
                let rate = handled as f64 / started.elapsed().as_secs_f64().max(f64::EPSILON);
                tracing::info!(
                    "Progress: {}/{} records, {} api calls, {} cache hits, {:.2} records/sec",
                    index + 1,
                    total,
                    stats.api_calls(),
                    stats.cache_hits(),
                    rate
                );
            }

            if state.made_api_call() && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        sink.finish()?;
        stats.finish();
        stats.log_summary();

        Ok(stats)
    }

    /// Decides a record's output values and the state that produced them
    ///
    /// Returns `Err` only when a call failed and the configured policy for
    /// that failure is to abort.
    async fn resolve(&mut self, record: &Record) -> Result<(RowState, Vec<String>), CallError> {
        let context = self.enricher.context(record);

        if context.trim().is_empty() {
            return Ok((RowState::NoContext, self.enricher.empty_values()));
        }

        if let Some(values) = self.enricher.precomputed(&context) {
            return Ok((RowState::Precomputed, values));
        }

        if let Some(values) = self.cache.get(&context) {
            return Ok((RowState::Cached, values.clone()));
        }

        let caller = RetryCaller::new(self.client, self.policy.clone());
        let result = self.enricher.enrich(&caller, &context).await;

        match result {
            Ok(values) => {
                self.cache.insert(context, values.clone());
                Ok((RowState::Queried, values))
            }
            Err(error) => {
                let policy = if error.is_fatal() {
                    self.config.retry.on_fatal
                } else {
                    self.config.retry.on_exhausted
                };

                match policy {
                    FailurePolicy::Abort => Err(error),
                    FailurePolicy::Degrade => {
                        tracing::error!(
                            "Record {}: {}; output columns left empty",
                            record.index,
                            error
                        );
                        Ok((RowState::Degraded, self.enricher.empty_values()))
                    }
                }
            }
        }
    }
}

/// Builds a processor for `config` and runs it to completion
pub async fn run_table(
    config: &Config,
    client: &dyn GenerativeClient,
) -> Result<RunStatistics, EnrichError> {
    let mut processor = Processor::new(config, client)?;
    processor.run().await
}
