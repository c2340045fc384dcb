//! Run statistics
//!
//! Counts what happened to each record during a run and logs the completion
//! summary.

use crate::state::RowState;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Run statistics summary
#[derive(Debug, Clone)]
pub struct RunStatistics {
    /// Records in scope for this run (input size, bounded by the limit)
    pub total_records: usize,

    /// Final state of each record in scope; records already on disk when
    /// the run started count as skipped
    pub rows_by_state: HashMap<RowState, usize>,

    /// Index of the record whose failure stopped the run
    pub aborted_at: Option<usize>,

    pub started_at: DateTime<Utc>,

    pub finished_at: Option<DateTime<Utc>>,
}

impl RunStatistics {
    pub fn new(total_records: usize, resumed_from: usize) -> Self {
        let mut rows_by_state = HashMap::new();
        if resumed_from > 0 {
            rows_by_state.insert(RowState::Skipped, resumed_from);
        }

        Self {
            total_records,
            rows_by_state,
            aborted_at: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Counts a record's resolution
    pub fn record(&mut self, state: RowState) {
        *self.rows_by_state.entry(state).or_insert(0) += 1;
    }

    pub fn count(&self, state: RowState) -> usize {
        self.rows_by_state.get(&state).copied().unwrap_or(0)
    }

    /// Records already on disk when the run started
    pub fn resumed_from(&self) -> usize {
        self.count(RowState::Skipped)
    }

    /// Records that reached the model
    pub fn api_calls(&self) -> usize {
        self.rows_by_state
            .iter()
            .filter(|(state, _)| state.made_api_call())
            .map(|(_, count)| count)
            .sum()
    }

    pub fn cache_hits(&self) -> usize {
        self.count(RowState::Cached)
    }

    pub fn degraded(&self) -> usize {
        self.count(RowState::Degraded)
    }

    /// Records handled during this run
    pub fn processed(&self) -> usize {
        self.rows_by_state
            .iter()
            .filter(|(state, _)| state.is_resolved())
            .map(|(_, count)| count)
            .sum()
    }

    pub fn is_complete(&self) -> bool {
        self.aborted_at.is_none() && self.resumed_from() + self.processed() >= self.total_records
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Logs the summary at info level
    pub fn log_summary(&self) {
        let elapsed = self
            .finished_at
            .unwrap_or_else(Utc::now)
            .signed_duration_since(self.started_at);

        tracing::info!(
            "Run finished in {}s: {} of {} records written this run ({} from a previous run)",
            elapsed.num_seconds(),
            self.processed(),
            self.total_records,
            self.resumed_from()
        );

        for state in RowState::all_states() {
            let count = self.count(state);
            if state.is_resolved() && count > 0 {
                tracing::info!("  {}: {}", state, count);
            }
        }

        tracing::info!(
            "  api calls: {}, cache hits: {}, degraded: {}",
            self.api_calls(),
            self.cache_hits(),
            self.degraded()
        );

        if let Some(index) = self.aborted_at {
            tracing::error!("  run aborted at record {}", index);
        }
    }
}
