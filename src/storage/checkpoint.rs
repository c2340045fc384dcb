//! Explicit checkpoint sink
//!
//! Results accumulate in a JSON sidecar (`<output>.checkpoint.json`) that is
//! rewritten atomically after every batch. The output CSV is only written
//! once, when the run completes, and the sidecar is then removed. An output
//! without a sidecar is therefore a finished run.

use crate::config::Config;
use crate::storage::{inspect_output, OutputSchema, RowSink, StorageError, StorageResult};
use crate::ConfigError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Persisted progress of a checkpointed run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// SHA-256 of the input table the results belong to
    pub input_fingerprint: String,
    pub header: Vec<String>,
    /// Index of the last record whose row is in `accumulated_results`
    pub last_processed_index: Option<usize>,
    /// Output rows, in input order
    pub accumulated_results: Vec<Vec<String>>,
    pub updated_at: DateTime<Utc>,
}

impl Checkpoint {
    pub fn new(input_fingerprint: &str, header: &[String]) -> Self {
        Self {
            input_fingerprint: input_fingerprint.to_string(),
            header: header.to_vec(),
            last_processed_index: None,
            accumulated_results: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    pub fn load(path: &Path) -> StorageResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Writes the checkpoint to a temporary file and renames it into place
    pub fn save(&self, path: &Path) -> StorageResult<()> {
        let tmp = temp_path(path);
        {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            serde_json::to_writer(&mut writer, self)?;
            writer.flush()?;
            writer.get_ref().sync_data()?;
        }
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}

/// Keeps results in a [`Checkpoint`] and writes the CSV at completion
pub struct CheckpointSink {
    output: PathBuf,
    checkpoint_path: PathBuf,
    checkpoint: Checkpoint,
    resume_index: usize,
    batch_size: usize,
    pending: usize,
    written: usize,
    /// False only when carrying over an already completed output
    output_stale: bool,
}

impl CheckpointSink {
    /// Opens the sink for a run
    ///
    /// With `resume`:
    /// - an existing checkpoint is loaded; its header and input fingerprint
    ///   must match this run
    /// - otherwise an existing output is a finished run; its complete rows
    ///   are carried over and only records past them are processed. A torn
    ///   final row is dropped and its record processed again
    ///
    /// Without `resume`, a leftover checkpoint is discarded.
    pub fn open(
        output: &Path,
        schema: &OutputSchema,
        input_fingerprint: &str,
        resume: bool,
        batch_size: usize,
    ) -> crate::Result<Self> {
        let checkpoint_path = Config::checkpoint_path(output);
        let header = schema.columns();

        let mut output_stale = true;
        let checkpoint = if resume && checkpoint_path.exists() {
            let checkpoint = Checkpoint::load(&checkpoint_path)?;
            if checkpoint.header != header {
                return Err(ConfigError::CheckpointMismatch {
                    path: checkpoint_path,
                    reason: format!(
                        "header differs (expected {:?}, found {:?})",
                        header, checkpoint.header
                    ),
                }
                .into());
            }
            if checkpoint.input_fingerprint != input_fingerprint {
                return Err(ConfigError::CheckpointMismatch {
                    path: checkpoint_path,
                    reason: "input table changed since the checkpoint was written".to_string(),
                }
                .into());
            }
            tracing::info!(
                "Resuming from checkpoint {}: {} records done (saved {})",
                checkpoint_path.display(),
                checkpoint.accumulated_results.len(),
                checkpoint.updated_at.to_rfc3339()
            );
            checkpoint
        } else if resume && output.exists() {
            let mut checkpoint = Checkpoint::new(input_fingerprint, header);
            let (rows, torn) = read_completed_output(output, header)?;
            checkpoint.accumulated_results = rows;
            checkpoint.last_processed_index = checkpoint.accumulated_results.len().checked_sub(1);
            output_stale = torn;
            tracing::info!(
                "Output {} is complete with {} rows; continuing after them",
                output.display(),
                checkpoint.accumulated_results.len()
            );
            checkpoint
        } else {
            if checkpoint_path.exists() {
                tracing::warn!(
                    "Discarding stale checkpoint {}",
                    checkpoint_path.display()
                );
                std::fs::remove_file(&checkpoint_path)?;
            }
            Checkpoint::new(input_fingerprint, header)
        };

        Ok(Self {
            output: output.to_path_buf(),
            checkpoint_path,
            resume_index: checkpoint.accumulated_results.len(),
            checkpoint,
            batch_size: batch_size.max(1),
            pending: 0,
            written: 0,
            output_stale,
        })
    }

    pub fn checkpoint(&self) -> &Checkpoint {
        &self.checkpoint
    }

    pub fn checkpoint_path(&self) -> &Path {
        &self.checkpoint_path
    }

    fn write_output(&self) -> StorageResult<()> {
        let tmp = temp_path(&self.output);
        {
            let mut writer = csv::Writer::from_path(&tmp)?;
            writer.write_record(&self.checkpoint.header)?;
            for row in &self.checkpoint.accumulated_results {
                writer.write_record(row)?;
            }
            writer.flush()?;
            writer.get_ref().sync_data()?;
        }
        std::fs::rename(&tmp, &self.output)?;
        Ok(())
    }
}

impl RowSink for CheckpointSink {
    fn resume_index(&self) -> usize {
        self.resume_index
    }

    fn write_row(&mut self, row: &[String]) -> StorageResult<()> {
        self.checkpoint.accumulated_results.push(row.to_vec());
        self.checkpoint.last_processed_index =
            self.checkpoint.accumulated_results.len().checked_sub(1);
        self.pending += 1;
        self.written += 1;

        if self.pending >= self.batch_size {
            self.flush()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> StorageResult<()> {
        if self.pending == 0 {
            return Ok(());
        }
        self.checkpoint.updated_at = Utc::now();
        self.checkpoint.save(&self.checkpoint_path)?;
        tracing::trace!(
            "Checkpoint saved at record {:?}",
            self.checkpoint.last_processed_index
        );
        self.pending = 0;
        Ok(())
    }

    fn finish(&mut self) -> StorageResult<()> {
        if self.output_stale || self.written > 0 {
            self.write_output()?;
            tracing::debug!(
                "Wrote {} rows to {}",
                self.checkpoint.accumulated_results.len(),
                self.output.display()
            );
        }

        if self.checkpoint_path.exists() {
            std::fs::remove_file(&self.checkpoint_path)?;
        }
        self.pending = 0;
        Ok(())
    }

    fn rows_written(&self) -> usize {
        self.written
    }
}

/// Complete rows of an existing output, after checking its header
///
/// The flag is true when a torn final row was left out.
fn read_completed_output(
    output: &Path,
    header: &[String],
) -> crate::Result<(Vec<Vec<String>>, bool)> {
    let inspection = inspect_output(output)?;
    let (found, complete, torn) = match inspection {
        Some(inspection) => (
            inspection.header.unwrap_or_default(),
            inspection.rows,
            inspection.torn,
        ),
        None => (Vec::new(), 0, false),
    };
    if found != header {
        return Err(ConfigError::HeaderMismatch {
            path: output.to_path_buf(),
            expected: header.to_vec(),
            found,
        }
        .into());
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(output)
        .map_err(StorageError::from)?;

    let mut rows = Vec::with_capacity(complete);
    for row in reader.records().take(complete) {
        let row = row.map_err(StorageError::from)?;
        rows.push(row.iter().map(str::to_string).collect());
    }

    if torn {
        tracing::warn!(
            "Dropping a partial row after record {} in {}",
            complete,
            output.display()
        );
    }
    Ok((rows, torn))
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}
