//! Row sink trait and storage error types

use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Checkpoint serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Destination for processed rows
///
/// A sink is opened once per run, owns the output exclusively, and knows
/// how many records a previous run already persisted. Rows arrive strictly
/// in input order.
pub trait RowSink {
    /// Index of the first record that still needs processing
    fn resume_index(&self) -> usize;

    /// Accepts the next row; may flush when a batch boundary is crossed
    fn write_row(&mut self, row: &[String]) -> StorageResult<()>;

    /// Makes every accepted row durable
    fn flush(&mut self) -> StorageResult<()>;

    /// Completes the run
    fn finish(&mut self) -> StorageResult<()>;

    /// Rows accepted during this run
    fn rows_written(&self) -> usize;
}
