//! Storage module for input and output tables
//!
//! This module handles all table I/O for a run, including:
//! - Reading the input table into ordered records
//! - Computing the output schema
//! - Finding where a previous run stopped (the progress cursor)
//! - Writing rows durably, either streamed to the output CSV or accumulated
//!   in a JSON checkpoint

mod checkpoint;
mod csv_sink;
mod cursor;
mod input;
mod schema;
mod traits;

pub use checkpoint::{Checkpoint, CheckpointSink};
pub use csv_sink::CsvAppendSink;
pub use cursor::{inspect_output, OutputInspection};
pub use input::{read_table, InputTable};
pub use schema::OutputSchema;
pub use traits::{RowSink, StorageError, StorageResult};

use crate::config::{Config, ProgressMode};
use crate::Result;
use indexmap::IndexMap;
use std::path::Path;

/// One row of the table, addressed by its position in the input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub index: usize,
    pub fields: IndexMap<String, String>,
}

impl Record {
    pub fn new(index: usize, fields: IndexMap<String, String>) -> Self {
        Self { index, fields }
    }

    /// Builds a record from parallel header and value slices
    pub fn from_pairs(index: usize, header: &[String], values: &[String]) -> Self {
        let fields = header
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), values.get(i).cloned().unwrap_or_default()))
            .collect();
        Self { index, fields }
    }

    /// Value of a column; missing columns read as empty
    pub fn get(&self, column: &str) -> &str {
        self.fields.get(column).map(String::as_str).unwrap_or("")
    }

    pub fn set(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(column.into(), value.into());
    }

    /// Writes output values into their columns, pairwise
    pub fn merge(&mut self, columns: &[String], values: Vec<String>) {
        for (column, value) in columns.iter().zip(values) {
            self.set(column.clone(), value);
        }
    }
}

/// Opens the row sink selected by the run mode
///
/// # Arguments
///
/// * `config` - The run configuration
/// * `schema` - The output schema
/// * `output` - Path of the output table
///
/// # Returns
///
/// * `Ok(Box<dyn RowSink>)` - A sink positioned at the first unprocessed record
/// * `Err(EnrichError)` - Header or checkpoint mismatch, or an I/O failure
pub fn open_sink(config: &Config, schema: &OutputSchema, output: &Path) -> Result<Box<dyn RowSink>> {
    match config.run.mode {
        ProgressMode::Stream => Ok(Box::new(CsvAppendSink::open(
            output,
            schema,
            config.run.resume,
            config.run.batch_size,
        )?)),
        ProgressMode::Checkpoint => {
            let fingerprint = crate::config::compute_file_hash(&config.run.input_path)?;
            Ok(Box::new(CheckpointSink::open(
                output,
                schema,
                &fingerprint,
                config.run.resume,
                config.run.batch_size,
            )?))
        }
    }
}
