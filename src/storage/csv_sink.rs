use crate::storage::{inspect_output, OutputSchema, RowSink, StorageError, StorageResult};
use crate::ConfigError;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Streams rows to the output CSV, appending after any rows a previous run
/// left behind
///
/// The resume point is the number of complete rows already in the file.
/// Rows are flushed and synced to disk every `batch_size` rows.
pub struct CsvAppendSink {
    path: PathBuf,
    writer: csv::Writer<File>,
    resume_index: usize,
    batch_size: usize,
    pending: usize,
    written: usize,
}

impl CsvAppendSink {
    /// Opens the output for a run
    ///
    /// With `resume` and an existing output, its header must equal the
    /// schema exactly; a torn final row is cut off and will be reprocessed.
    /// Without `resume` the output is recreated.
    pub fn open(
        path: &Path,
        schema: &OutputSchema,
        resume: bool,
        batch_size: usize,
    ) -> crate::Result<Self> {
        let existing = if resume { inspect_output(path)? } else { None };

        let (file, resume_index, needs_header) = match existing {
            Some(inspection) if inspection.header.is_some() => {
                let found = inspection.header.unwrap_or_default();
                if found != schema.columns() {
                    return Err(ConfigError::HeaderMismatch {
                        path: path.to_path_buf(),
                        expected: schema.columns().to_vec(),
                        found,
                    }
                    .into());
                }

                let file = OpenOptions::new().write(true).open(path)?;
                if inspection.torn {
                    tracing::warn!(
                        "Discarding a partially written row at the end of {}",
                        path.display()
                    );
                    file.set_len(inspection.valid_len)?;
                    file.sync_data()?;
                }
                drop(file);

                let file = OpenOptions::new().append(true).open(path)?;
                tracing::info!(
                    "Resuming {}: {} rows already written",
                    path.display(),
                    inspection.rows
                );
                (file, inspection.rows, false)
            }
            _ => {
                if !resume && path.exists() {
                    tracing::warn!("Overwriting existing output {}", path.display());
                }
                (File::create(path)?, 0, true)
            }
        };

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if needs_header {
            writer
                .write_record(schema.columns())
                .map_err(StorageError::from)?;
            writer.flush()?;
            writer.get_ref().sync_data()?;
        }

        Ok(Self {
            path: path.to_path_buf(),
            writer,
            resume_index,
            batch_size: batch_size.max(1),
            pending: 0,
            written: 0,
        })
    }
}

impl RowSink for CsvAppendSink {
    fn resume_index(&self) -> usize {
        self.resume_index
    }

    fn write_row(&mut self, row: &[String]) -> StorageResult<()> {
        self.writer.write_record(row)?;
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
        self.writer.flush()?;
        self.writer.get_ref().sync_data()?;
        tracing::trace!("Flushed {} rows to {}", self.pending, self.path.display());
        self.pending = 0;
        Ok(())
    }

    fn finish(&mut self) -> StorageResult<()> {
        self.flush()
    }

    fn rows_written(&self) -> usize {
        self.written
    }
}
