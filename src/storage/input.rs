use crate::storage::{Record, StorageResult};
use std::path::Path;

const BOM: char = '\u{feff}';

/// The input table, loaded in full
#[derive(Debug, Clone, Default)]
pub struct InputTable {
    pub header: Vec<String>,
    pub records: Vec<Record>,
}

impl InputTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Reads a CSV table with a header row
///
/// Fields may contain embedded newlines. Short rows are padded with empty
/// values; a UTF-8 byte-order mark on the first header cell is dropped.
pub fn read_table(path: &Path) -> StorageResult<InputTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let header: Vec<String> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, name)| {
            if i == 0 {
                name.trim_start_matches(BOM).to_string()
            } else {
                name.to_string()
            }
        })
        .collect();

    let mut records = Vec::new();
    for (index, row) in reader.records().enumerate() {
        let row = row?;
        let values: Vec<String> = row.iter().map(str::to_string).collect();
        if values.len() > header.len() {
            tracing::debug!(
                "Row {} has {} fields, header has {}; extra fields ignored",
                index,
                values.len(),
                header.len()
            );
        }
        records.push(Record::from_pairs(index, &header, &values));
    }

    tracing::debug!(
        "Read {} records with {} columns from {}",
        records.len(),
        header.len(),
        path.display()
    );

    Ok(InputTable { header, records })
}
