//! Progress cursor
//!
//! Reads an existing output table to find out how many records are already
//! durably on disk. A record counts only when it is complete: a final row
//! without a line terminator, or with fewer fields than the header, is a
//! torn write from an interrupted run.

use crate::storage::StorageResult;
use csv::ByteRecord;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// What was found in an existing output table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputInspection {
    /// Header row, if a complete one is present
    pub header: Option<Vec<String>>,
    /// Complete data rows
    pub rows: usize,
    /// Byte length covering the header and complete rows
    pub valid_len: u64,
    /// Whether bytes past `valid_len` belong to a partial row
    pub torn: bool,
}

impl OutputInspection {
    fn empty() -> Self {
        Self {
            header: None,
            rows: 0,
            valid_len: 0,
            torn: false,
        }
    }
}

/// Inspects an output table
///
/// # Returns
///
/// * `Ok(None)` - The file does not exist
/// * `Ok(Some(OutputInspection))` - Header, complete row count, and torn-tail information
/// * `Err(StorageError)` - The file exists but could not be read
pub fn inspect_output(path: &Path) -> StorageResult<Option<OutputInspection>> {
    if !path.exists() {
        return Ok(None);
    }

    let file_len = std::fs::metadata(path)?.len();
    if file_len == 0 {
        return Ok(Some(OutputInspection::empty()));
    }
    let terminated = ends_with_newline(path)?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut record = ByteRecord::new();
    let mut header: Option<Vec<String>> = None;
    let mut rows = 0;
    // (start offset, field count) of the last data row
    let mut last_row: Option<(u64, usize)> = None;

    loop {
        let start = reader.position().byte();
        if !reader.read_byte_record(&mut record)? {
            break;
        }

        match &header {
            None => header = Some(decode_header(&record)),
            Some(_) => {
                rows += 1;
                last_row = Some((start, record.len()));
            }
        }
    }

    let Some(header) = header else {
        return Ok(Some(OutputInspection::empty()));
    };

    let Some((last_start, last_len)) = last_row else {
        // Only a header: torn if it was never terminated
        return Ok(Some(if terminated {
            OutputInspection {
                header: Some(header),
                rows: 0,
                valid_len: file_len,
                torn: false,
            }
        } else {
            OutputInspection {
                torn: true,
                ..OutputInspection::empty()
            }
        }));
    };

    if !terminated || last_len < header.len() {
        return Ok(Some(OutputInspection {
            header: Some(header),
            rows: rows - 1,
            valid_len: last_start,
            torn: true,
        }));
    }

    Ok(Some(OutputInspection {
        header: Some(header),
        rows,
        valid_len: file_len,
        torn: false,
    }))
}

fn ends_with_newline(path: &Path) -> StorageResult<bool> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

fn decode_header(record: &ByteRecord) -> Vec<String> {
    record
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let name = String::from_utf8_lossy(field);
            if i == 0 {
                name.trim_start_matches('\u{feff}').to_string()
            } else {
                name.into_owned()
            }
        })
        .collect()
}
