use crate::storage::Record;

/// Column layout of the output table
///
/// The input header followed by the task's output columns. Output columns
/// already present in the input are not repeated; they are overwritten in
/// place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSchema {
    columns: Vec<String>,
    output_columns: Vec<String>,
}

impl OutputSchema {
    pub fn new(input_header: &[String], output_columns: &[String]) -> Self {
        let mut columns = input_header.to_vec();
        for column in output_columns {
            if !columns.contains(column) {
                columns.push(column.clone());
            }
        }

        Self {
            columns,
            output_columns: output_columns.to_vec(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn output_columns(&self) -> &[String] {
        &self.output_columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Values of a record in column order
    pub fn row_for(&self, record: &Record) -> Vec<String> {
        self.columns
            .iter()
            .map(|column| record.get(column).to_string())
            .collect()
    }
}
