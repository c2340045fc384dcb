use crate::storage::Record;

const ELLIPSIS: &str = "...";

/// Builds the context block sent to the model for one record
///
/// Fields are read in the given order. Blank or missing values are skipped;
/// values longer than `max_len` characters are cut, right-trimmed, and
/// marked with an ellipsis. Surviving `field: value` lines are joined with
/// newlines. An empty result means the record gets no model call.
///
/// # Examples
///
/// ```
/// use indexmap::IndexMap;
/// use sessoes_enricher::enrich::build_context;
/// use sessoes_enricher::storage::Record;
///
/// let mut fields = IndexMap::new();
/// fields.insert("tema".to_string(), "Caso X".to_string());
/// fields.insert("relator".to_string(), "  ".to_string());
/// let record = Record::new(0, fields);
///
/// let names = vec!["tema".to_string(), "relator".to_string()];
/// assert_eq!(build_context(&record, &names, 300), "tema: Caso X");
/// ```
pub fn build_context(record: &Record, fields: &[String], max_len: usize) -> String {
    fields
        .iter()
        .filter_map(|field| {
            let value = record.get(field).trim();
            if value.is_empty() {
                None
            } else {
                Some(format!("{}: {}", field, truncate(value, max_len)))
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn truncate(value: &str, max_len: usize) -> String {
    if value.chars().count() <= max_len {
        return value.to_string();
    }
    let cut: String = value.chars().take(max_len).collect();
    format!("{}{}", cut.trim_end(), ELLIPSIS)
}
