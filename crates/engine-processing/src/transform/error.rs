use thiserror::Error;

/// Batch-fatal normalization failures. Per-row problems that only exclude
/// the row are reported as `RejectedRow`s instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("Required column '{0}' is missing from the source header")]
    MissingColumn(String),

    #[error("Source headers normalize to the same column '{0}'")]
    DuplicateColumn(String),

    #[error("Source header at position {0} is empty")]
    EmptyColumnName(usize),

    #[error("Unparseable date {} in column '{column}' at line {line}", describe(.value))]
    DateParse {
        line: u64,
        column: String,
        value: Option<String>,
    },

    #[error("Record at line {0} is missing a coerced field")]
    IncompleteRecord(u64),
}

fn describe(value: &Option<String>) -> String {
    match value {
        Some(v) => format!("'{v}'"),
        None => "(missing)".to_string(),
    }
}
