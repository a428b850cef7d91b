use thiserror::Error;

/// Error raised while turning raw delimited text into trip records.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("line {line}: expected at least 19 columns, found {found}")]
    MissingColumns { line: u64, found: usize },
    #[error("line {line}: invalid {column} '{value}': {reason}")]
    InvalidField {
        line: u64,
        column: &'static str,
        value: String,
        reason: String,
    },
}
