//! CSV parse errors.

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CsvError {
    #[error("csv parse failed: unbalanced quotes")]
    UnbalancedQuotes,

    #[error("csv is empty or has no header row")]
    MissingHeader,

    #[error("csv has no password column")]
    MissingPasswordColumn,
}
