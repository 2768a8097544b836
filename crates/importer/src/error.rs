//! Import worker errors.

use {toolbox_csv::CsvError, toolbox_store::StoreError};

/// Terminal failure of an import run. The whole batch has been rolled
/// back whenever one of these is returned.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to read csv file: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] CsvError),

    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error("import canceled")]
    Canceled,
}

impl From<sqlx::Error> for ImportError {
    fn from(err: sqlx::Error) -> Self {
        Self::Storage(StoreError::from(err))
    }
}
