//! Backup codec errors.

use {toolbox_store::StoreError, toolbox_vault::VaultError};

#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    /// The vault must be unlocked to export or import.
    #[error("vault is locked")]
    Locked,

    /// The backup password is wrong — or the file was tampered with;
    /// the two are indistinguishable by design.
    #[error("backup password incorrect or file corrupted")]
    AuthenticationFailed,

    /// The file is not a recognizable backup.
    #[error("invalid backup file: {0}")]
    InvalidFormat(&'static str),

    /// The file claims a version this build does not read.
    #[error("unsupported backup version {0}")]
    UnsupportedVersion(i64),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error(transparent)]
    Vault(#[from] VaultError),
}

impl From<sqlx::Error> for BackupError {
    fn from(err: sqlx::Error) -> Self {
        Self::Storage(StoreError::from(err))
    }
}
