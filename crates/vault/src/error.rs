//! Vault error kinds.

use toolbox_store::StoreError;

/// Errors produced by vault and repository operations.
///
/// Expected business failures (wrong password, locked vault, missing row)
/// are kinds here, never panics. No variant ever carries key material.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    /// No vault exists yet — `create` must run first.
    #[error("vault is not initialized")]
    NotInitialized,

    /// A vault already exists; `create` is illegal.
    #[error("vault is already initialized")]
    AlreadyInitialized,

    /// The operation needs the master key but the vault is locked.
    #[error("vault is locked")]
    Locked,

    /// The master password is wrong. Indistinguishable from verifier
    /// tampering by design.
    #[error("master password incorrect")]
    AuthenticationFailed,

    /// A sealed blob failed its tag check: tampered data or key mismatch.
    #[error("invalid or tampered data")]
    Integrity,

    /// Lookup by id missed.
    #[error("entry not found")]
    NotFound,

    /// Input rejected before any cryptographic work.
    #[error("{0}")]
    Validation(&'static str),

    /// Underlying storage failure.
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl From<sqlx::Error> for VaultError {
    fn from(err: sqlx::Error) -> Self {
        Self::Storage(StoreError::from(err))
    }
}
