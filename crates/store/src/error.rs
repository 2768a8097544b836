//! Store error type.

/// Errors produced by the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Underlying SQL failure. The message carries engine text only, never
    /// secret material.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}
