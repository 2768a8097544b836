//! Health worker errors.

use toolbox_store::StoreError;

/// Terminal failure of a health run. Network problems during the breach
/// phase are never one of these — they degrade per prefix instead.
#[derive(Debug, thiserror::Error)]
pub enum HealthError {
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl From<sqlx::Error> for HealthError {
    fn from(err: sqlx::Error) -> Self {
        Self::Storage(StoreError::from(err))
    }
}
