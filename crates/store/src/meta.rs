//! The single `vault_meta` row.
//!
//! Either absent (vault uninitialized) or complete; the sentinel primary
//! key makes partial states unrepresentable.

use sqlx::SqliteConnection;

use crate::error::StoreError;

/// The vault's KDF parameters and unlock verifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultMeta {
    pub kdf_salt: Vec<u8>,
    pub kdf_iterations: u32,
    pub verifier: Vec<u8>,
    pub created_at: i64,
    pub updated_at: i64,
}

pub async fn load(conn: &mut SqliteConnection) -> Result<Option<VaultMeta>, StoreError> {
    let row: Option<(Vec<u8>, i64, Vec<u8>, i64, i64)> = sqlx::query_as(
        "SELECT kdf_salt, kdf_iterations, verifier, created_at, updated_at
         FROM vault_meta
         WHERE id = 1",
    )
    .fetch_optional(conn)
    .await?;

    Ok(row.map(
        |(kdf_salt, kdf_iterations, verifier, created_at, updated_at)| VaultMeta {
            kdf_salt,
            kdf_iterations: kdf_iterations.max(0) as u32,
            verifier,
            created_at,
            updated_at,
        },
    ))
}

/// Insert the meta row. Fails if it already exists.
pub async fn insert(conn: &mut SqliteConnection, meta: &VaultMeta) -> Result<(), StoreError> {
    sqlx::query(
        "INSERT INTO vault_meta (id, kdf_salt, kdf_iterations, verifier, created_at, updated_at)
         VALUES (1, ?, ?, ?, ?, ?)",
    )
    .bind(&meta.kdf_salt)
    .bind(i64::from(meta.kdf_iterations))
    .bind(&meta.verifier)
    .bind(meta.created_at)
    .bind(meta.updated_at)
    .execute(conn)
    .await?;
    Ok(())
}

/// Rewrite the meta row in place (master-password rotation).
pub async fn update(conn: &mut SqliteConnection, meta: &VaultMeta) -> Result<(), StoreError> {
    sqlx::query(
        "UPDATE vault_meta
         SET kdf_salt = ?, kdf_iterations = ?, verifier = ?, updated_at = ?
         WHERE id = 1",
    )
    .bind(&meta.kdf_salt)
    .bind(i64::from(meta.kdf_iterations))
    .bind(&meta.verifier)
    .bind(meta.updated_at)
    .execute(conn)
    .await?;
    Ok(())
}
