//! Vault state machine: create, unlock, lock, master-password rotation.

use {
    sqlx::SqlitePool,
    tokio::sync::RwLock,
    toolbox_crypto::{KdfConfig, derive_key, envelope, generate_salt},
    toolbox_store::{VaultMeta, entries, meta, now_secs},
    tracing::{info, warn},
    zeroize::Zeroizing,
};

use crate::error::VaultError;

/// Marker plaintext sealed into the unlock verifier.
const VERIFIER_MARKER: &[u8] = b"ToolboxPM/verifier";

/// Vault lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultStatus {
    /// No meta row — the vault has never been created.
    Uninitialized,
    /// Meta present, master key not in memory.
    Locked,
    /// Meta present, master key held in memory.
    Unlocked,
}

/// The encrypted store as a unit, gated by the master password.
///
/// Exclusively owns the master key. The key lives behind an `RwLock` —
/// `None` means locked — and is wiped on lock and on drop.
pub struct Vault {
    pool: SqlitePool,
    kdf: KdfConfig,
    master_key: RwLock<Option<Zeroizing<[u8; 32]>>>,
}

impl Vault {
    pub fn new(pool: SqlitePool) -> Self {
        Self::with_kdf_config(pool, KdfConfig::default())
    }

    pub fn with_kdf_config(pool: SqlitePool, kdf: KdfConfig) -> Self {
        Self {
            pool,
            kdf,
            master_key: RwLock::new(None),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Query the current lifecycle state.
    pub async fn status(&self) -> Result<VaultStatus, VaultError> {
        let mut conn = self.pool.acquire().await?;
        if meta::load(&mut conn).await?.is_none() {
            return Ok(VaultStatus::Uninitialized);
        }

        if self.master_key.read().await.is_some() {
            Ok(VaultStatus::Unlocked)
        } else {
            Ok(VaultStatus::Locked)
        }
    }

    pub async fn is_unlocked(&self) -> bool {
        self.master_key.read().await.is_some()
    }

    /// Create the vault: derive the master key from `master_password`,
    /// write the meta row, transition to unlocked.
    pub async fn create(&self, master_password: &str) -> Result<(), VaultError> {
        let mut conn = self.pool.acquire().await?;
        if meta::load(&mut conn).await?.is_some() {
            return Err(VaultError::AlreadyInitialized);
        }

        let salt = generate_salt();
        let iterations = self.kdf.iterations();
        let key = derive_key(master_password.as_bytes(), &salt, iterations);
        let verifier = envelope::seal(key.as_slice(), VERIFIER_MARKER);

        let now = now_secs();
        meta::insert(&mut conn, &VaultMeta {
            kdf_salt: salt.to_vec(),
            kdf_iterations: iterations,
            verifier,
            created_at: now,
            updated_at: now,
        })
        .await?;

        *self.master_key.write().await = Some(key);
        info!("vault created");
        Ok(())
    }

    /// Unlock with the master password. On failure the vault stays locked.
    pub async fn unlock(&self, master_password: &str) -> Result<(), VaultError> {
        let mut conn = self.pool.acquire().await?;
        let meta = meta::load(&mut conn)
            .await?
            .ok_or(VaultError::NotInitialized)?;

        let candidate = derive_key(
            master_password.as_bytes(),
            &meta.kdf_salt,
            meta.kdf_iterations,
        );

        if envelope::open(candidate.as_slice(), &meta.verifier).is_none() {
            warn!("unlock rejected: verifier mismatch");
            return Err(VaultError::AuthenticationFailed);
        }

        *self.master_key.write().await = Some(candidate);
        info!("vault unlocked");
        Ok(())
    }

    /// Wipe the master key. Idempotent; a no-op on an uninitialized vault.
    pub async fn lock(&self) {
        *self.master_key.write().await = None;
        info!("vault locked");
    }

    /// Rotate the master password: reseal every entry and the verifier
    /// under a key derived from `new_password`, in one transaction.
    ///
    /// On any failure the transaction rolls back and the old key stays in
    /// memory; nothing on disk changes.
    pub async fn change_master(&self, new_password: &str) -> Result<(), VaultError> {
        let old_key = self
            .master_key
            .read()
            .await
            .as_ref()
            .cloned()
            .ok_or(VaultError::Locked)?;

        let mut tx = self.pool.begin().await?;
        let current = meta::load(&mut tx)
            .await?
            .ok_or(VaultError::NotInitialized)?;

        let new_salt = generate_salt();
        let iterations = self.kdf.iterations();
        let new_key = derive_key(new_password.as_bytes(), &new_salt, iterations);

        for (id, password_enc, notes_enc) in entries::sealed_fields(&mut tx).await? {
            let password_plain = envelope::open(old_key.as_slice(), &password_enc)
                .ok_or(VaultError::Integrity)?;
            let resealed_password = envelope::seal(new_key.as_slice(), &password_plain);

            let resealed_notes = if notes_enc.is_empty() {
                Vec::new()
            } else {
                let notes_plain = envelope::open(old_key.as_slice(), &notes_enc)
                    .ok_or(VaultError::Integrity)?;
                envelope::seal(new_key.as_slice(), &notes_plain)
            };

            entries::update_sealed_fields(&mut tx, id, &resealed_password, &resealed_notes)
                .await?;
        }

        let verifier = envelope::seal(new_key.as_slice(), VERIFIER_MARKER);
        meta::update(&mut tx, &VaultMeta {
            kdf_salt: new_salt.to_vec(),
            kdf_iterations: iterations,
            verifier,
            created_at: current.created_at,
            updated_at: now_secs(),
        })
        .await?;

        tx.commit().await?;

        *self.master_key.write().await = Some(new_key);
        info!("master password changed");
        Ok(())
    }

    /// Owned copy of the master key for a background worker. The copy is
    /// wiped when the worker drops it.
    pub async fn master_key(&self) -> Result<Zeroizing<[u8; 32]>, VaultError> {
        self.master_key
            .read()
            .await
            .as_ref()
            .cloned()
            .ok_or(VaultError::Locked)
    }

    /// Seal `plaintext` under the in-memory master key.
    pub async fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, VaultError> {
        let guard = self.master_key.read().await;
        let key = guard.as_ref().ok_or(VaultError::Locked)?;
        Ok(envelope::seal(key.as_slice(), plaintext))
    }

    /// Open a sealed blob under the in-memory master key.
    pub async fn open(&self, blob: &[u8]) -> Result<Zeroizing<Vec<u8>>, VaultError> {
        let guard = self.master_key.read().await;
        let key = guard.as_ref().ok_or(VaultError::Locked)?;
        envelope::open(key.as_slice(), blob).ok_or(VaultError::Integrity)
    }
}
