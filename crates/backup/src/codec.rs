//! Backup export and import.

use std::path::Path;

use {
    base64::{Engine, engine::general_purpose::STANDARD as BASE64},
    serde::{Deserialize, Serialize},
    toolbox_crypto::{derive_key, envelope, generate_salt},
    toolbox_store::{NewEntry, ROOT_GROUP_ID, entries, now_secs},
    toolbox_vault::{Repository, Vault},
    tracing::info,
};

use crate::error::BackupError;

const BACKUP_FORMAT: &str = "ToolboxPasswordBackup";
const BACKUP_VERSION: i64 = 1;
const BACKUP_KDF_ITERATIONS: u32 = 120_000;

#[derive(Debug, Serialize, Deserialize)]
struct BackupKdf {
    salt: String,
    iterations: u32,
}

/// The outer JSON wrapper written to disk.
#[derive(Debug, Serialize, Deserialize)]
struct BackupFile {
    format: String,
    version: i64,
    kdf: BackupKdf,
    ciphertext: String,
    exported_at: i64,
}

/// The sealed inner payload.
#[derive(Debug, Serialize, Deserialize)]
struct BackupPayload {
    version: i64,
    exported_at: i64,
    entries: Vec<BackupEntry>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct BackupEntry {
    #[serde(default)]
    title: String,
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    notes: String,
    #[serde(default)]
    created_at: i64,
    #[serde(default)]
    updated_at: i64,
}

/// Export every entry into a sealed backup at `path`. Returns the number
/// of entries written.
pub async fn export_backup(
    vault: &Vault,
    repository: &Repository,
    path: &Path,
    backup_password: &str,
) -> Result<usize, BackupError> {
    if !vault.is_unlocked().await {
        return Err(BackupError::Locked);
    }

    let mut backup_entries = Vec::new();
    for summary in repository.list_entries().await? {
        let full = repository.load_entry(summary.id).await?;
        backup_entries.push(BackupEntry {
            title: full.entry.title,
            username: full.entry.username,
            password: full.password,
            url: full.entry.url,
            category: full.entry.category,
            notes: full.notes,
            created_at: full.entry.created_at,
            updated_at: full.entry.updated_at,
        });
    }

    let exported_at = now_secs();
    let count = backup_entries.len();
    let payload = serde_json::to_vec(&BackupPayload {
        version: BACKUP_VERSION,
        exported_at,
        entries: backup_entries,
    })?;

    let salt = generate_salt();
    let key = derive_key(backup_password.as_bytes(), &salt, BACKUP_KDF_ITERATIONS);
    let sealed = envelope::seal(key.as_slice(), &payload);

    let file = BackupFile {
        format: BACKUP_FORMAT.to_string(),
        version: BACKUP_VERSION,
        kdf: BackupKdf {
            salt: BASE64.encode(salt),
            iterations: BACKUP_KDF_ITERATIONS,
        },
        ciphertext: BASE64.encode(sealed),
        exported_at,
    };

    // Write-to-temp + rename so a failed export never truncates an
    // existing backup.
    let bytes = serde_json::to_vec_pretty(&file)?;
    let tmp_path = path.with_extension("tbxpm.tmp");
    tokio::fs::write(&tmp_path, &bytes).await?;
    tokio::fs::rename(&tmp_path, path).await?;

    info!(count, "backup exported");
    Ok(count)
}

/// Import entries from a backup at `path` into the unlocked vault, in one
/// transaction. Returns the number of entries inserted.
pub async fn import_backup(
    vault: &Vault,
    path: &Path,
    backup_password: &str,
) -> Result<usize, BackupError> {
    if !vault.is_unlocked().await {
        return Err(BackupError::Locked);
    }

    let bytes = tokio::fs::read(path).await?;
    let file: BackupFile = serde_json::from_slice(&bytes)
        .map_err(|_| BackupError::InvalidFormat("not a json backup file"))?;

    if file.format != BACKUP_FORMAT {
        return Err(BackupError::InvalidFormat("unrecognized format marker"));
    }
    if file.version != BACKUP_VERSION {
        return Err(BackupError::UnsupportedVersion(file.version));
    }

    let salt = BASE64.decode(&file.kdf.salt)?;
    let ciphertext = BASE64.decode(&file.ciphertext)?;
    if salt.is_empty() || file.kdf.iterations == 0 || ciphertext.is_empty() {
        return Err(BackupError::InvalidFormat("missing kdf or ciphertext"));
    }

    let key = derive_key(backup_password.as_bytes(), &salt, file.kdf.iterations);
    let payload_bytes = envelope::open(key.as_slice(), &ciphertext)
        .ok_or(BackupError::AuthenticationFailed)?;

    let payload: BackupPayload = serde_json::from_slice(&payload_bytes)
        .map_err(|_| BackupError::InvalidFormat("corrupted payload"))?;
    if payload.version != BACKUP_VERSION {
        return Err(BackupError::UnsupportedVersion(payload.version));
    }

    let master_key = vault.master_key().await?;
    let now = now_secs();

    let mut tx = vault.pool().begin().await?;
    let mut imported = 0usize;
    for entry in &payload.entries {
        if entry.title.trim().is_empty() || entry.password.is_empty() {
            continue;
        }

        let created_at = if entry.created_at > 0 { entry.created_at } else { now };
        let updated_at = if entry.updated_at > 0 { entry.updated_at } else { created_at };

        let notes_enc = if entry.notes.trim().is_empty() {
            Vec::new()
        } else {
            envelope::seal(master_key.as_slice(), entry.notes.as_bytes())
        };

        entries::insert(&mut tx, &NewEntry {
            group_id: ROOT_GROUP_ID,
            entry_type: toolbox_store::EntryType::WebLogin,
            title: entry.title.trim().to_string(),
            username: entry.username.clone(),
            url: entry.url.clone(),
            category: entry.category.clone(),
            password_enc: envelope::seal(master_key.as_slice(), entry.password.as_bytes()),
            notes_enc,
            created_at,
            updated_at: updated_at.max(created_at),
        })
        .await?;
        imported += 1;
    }
    tx.commit().await?;

    info!(imported, "backup imported");
    Ok(imported)
}
