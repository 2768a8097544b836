//! Typed CRUD over encrypted entries.
//!
//! Every secret-bearing operation requires the vault to be unlocked;
//! listing non-secret columns is allowed while locked. Validation runs
//! before any cryptographic work.

use std::sync::Arc;

use {
    sqlx::SqlitePool,
    toolbox_store::{Entry, EntrySecrets, NewEntry, ROOT_GROUP_ID, entries, now_secs, tags},
};

use crate::{error::VaultError, vault::Vault};

pub struct Repository {
    pool: SqlitePool,
    vault: Arc<Vault>,
}

impl Repository {
    pub fn new(pool: SqlitePool, vault: Arc<Vault>) -> Self {
        Self { pool, vault }
    }

    /// Non-secret summaries, most recently updated first. Readable while
    /// the vault is locked.
    pub async fn list_entries(&self) -> Result<Vec<Entry>, VaultError> {
        let mut conn = self.pool.acquire().await?;
        Ok(entries::list_summaries(&mut conn).await?)
    }

    /// Distinct non-empty categories, ascending. Readable while locked.
    pub async fn list_categories(&self) -> Result<Vec<String>, VaultError> {
        let mut conn = self.pool.acquire().await?;
        Ok(entries::list_categories(&mut conn).await?)
    }

    /// Load one entry with its decrypted secrets and tags.
    pub async fn load_entry(&self, id: i64) -> Result<EntrySecrets, VaultError> {
        if !self.vault.is_unlocked().await {
            return Err(VaultError::Locked);
        }

        let mut conn = self.pool.acquire().await?;
        let row = entries::load_row(&mut conn, id)
            .await?
            .ok_or(VaultError::NotFound)?;

        let password_plain = self.vault.open(&row.password_enc).await?;
        let notes = if row.notes_enc.is_empty() {
            String::new()
        } else {
            let notes_plain = self.vault.open(&row.notes_enc).await?;
            String::from_utf8_lossy(&notes_plain).into_owned()
        };

        let mut entry = row.entry;
        entry.tags = tags::tags_for_entry(&mut conn, id).await?;

        Ok(EntrySecrets {
            entry,
            password: String::from_utf8_lossy(&password_plain).into_owned(),
            notes,
        })
    }

    /// Insert a new entry stamped with the current time.
    pub async fn add_entry(&self, secrets: &EntrySecrets) -> Result<i64, VaultError> {
        self.add_entry_with_timestamps(secrets, 0, 0).await
    }

    /// Insert a new entry with caller-supplied timestamps (import and
    /// backup restore). Non-positive values fall back to now, and
    /// `updated_at` never precedes `created_at`.
    pub async fn add_entry_with_timestamps(
        &self,
        secrets: &EntrySecrets,
        created_at: i64,
        updated_at: i64,
    ) -> Result<i64, VaultError> {
        if !self.vault.is_unlocked().await {
            return Err(VaultError::Locked);
        }
        validate(secrets)?;

        let password_enc = self.vault.seal(secrets.password.as_bytes()).await?;
        let notes_enc = self.seal_notes(&secrets.notes).await?;

        let now = now_secs();
        let created_at = if created_at > 0 { created_at } else { now };
        let updated_at = if updated_at > 0 { updated_at } else { created_at };
        let updated_at = updated_at.max(created_at);

        let mut conn = self.pool.acquire().await?;
        let id = entries::insert(&mut conn, &NewEntry {
            group_id: normalize_group(secrets.entry.group_id),
            entry_type: secrets.entry.entry_type,
            title: secrets.entry.title.trim().to_string(),
            username: secrets.entry.username.clone(),
            url: secrets.entry.url.clone(),
            category: secrets.entry.category.clone(),
            password_enc,
            notes_enc,
            created_at,
            updated_at,
        })
        .await?;

        tags::link_tags(&mut conn, id, &secrets.entry.tags, now).await?;
        Ok(id)
    }

    /// Reseal and rewrite an existing entry. `created_at` is preserved.
    pub async fn update_entry(&self, secrets: &EntrySecrets) -> Result<(), VaultError> {
        if !self.vault.is_unlocked().await {
            return Err(VaultError::Locked);
        }
        if secrets.entry.id <= 0 {
            return Err(VaultError::Validation("invalid entry id"));
        }
        validate(secrets)?;

        let password_enc = self.vault.seal(secrets.password.as_bytes()).await?;
        let notes_enc = self.seal_notes(&secrets.notes).await?;
        let now = now_secs();

        let mut conn = self.pool.acquire().await?;
        let affected = entries::update(&mut conn, secrets.entry.id, &NewEntry {
            group_id: normalize_group(secrets.entry.group_id),
            entry_type: secrets.entry.entry_type,
            title: secrets.entry.title.trim().to_string(),
            username: secrets.entry.username.clone(),
            url: secrets.entry.url.clone(),
            category: secrets.entry.category.clone(),
            password_enc,
            notes_enc,
            created_at: 0,
            updated_at: now,
        })
        .await?;

        if affected == 0 {
            return Err(VaultError::NotFound);
        }

        tags::replace_tags(&mut conn, secrets.entry.id, &secrets.entry.tags, now).await?;
        Ok(())
    }

    /// Delete an entry; its tag links cascade away.
    pub async fn delete_entry(&self, id: i64) -> Result<(), VaultError> {
        let mut conn = self.pool.acquire().await?;
        if entries::delete(&mut conn, id).await? == 0 {
            return Err(VaultError::NotFound);
        }
        Ok(())
    }

    /// Empty-after-trim notes are stored as an empty blob, not sealed.
    async fn seal_notes(&self, notes: &str) -> Result<Vec<u8>, VaultError> {
        if notes.trim().is_empty() {
            Ok(Vec::new())
        } else {
            self.vault.seal(notes.as_bytes()).await
        }
    }
}

fn normalize_group(group_id: i64) -> i64 {
    if group_id > 0 { group_id } else { ROOT_GROUP_ID }
}

fn validate(secrets: &EntrySecrets) -> Result<(), VaultError> {
    if secrets.entry.title.trim().is_empty() {
        return Err(VaultError::Validation("title must not be empty"));
    }
    if secrets.password.is_empty() {
        return Err(VaultError::Validation("password must not be empty"));
    }
    Ok(())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, toolbox_store::open_pool};

    async fn fixture() -> (tempfile::TempDir, Arc<Vault>, Repository) {
        let tmp = tempfile::tempdir().unwrap();
        let pool = open_pool(&tmp.path().join("vault.sqlite3")).await.unwrap();
        let vault = Arc::new(Vault::new(pool.clone()));
        vault.create("master password").await.unwrap();
        let repo = Repository::new(pool, Arc::clone(&vault));
        (tmp, vault, repo)
    }

    fn sample(title: &str, password: &str) -> EntrySecrets {
        EntrySecrets {
            entry: Entry {
                title: title.to_string(),
                username: "user@example.com".to_string(),
                url: "https://github.com/login".to_string(),
                category: "Dev".to_string(),
                tags: vec!["dev".to_string(), "git".to_string()],
                ..Entry::default()
            },
            password: password.to_string(),
            notes: "some note".to_string(),
        }
    }

    #[tokio::test]
    async fn add_and_load_round_trip() {
        let (_tmp, _vault, repo) = fixture().await;

        let id = repo.add_entry(&sample("GitHub", "Aq9!xZ3@pL8#")).await.unwrap();
        let loaded = repo.load_entry(id).await.unwrap();

        assert_eq!(loaded.entry.title, "GitHub");
        assert_eq!(loaded.password, "Aq9!xZ3@pL8#");
        assert_eq!(loaded.notes, "some note");
        assert_eq!(loaded.entry.tags, vec!["dev", "git"]);
        assert!(loaded.entry.created_at > 0);
        assert!(loaded.entry.updated_at >= loaded.entry.created_at);
    }

    #[tokio::test]
    async fn whitespace_notes_stay_unsealed() {
        let (_tmp, vault, repo) = fixture().await;

        let mut secrets = sample("Blank notes", "pw");
        secrets.notes = "   ".to_string();
        let id = repo.add_entry(&secrets).await.unwrap();

        let mut conn = vault.pool().acquire().await.unwrap();
        let row = entries::load_row(&mut conn, id)
            .await
            .unwrap()
            .unwrap();
        assert!(row.notes_enc.is_empty());
        drop(conn);

        assert_eq!(repo.load_entry(id).await.unwrap().notes, "");
    }

    #[tokio::test]
    async fn validation_precedes_storage() {
        let (_tmp, _vault, repo) = fixture().await;

        let mut no_title = sample("   ", "pw");
        no_title.entry.tags.clear();
        assert!(matches!(
            repo.add_entry(&no_title).await,
            Err(VaultError::Validation(_))
        ));

        let empty_password = sample("Title", "");
        assert!(matches!(
            repo.add_entry(&empty_password).await,
            Err(VaultError::Validation(_))
        ));

        assert!(repo.list_entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn secrets_require_unlocked_but_listing_does_not() {
        let (_tmp, vault, repo) = fixture().await;
        let id = repo.add_entry(&sample("GitHub", "pw")).await.unwrap();

        vault.lock().await;

        assert_eq!(repo.list_entries().await.unwrap().len(), 1);
        assert!(!repo.list_categories().await.unwrap().is_empty());
        assert!(matches!(
            repo.load_entry(id).await,
            Err(VaultError::Locked)
        ));
        assert!(matches!(
            repo.add_entry(&sample("x", "y")).await,
            Err(VaultError::Locked)
        ));
    }

    #[tokio::test]
    async fn update_preserves_created_at() {
        let (_tmp, _vault, repo) = fixture().await;
        let id = repo
            .add_entry_with_timestamps(&sample("GitHub", "old"), 1_000, 1_000)
            .await
            .unwrap();

        let mut loaded = repo.load_entry(id).await.unwrap();
        loaded.password = "new password".to_string();
        loaded.entry.tags = vec!["rotated".to_string()];
        repo.update_entry(&loaded).await.unwrap();

        let reloaded = repo.load_entry(id).await.unwrap();
        assert_eq!(reloaded.password, "new password");
        assert_eq!(reloaded.entry.created_at, 1_000);
        assert!(reloaded.entry.updated_at > 1_000);
        assert_eq!(reloaded.entry.tags, vec!["rotated"]);
    }

    #[tokio::test]
    async fn update_unknown_id_is_not_found() {
        let (_tmp, _vault, repo) = fixture().await;
        let mut secrets = sample("Ghost", "pw");
        secrets.entry.id = 4_242;
        assert!(matches!(
            repo.update_entry(&secrets).await,
            Err(VaultError::NotFound)
        ));
    }

    #[tokio::test]
    async fn timestamp_normalization() {
        let (_tmp, _vault, repo) = fixture().await;

        // updated_at before created_at is clamped up.
        let id = repo
            .add_entry_with_timestamps(&sample("Clamped", "pw"), 2_000, 1_500)
            .await
            .unwrap();
        let loaded = repo.load_entry(id).await.unwrap();
        assert_eq!(loaded.entry.created_at, 2_000);
        assert_eq!(loaded.entry.updated_at, 2_000);

        // Non-positive timestamps fall back to now.
        let id = repo
            .add_entry_with_timestamps(&sample("Fallback", "pw"), -5, 0)
            .await
            .unwrap();
        let loaded = repo.load_entry(id).await.unwrap();
        assert!(loaded.entry.created_at > 0);
        assert_eq!(loaded.entry.updated_at, loaded.entry.created_at);
    }

    #[tokio::test]
    async fn delete_removes_row_and_links() {
        let (_tmp, vault, repo) = fixture().await;
        let id = repo.add_entry(&sample("Doomed", "pw")).await.unwrap();

        repo.delete_entry(id).await.unwrap();
        assert!(matches!(
            repo.load_entry(id).await,
            Err(VaultError::NotFound)
        ));
        assert!(matches!(
            repo.delete_entry(id).await,
            Err(VaultError::NotFound)
        ));

        let mut conn = vault.pool().acquire().await.unwrap();
        let (links,): (i64,) = sqlx::query_as("SELECT COUNT(1) FROM entry_tags")
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        assert_eq!(links, 0);
    }

    #[tokio::test]
    async fn tampered_password_yields_integrity_error() {
        let (_tmp, vault, repo) = fixture().await;
        let id = repo.add_entry(&sample("GitHub", "pw")).await.unwrap();

        let mut conn = vault.pool().acquire().await.unwrap();
        let row = entries::load_row(&mut conn, id)
            .await
            .unwrap()
            .unwrap();
        let mut tampered = row.password_enc.clone();
        let last = tampered.len() - 1;
        tampered[last] ^= 0x01;
        entries::update_sealed_fields(&mut conn, id, &tampered, &row.notes_enc)
            .await
            .unwrap();
        drop(conn);

        assert!(matches!(
            repo.load_entry(id).await,
            Err(VaultError::Integrity)
        ));
    }
}
