//! The import worker: duplicate resolution, group materialization, and
//! transactional persistence.

use std::{
    collections::HashMap,
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use {
    sqlx::SqliteConnection,
    tokio::sync::mpsc::UnboundedSender,
    toolbox_crypto::envelope,
    toolbox_csv::CsvRecord,
    toolbox_password::host_from_url,
    toolbox_store::{
        EntryType, NewEntry, ROOT_GROUP_ID, db, entries,
        groups::{GroupCache, ensure_group_path},
        now_secs, tags,
    },
    tracing::info,
    zeroize::Zeroizing,
};

use crate::error::ImportError;

/// What to do with a row whose duplicate key already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    #[default]
    Skip,
    Update,
    ImportAnyway,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOptions {
    pub duplicate_policy: DuplicatePolicy,
    pub create_groups_from_category_path: bool,
    pub default_entry_type: EntryType,
}

/// Progress tick: `value` of `total` rows (or rows + prefixes) handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub value: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub inserted: usize,
    pub updated: usize,
    pub skipped_dup: usize,
    pub skipped_invalid: usize,
    pub warnings: Vec<String>,
}

/// Duplicate key for an entry: normalized host when the URL has one,
/// lowercased title otherwise, plus the lowercased username.
fn dup_key(title: &str, username: &str, url: &str) -> String {
    let user = username.trim().to_lowercase();
    match host_from_url(url) {
        Some(host) => format!("{host}\n{user}"),
        None => format!("{}\n{user}", title.trim().to_lowercase()),
    }
}

pub struct CsvImportWorker {
    csv_path: PathBuf,
    db_path: PathBuf,
    master_key: Zeroizing<[u8; 32]>,
    default_group_id: i64,
    options: ImportOptions,
    cancel: Arc<AtomicBool>,
}

impl CsvImportWorker {
    pub fn new(
        csv_path: PathBuf,
        db_path: PathBuf,
        master_key: Zeroizing<[u8; 32]>,
        default_group_id: i64,
        options: ImportOptions,
    ) -> Self {
        Self {
            csv_path,
            db_path,
            master_key,
            default_group_id: if default_group_id > 0 {
                default_group_id
            } else {
                ROOT_GROUP_ID
            },
            options,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shared flag checked at row boundaries. Setting it makes the run
    /// roll back and finish with [`ImportError::Canceled`].
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Run the import to completion. All-or-nothing: on any error the
    /// database is left exactly as it was.
    pub async fn run(self, progress: UnboundedSender<Progress>) -> Result<ImportReport, ImportError> {
        let bytes = tokio::fs::read(&self.csv_path).await?;
        let parsed = toolbox_csv::parse(&bytes)?;

        let total = parsed.entries.len();
        let _ = progress.send(Progress { value: 0, total });

        let pool = db::open_worker_pool(&self.db_path).await?;

        let mut report = ImportReport {
            skipped_invalid: parsed.skipped_invalid + parsed.skipped_empty,
            warnings: parsed.warnings.clone(),
            ..ImportReport::default()
        };

        let mut tx = pool.begin().await?;
        let mut existing = preload_existing_keys(&mut tx).await?;
        let mut group_cache = GroupCache::new();
        let now = now_secs();

        for (index, record) in parsed.entries.iter().enumerate() {
            if self.cancel.load(Ordering::Relaxed) {
                tx.rollback().await?;
                return Err(ImportError::Canceled);
            }

            if record.title.trim().is_empty() || record.password.is_empty() {
                report.skipped_invalid += 1;
                let _ = progress.send(Progress { value: index + 1, total });
                continue;
            }

            let mut group_id = self.default_group_id;
            if self.options.create_groups_from_category_path && !record.category.trim().is_empty()
            {
                group_id = ensure_group_path(
                    &mut tx,
                    group_id,
                    record.category.trim(),
                    now,
                    &mut group_cache,
                )
                .await?;
            }

            let key = dup_key(&record.title, &record.username, &record.url);
            let duplicate_of = existing.get(&key).copied();

            if duplicate_of.is_some() && self.options.duplicate_policy == DuplicatePolicy::Skip {
                report.skipped_dup += 1;
                let _ = progress.send(Progress { value: index + 1, total });
                continue;
            }

            let password_enc = envelope::seal(self.master_key.as_slice(), record.password.as_bytes());
            let notes_enc = if record.notes.trim().is_empty() {
                Vec::new()
            } else {
                envelope::seal(self.master_key.as_slice(), record.notes.as_bytes())
            };

            match duplicate_of {
                Some(entry_id) if self.options.duplicate_policy == DuplicatePolicy::Update => {
                    self.update_duplicate(
                        &mut tx,
                        entry_id,
                        record,
                        group_id,
                        &password_enc,
                        &notes_enc,
                        now,
                    )
                    .await?;
                    report.updated += 1;
                },
                _ => {
                    let id = entries::insert(&mut tx, &NewEntry {
                        group_id,
                        entry_type: self.options.default_entry_type,
                        title: record.title.clone(),
                        username: record.username.clone(),
                        url: record.url.clone(),
                        category: record.category.clone(),
                        password_enc,
                        notes_enc,
                        created_at: now,
                        updated_at: now,
                    })
                    .await?;

                    existing.entry(key).or_insert(id);
                    tags::link_tags(&mut tx, id, &record.tags, now).await?;
                    report.inserted += 1;
                },
            }

            let _ = progress.send(Progress { value: index + 1, total });
        }

        tx.commit().await?;

        info!(
            inserted = report.inserted,
            updated = report.updated,
            skipped_dup = report.skipped_dup,
            skipped_invalid = report.skipped_invalid,
            "csv import finished"
        );
        Ok(report)
    }

    /// Reseal secrets of an existing row, filling url/category only where
    /// the stored value is blank so user edits survive re-imports, and
    /// replace its tag set.
    #[allow(clippy::too_many_arguments)]
    async fn update_duplicate(
        &self,
        conn: &mut SqliteConnection,
        entry_id: i64,
        record: &CsvRecord,
        group_id: i64,
        password_enc: &[u8],
        notes_enc: &[u8],
        now: i64,
    ) -> Result<(), ImportError> {
        let (existing_url, existing_category): (String, String) =
            sqlx::query_as("SELECT url, category FROM password_entries WHERE id = ? LIMIT 1")
                .bind(entry_id)
                .fetch_one(&mut *conn)
                .await?;

        let url = if existing_url.trim().is_empty() {
            &record.url
        } else {
            &existing_url
        };
        let category = if existing_category.trim().is_empty() {
            &record.category
        } else {
            &existing_category
        };

        sqlx::query(
            "UPDATE password_entries
             SET group_id = ?, entry_type = ?, password_enc = ?, url = ?,
                 category = ?, notes_enc = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(group_id)
        .bind(self.options.default_entry_type.as_i64())
        .bind(password_enc)
        .bind(url)
        .bind(category)
        .bind(notes_enc)
        .bind(now)
        .bind(entry_id)
        .execute(&mut *conn)
        .await?;

        tags::replace_tags(conn, entry_id, &record.tags, now).await?;
        Ok(())
    }
}

/// One pass over the stored entries to map duplicate keys to ids. The
/// first id seen for a key wins.
async fn preload_existing_keys(
    conn: &mut SqliteConnection,
) -> Result<HashMap<String, i64>, ImportError> {
    let rows: Vec<(i64, String, String, String)> =
        sqlx::query_as("SELECT id, title, username, url FROM password_entries ORDER BY id ASC")
            .fetch_all(conn)
            .await?;

    let mut map = HashMap::with_capacity(rows.len());
    for (id, title, username, url) in rows {
        map.entry(dup_key(&title, &username, &url)).or_insert(id);
    }
    Ok(map)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, tokio::sync::mpsc, toolbox_store::open_pool};

    struct Fixture {
        _tmp: tempfile::TempDir,
        csv_path: PathBuf,
        db_path: PathBuf,
        key: [u8; 32],
    }

    async fn fixture(csv: &str) -> Fixture {
        let tmp = tempfile::tempdir().unwrap();
        let csv_path = tmp.path().join("import.csv");
        let db_path = tmp.path().join("toolbox.sqlite3");
        std::fs::write(&csv_path, csv).unwrap();

        // Creating the application pool lays down the schema.
        let pool = open_pool(&db_path).await.unwrap();
        pool.close().await;

        Fixture {
            _tmp: tmp,
            csv_path,
            db_path,
            key: [0x5Au8; 32],
        }
    }

    fn worker(fx: &Fixture, options: ImportOptions) -> CsvImportWorker {
        CsvImportWorker::new(
            fx.csv_path.clone(),
            fx.db_path.clone(),
            Zeroizing::new(fx.key),
            ROOT_GROUP_ID,
            options,
        )
    }

    async fn run(w: CsvImportWorker) -> Result<ImportReport, ImportError> {
        let (tx, _rx) = mpsc::unbounded_channel();
        w.run(tx).await
    }

    #[tokio::test]
    async fn inserts_rows_and_seals_passwords() {
        let fx = fixture(
            "title,username,password,url,notes\n\
             GitHub,alice,S3cret!,https://github.com,first\n\
             Bank,bob,Digits#99,https://bank.example,\n",
        )
        .await;

        let report = run(worker(&fx, ImportOptions::default())).await.unwrap();
        assert_eq!(report.inserted, 2);
        assert_eq!(report.skipped_invalid, 0);

        let pool = open_pool(&fx.db_path).await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        let rows = entries::sealed_fields(&mut conn).await.unwrap();
        assert_eq!(rows.len(), 2);

        let plain = envelope::open(&fx.key, &rows[0].1).unwrap();
        assert_eq!(plain.as_slice(), b"S3cret!");
        // Blank notes are stored unsealed-empty.
        assert!(rows[1].2.is_empty());
    }

    #[tokio::test]
    async fn second_skip_run_inserts_nothing() {
        let fx = fixture(
            "title,username,password,url\n\
             GitHub,alice,S3cret!,https://github.com\n\
             Bank,bob,Digits#99,https://bank.example\n",
        )
        .await;

        let first = run(worker(&fx, ImportOptions::default())).await.unwrap();
        assert_eq!(first.inserted, 2);
        assert_eq!(first.skipped_dup, 0);

        let second = run(worker(&fx, ImportOptions::default())).await.unwrap();
        assert_eq!(second.inserted, 0);
        assert_eq!(second.skipped_dup, 2);
    }

    #[tokio::test]
    async fn www_prefix_does_not_defeat_dedup() {
        let fx = fixture(
            "title,username,password,url\n\
             Example,alice,pw1,https://www.example.com/login\n\
             Example again,ALICE,pw2,example.com\n",
        )
        .await;

        let report = run(worker(&fx, ImportOptions::default())).await.unwrap();
        assert_eq!(report.inserted, 1);
        assert_eq!(report.skipped_dup, 1);
    }

    #[tokio::test]
    async fn update_policy_merges_without_clobbering() {
        let fx = fixture(
            "title,username,password,url,category,tags\n\
             GitHub,alice,NewPass!,https://github.com,Imported,\"new,tags\"\n",
        )
        .await;

        // Seed an existing duplicate with a non-empty category and no url
        // host conflict.
        let pool = open_pool(&fx.db_path).await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        let seeded = entries::insert(&mut conn, &NewEntry {
            group_id: ROOT_GROUP_ID,
            entry_type: EntryType::WebLogin,
            title: "GitHub".to_string(),
            username: "alice".to_string(),
            url: "https://github.com".to_string(),
            category: "Hand-picked".to_string(),
            password_enc: envelope::seal(&fx.key, b"OldPass"),
            notes_enc: Vec::new(),
            created_at: 1_000,
            updated_at: 1_000,
        })
        .await
        .unwrap();
        tags::link_tags(&mut conn, seeded, &["old".to_string()], 1_000)
            .await
            .unwrap();
        drop(conn);
        pool.close().await;

        let options = ImportOptions {
            duplicate_policy: DuplicatePolicy::Update,
            ..ImportOptions::default()
        };
        let report = run(worker(&fx, options)).await.unwrap();
        assert_eq!(report.updated, 1);
        assert_eq!(report.inserted, 0);

        let pool = open_pool(&fx.db_path).await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        let row = entries::load_row(&mut conn, seeded).await.unwrap().unwrap();
        let plain = envelope::open(&fx.key, &row.password_enc).unwrap();
        assert_eq!(plain.as_slice(), b"NewPass!");
        // Existing non-empty category survives the merge.
        assert_eq!(row.entry.category, "Hand-picked");
        assert_eq!(row.entry.created_at, 1_000, "created_at untouched");

        let tag_names = tags::tags_for_entry(&mut conn, seeded).await.unwrap();
        assert_eq!(tag_names, vec!["new", "tags"]);
    }

    #[tokio::test]
    async fn import_anyway_duplicates_rows() {
        let fx = fixture(
            "title,username,password,url\n\
             GitHub,alice,S3cret!,https://github.com\n",
        )
        .await;

        run(worker(&fx, ImportOptions::default())).await.unwrap();
        let options = ImportOptions {
            duplicate_policy: DuplicatePolicy::ImportAnyway,
            ..ImportOptions::default()
        };
        let report = run(worker(&fx, options)).await.unwrap();
        assert_eq!(report.inserted, 1);
        assert_eq!(report.skipped_dup, 0);

        let pool = open_pool(&fx.db_path).await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        assert_eq!(entries::count(&mut conn).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn category_paths_materialize_groups() {
        let fx = fixture(
            "title,username,password,category\n\
             Mail,alice,pw!123,Work/Email\n\
             Chat,bob,pw!456,Work\\Chat\n",
        )
        .await;

        let options = ImportOptions {
            create_groups_from_category_path: true,
            ..ImportOptions::default()
        };
        run(worker(&fx, options)).await.unwrap();

        let pool = open_pool(&fx.db_path).await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        // Root + Work + Email + Chat.
        let (group_count,): (i64,) = sqlx::query_as("SELECT COUNT(1) FROM groups")
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        assert_eq!(group_count, 4);

        let summaries = entries::list_summaries(&mut conn).await.unwrap();
        assert!(summaries.iter().all(|e| e.group_id != ROOT_GROUP_ID));
    }

    #[tokio::test]
    async fn cancel_rolls_back_everything() {
        let fx = fixture(
            "title,username,password\n\
             GitHub,alice,S3cret!\n",
        )
        .await;

        let w = worker(&fx, ImportOptions::default());
        w.cancel_flag().store(true, Ordering::Relaxed);
        let result = run(w).await;
        assert!(matches!(result, Err(ImportError::Canceled)));

        let pool = open_pool(&fx.db_path).await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        assert_eq!(entries::count(&mut conn).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn progress_ticks_every_row() {
        let fx = fixture(
            "title,username,password\n\
             A,u,pw1\n\
             B,u,pw2\n\
             C,u,pw3\n",
        )
        .await;

        let (tx, mut rx) = mpsc::unbounded_channel();
        worker(&fx, ImportOptions::default()).run(tx).await.unwrap();

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert_eq!(events.first(), Some(&Progress { value: 0, total: 3 }));
        assert_eq!(events.last(), Some(&Progress { value: 3, total: 3 }));
    }

    #[tokio::test]
    async fn invalid_rows_are_counted_not_fatal() {
        let fx = fixture(
            "title,username,password\n\
             ,u,pw-but-no-title\n\
             Ok,u,\n\
             Good,u,pw\n",
        )
        .await;

        let report = run(worker(&fx, ImportOptions::default())).await.unwrap();
        assert_eq!(report.inserted, 1);
        assert_eq!(report.skipped_invalid, 2);
    }
}
