//! Pool construction and forward-only schema creation.

use std::path::Path;

use {
    sqlx::{
        SqlitePool,
        sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    },
    tracing::debug,
};

use crate::{entry::ROOT_GROUP_ID, error::StoreError, now_secs};

/// Schema statements issued on every open. Additive only: existing
/// databases are never altered destructively.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS vault_meta (
        id             INTEGER PRIMARY KEY CHECK (id = 1),
        kdf_salt       BLOB NOT NULL,
        kdf_iterations INTEGER NOT NULL,
        verifier       BLOB NOT NULL,
        created_at     INTEGER NOT NULL,
        updated_at     INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS groups (
        id         INTEGER PRIMARY KEY AUTOINCREMENT,
        parent_id  INTEGER REFERENCES groups(id),
        name       TEXT NOT NULL,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_groups_parent_id ON groups(parent_id)",
    "CREATE TABLE IF NOT EXISTS password_entries (
        id           INTEGER PRIMARY KEY AUTOINCREMENT,
        group_id     INTEGER NOT NULL DEFAULT 1 REFERENCES groups(id),
        entry_type   INTEGER NOT NULL DEFAULT 0,
        title        TEXT NOT NULL,
        username     TEXT NOT NULL DEFAULT '',
        url          TEXT NOT NULL DEFAULT '',
        category     TEXT NOT NULL DEFAULT '',
        password_enc BLOB NOT NULL,
        notes_enc    BLOB NOT NULL DEFAULT (X''),
        created_at   INTEGER NOT NULL,
        updated_at   INTEGER NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_password_entries_category
        ON password_entries(category)",
    "CREATE INDEX IF NOT EXISTS idx_password_entries_updated_at
        ON password_entries(updated_at DESC)",
    "CREATE TABLE IF NOT EXISTS tags (
        id         INTEGER PRIMARY KEY AUTOINCREMENT,
        name       TEXT NOT NULL UNIQUE,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS entry_tags (
        entry_id   INTEGER NOT NULL REFERENCES password_entries(id) ON DELETE CASCADE,
        tag_id     INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
        created_at INTEGER NOT NULL,
        PRIMARY KEY (entry_id, tag_id)
    )",
    "CREATE TABLE IF NOT EXISTS favicon_cache (
        host       TEXT PRIMARY KEY,
        icon       BLOB NOT NULL,
        fetched_at INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS pwned_prefix_cache (
        prefix     TEXT PRIMARY KEY,
        body       BLOB NOT NULL,
        fetched_at INTEGER NOT NULL
    )",
];

fn connect_options(path: &Path) -> SqliteConnectOptions {
    SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .foreign_keys(true)
}

/// Open the application pool for `path` and ensure the schema exists.
pub async fn open_pool(path: &Path) -> Result<SqlitePool, StoreError> {
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(connect_options(path))
        .await?;
    ensure_schema(&pool).await?;
    Ok(pool)
}

/// Open a dedicated single-connection pool for a background worker.
///
/// Workers never share connections with the application pool; they rely on
/// SQLite's file-level locking for write exclusion.
pub async fn open_worker_pool(path: &Path) -> Result<SqlitePool, StoreError> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(connect_options(path))
        .await?;
    Ok(pool)
}

/// Create all tables and the root group if absent.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<(), StoreError> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }

    let now = now_secs();
    sqlx::query(
        "INSERT OR IGNORE INTO groups (id, parent_id, name, created_at, updated_at)
         VALUES (?, NULL, 'Root', ?, ?)",
    )
    .bind(ROOT_GROUP_ID)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    debug!("schema ensured");
    Ok(())
}
