//! Hierarchical group materialization.
//!
//! A category path like `A/B/C` is walked segment by segment under a base
//! group, creating missing segments. Name matching inside a parent is
//! case-insensitive; the stored casing is whatever was first created.

use std::collections::HashMap;

use sqlx::SqliteConnection;

use crate::{entry::ROOT_GROUP_ID, error::StoreError};

/// Cache of `(parent_id, lowercased name)` → group id, filled across one
/// import run so repeated paths cost one lookup.
pub type GroupCache = HashMap<(i64, String), i64>;

/// Find or create one group under `parent_id`. Empty names resolve to the
/// parent itself.
pub async fn ensure_group(
    conn: &mut SqliteConnection,
    parent_id: i64,
    name: &str,
    now: i64,
    cache: &mut GroupCache,
) -> Result<i64, StoreError> {
    let name = name.trim();
    if name.is_empty() {
        return Ok(parent_id);
    }

    let parent_id = if parent_id > 0 { parent_id } else { ROOT_GROUP_ID };
    let cache_key = (parent_id, name.to_lowercase());
    if let Some(&id) = cache.get(&cache_key) {
        return Ok(id);
    }

    let existing: Option<(i64,)> = sqlx::query_as(
        "SELECT id FROM groups
         WHERE parent_id = ? AND name = ? COLLATE NOCASE
         LIMIT 1",
    )
    .bind(parent_id)
    .bind(name)
    .fetch_optional(&mut *conn)
    .await?;

    let id = match existing {
        Some((id,)) => id,
        None => {
            let result = sqlx::query(
                "INSERT INTO groups (parent_id, name, created_at, updated_at)
                 VALUES (?, ?, ?, ?)",
            )
            .bind(parent_id)
            .bind(name)
            .bind(now)
            .bind(now)
            .execute(&mut *conn)
            .await?;
            result.last_insert_rowid()
        },
    };

    cache.insert(cache_key, id);
    Ok(id)
}

/// Walk or create every segment of `path` (split on `/` or `\`) under
/// `base_group_id` and return the terminal group id.
pub async fn ensure_group_path(
    conn: &mut SqliteConnection,
    base_group_id: i64,
    path: &str,
    now: i64,
    cache: &mut GroupCache,
) -> Result<i64, StoreError> {
    let mut parent_id = if base_group_id > 0 {
        base_group_id
    } else {
        ROOT_GROUP_ID
    };

    for segment in path.split(['/', '\\']).filter(|s| !s.trim().is_empty()) {
        parent_id = ensure_group(conn, parent_id, segment, now, cache).await?;
    }

    Ok(parent_id)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_pool;

    #[tokio::test]
    async fn path_segments_are_created_once() {
        let tmp = tempfile::tempdir().unwrap();
        let pool = open_pool(&tmp.path().join("db.sqlite3")).await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        let mut cache = GroupCache::new();

        let leaf = ensure_group_path(&mut conn, ROOT_GROUP_ID, "Work/Email", 10, &mut cache)
            .await
            .unwrap();
        let again = ensure_group_path(&mut conn, ROOT_GROUP_ID, "work\\EMAIL", 20, &mut cache)
            .await
            .unwrap();
        assert_eq!(leaf, again, "case-insensitive match within a parent");

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(1) FROM groups WHERE id <> 1")
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn empty_path_resolves_to_base() {
        let tmp = tempfile::tempdir().unwrap();
        let pool = open_pool(&tmp.path().join("db.sqlite3")).await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        let mut cache = GroupCache::new();

        let id = ensure_group_path(&mut conn, ROOT_GROUP_ID, "  ", 10, &mut cache)
            .await
            .unwrap();
        assert_eq!(id, ROOT_GROUP_ID);
    }

    #[tokio::test]
    async fn same_name_under_different_parents() {
        let tmp = tempfile::tempdir().unwrap();
        let pool = open_pool(&tmp.path().join("db.sqlite3")).await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        let mut cache = GroupCache::new();

        let a = ensure_group_path(&mut conn, ROOT_GROUP_ID, "A/Shared", 10, &mut cache)
            .await
            .unwrap();
        let b = ensure_group_path(&mut conn, ROOT_GROUP_ID, "B/Shared", 10, &mut cache)
            .await
            .unwrap();
        assert_ne!(a, b);
    }
}
