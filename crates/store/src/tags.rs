//! Tag rows and entry↔tag links.
//!
//! Tag names are stored with their original casing but matched
//! case-insensitively on attach, so "Dev" and "dev" resolve to one tag.

use sqlx::SqliteConnection;

use crate::error::StoreError;

/// Find a tag case-insensitively or create it with the given casing.
pub async fn upsert_tag(
    conn: &mut SqliteConnection,
    name: &str,
    now: i64,
) -> Result<i64, StoreError> {
    let existing: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM tags WHERE name = ? COLLATE NOCASE LIMIT 1")
            .bind(name)
            .fetch_optional(&mut *conn)
            .await?;

    if let Some((id,)) = existing {
        return Ok(id);
    }

    let result = sqlx::query("INSERT INTO tags (name, created_at, updated_at) VALUES (?, ?, ?)")
        .bind(name)
        .bind(now)
        .bind(now)
        .execute(&mut *conn)
        .await?;
    Ok(result.last_insert_rowid())
}

/// Attach tags to an entry. Blank names are skipped; existing links are
/// left alone.
pub async fn link_tags(
    conn: &mut SqliteConnection,
    entry_id: i64,
    tags: &[String],
    now: i64,
) -> Result<(), StoreError> {
    for tag in tags {
        let tag = tag.trim();
        if tag.is_empty() {
            continue;
        }

        let tag_id = upsert_tag(conn, tag, now).await?;
        sqlx::query(
            "INSERT OR IGNORE INTO entry_tags (entry_id, tag_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(entry_id)
        .bind(tag_id)
        .bind(now)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Replace an entry's tag set wholesale.
pub async fn replace_tags(
    conn: &mut SqliteConnection,
    entry_id: i64,
    tags: &[String],
    now: i64,
) -> Result<(), StoreError> {
    sqlx::query("DELETE FROM entry_tags WHERE entry_id = ?")
        .bind(entry_id)
        .execute(&mut *conn)
        .await?;

    link_tags(conn, entry_id, tags, now).await
}

/// Tag names attached to an entry, ascending.
pub async fn tags_for_entry(
    conn: &mut SqliteConnection,
    entry_id: i64,
) -> Result<Vec<String>, StoreError> {
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT t.name
         FROM tags t
         JOIN entry_tags et ON et.tag_id = t.id
         WHERE et.entry_id = ?
         ORDER BY t.name ASC",
    )
    .bind(entry_id)
    .fetch_all(conn)
    .await?;

    Ok(rows.into_iter().map(|(name,)| name).collect())
}
