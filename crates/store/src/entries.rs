//! Row-level access to `password_entries`.

use sqlx::SqliteConnection;

use crate::{
    entry::{Entry, EntryRow, EntryType, NewEntry},
    error::StoreError,
};

type SummaryTuple = (i64, i64, i64, String, String, String, String, i64, i64);

fn entry_from_tuple(row: SummaryTuple) -> Entry {
    let (id, group_id, entry_type, title, username, url, category, created_at, updated_at) = row;
    Entry {
        id,
        group_id,
        entry_type: EntryType::from_i64(entry_type),
        title,
        username,
        url,
        category,
        created_at,
        updated_at,
        tags: Vec::new(),
    }
}

pub async fn count(conn: &mut SqliteConnection) -> Result<i64, StoreError> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(1) FROM password_entries")
        .fetch_one(conn)
        .await?;
    Ok(count)
}

/// Non-secret columns of every entry, most recently updated first.
pub async fn list_summaries(conn: &mut SqliteConnection) -> Result<Vec<Entry>, StoreError> {
    let rows: Vec<SummaryTuple> = sqlx::query_as(
        "SELECT id, group_id, entry_type, title, username, url, category, created_at, updated_at
         FROM password_entries
         ORDER BY updated_at DESC",
    )
    .fetch_all(conn)
    .await?;

    Ok(rows.into_iter().map(entry_from_tuple).collect())
}

/// Distinct non-empty categories, ascending.
pub async fn list_categories(conn: &mut SqliteConnection) -> Result<Vec<String>, StoreError> {
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT DISTINCT category
         FROM password_entries
         WHERE category <> ''
         ORDER BY category ASC",
    )
    .fetch_all(conn)
    .await?;

    Ok(rows.into_iter().map(|(category,)| category).collect())
}

/// One full row including sealed blobs.
pub async fn load_row(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<EntryRow>, StoreError> {
    let row: Option<(
        i64,
        i64,
        i64,
        String,
        String,
        String,
        String,
        i64,
        i64,
        Vec<u8>,
        Vec<u8>,
    )> = sqlx::query_as(
        "SELECT id, group_id, entry_type, title, username, url, category,
                created_at, updated_at, password_enc, notes_enc
         FROM password_entries
         WHERE id = ?
         LIMIT 1",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(row.map(
        |(
            id,
            group_id,
            entry_type,
            title,
            username,
            url,
            category,
            created_at,
            updated_at,
            password_enc,
            notes_enc,
        )| {
            EntryRow {
                entry: entry_from_tuple((
                    id, group_id, entry_type, title, username, url, category, created_at,
                    updated_at,
                )),
                password_enc,
                notes_enc,
            }
        },
    ))
}

/// Insert a row; returns the new id.
pub async fn insert(conn: &mut SqliteConnection, row: &NewEntry) -> Result<i64, StoreError> {
    let result = sqlx::query(
        "INSERT INTO password_entries
            (group_id, entry_type, title, username, url, category,
             password_enc, notes_enc, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(row.group_id)
    .bind(row.entry_type.as_i64())
    .bind(&row.title)
    .bind(&row.username)
    .bind(&row.url)
    .bind(&row.category)
    .bind(&row.password_enc)
    .bind(&row.notes_enc)
    .bind(row.created_at)
    .bind(row.updated_at)
    .execute(conn)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Rewrite every mutable column of an existing row. `created_at` is never
/// touched. Returns the number of rows affected.
pub async fn update(
    conn: &mut SqliteConnection,
    id: i64,
    row: &NewEntry,
) -> Result<u64, StoreError> {
    let result = sqlx::query(
        "UPDATE password_entries
         SET group_id = ?, entry_type = ?, title = ?, username = ?, url = ?,
             category = ?, password_enc = ?, notes_enc = ?, updated_at = ?
         WHERE id = ?",
    )
    .bind(row.group_id)
    .bind(row.entry_type.as_i64())
    .bind(&row.title)
    .bind(&row.username)
    .bind(&row.url)
    .bind(&row.category)
    .bind(&row.password_enc)
    .bind(&row.notes_enc)
    .bind(row.updated_at)
    .bind(id)
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

pub async fn delete(conn: &mut SqliteConnection, id: i64) -> Result<u64, StoreError> {
    let result = sqlx::query("DELETE FROM password_entries WHERE id = ?")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

/// `(id, password_enc, notes_enc)` for every entry — the master-password
/// rotation walks this.
pub async fn sealed_fields(
    conn: &mut SqliteConnection,
) -> Result<Vec<(i64, Vec<u8>, Vec<u8>)>, StoreError> {
    let rows = sqlx::query_as(
        "SELECT id, password_enc, notes_enc FROM password_entries ORDER BY id ASC",
    )
    .fetch_all(conn)
    .await?;
    Ok(rows)
}

pub async fn update_sealed_fields(
    conn: &mut SqliteConnection,
    id: i64,
    password_enc: &[u8],
    notes_enc: &[u8],
) -> Result<(), StoreError> {
    sqlx::query("UPDATE password_entries SET password_enc = ?, notes_enc = ? WHERE id = ?")
        .bind(password_enc)
        .bind(notes_enc)
        .bind(id)
        .execute(conn)
        .await?;
    Ok(())
}
