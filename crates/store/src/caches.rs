//! Content-addressed freshness caches: favicons and pwned-range bodies.
//!
//! Both tables map a key to an opaque body plus a `fetched_at` timestamp.
//! Staleness never deletes anything; consumers re-fetch when a network
//! path is allowed and overwrite in place.

use sqlx::SqliteConnection;

use crate::error::StoreError;

/// Favicons older than this are considered stale.
pub const FAVICON_TTL_SECS: i64 = 14 * 86_400;

/// Pwned-range bodies older than this are considered stale.
pub const PWNED_PREFIX_TTL_SECS: i64 = 30 * 86_400;

/// A cached body with its fetch timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedBody {
    pub body: Vec<u8>,
    pub fetched_at: i64,
}

/// Whether a cache row fetched at `fetched_at` is still usable at `now`.
/// Rows from the future are treated as stale.
pub fn is_fresh(fetched_at: i64, now: i64, ttl_secs: i64) -> bool {
    let age = now - fetched_at;
    (0..=ttl_secs).contains(&age)
}

pub async fn load_favicon(
    conn: &mut SqliteConnection,
    host: &str,
) -> Result<Option<CachedBody>, StoreError> {
    load(conn, "SELECT icon, fetched_at FROM favicon_cache WHERE host = ? LIMIT 1", host).await
}

pub async fn save_favicon(
    conn: &mut SqliteConnection,
    host: &str,
    icon: &[u8],
    fetched_at: i64,
) -> Result<(), StoreError> {
    sqlx::query("INSERT OR REPLACE INTO favicon_cache (host, icon, fetched_at) VALUES (?, ?, ?)")
        .bind(host)
        .bind(icon)
        .bind(fetched_at)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn load_pwned_prefix(
    conn: &mut SqliteConnection,
    prefix: &str,
) -> Result<Option<CachedBody>, StoreError> {
    load(
        conn,
        "SELECT body, fetched_at FROM pwned_prefix_cache WHERE prefix = ? LIMIT 1",
        prefix,
    )
    .await
}

pub async fn save_pwned_prefix(
    conn: &mut SqliteConnection,
    prefix: &str,
    body: &[u8],
    fetched_at: i64,
) -> Result<(), StoreError> {
    sqlx::query(
        "INSERT OR REPLACE INTO pwned_prefix_cache (prefix, body, fetched_at) VALUES (?, ?, ?)",
    )
    .bind(prefix)
    .bind(body)
    .bind(fetched_at)
    .execute(conn)
    .await?;
    Ok(())
}

async fn load(
    conn: &mut SqliteConnection,
    sql: &str,
    key: &str,
) -> Result<Option<CachedBody>, StoreError> {
    let row: Option<(Vec<u8>, i64)> = sqlx::query_as(sql).bind(key).fetch_optional(conn).await?;
    Ok(row
        .map(|(body, fetched_at)| CachedBody { body, fetched_at })
        .filter(|cached| !cached.body.is_empty()))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_pool;

    #[test]
    fn freshness_window() {
        assert!(is_fresh(100, 100, PWNED_PREFIX_TTL_SECS));
        assert!(is_fresh(100, 100 + PWNED_PREFIX_TTL_SECS, PWNED_PREFIX_TTL_SECS));
        assert!(!is_fresh(100, 101 + PWNED_PREFIX_TTL_SECS, PWNED_PREFIX_TTL_SECS));
        // Clock went backwards: stale.
        assert!(!is_fresh(200, 100, PWNED_PREFIX_TTL_SECS));
    }

    #[tokio::test]
    async fn pwned_prefix_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let pool = open_pool(&tmp.path().join("db.sqlite3")).await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        assert!(load_pwned_prefix(&mut conn, "5BAA6").await.unwrap().is_none());

        save_pwned_prefix(&mut conn, "5BAA6", b"SUFFIX:1", 100).await.unwrap();
        let cached = load_pwned_prefix(&mut conn, "5BAA6").await.unwrap().unwrap();
        assert_eq!(cached.body, b"SUFFIX:1");
        assert_eq!(cached.fetched_at, 100);

        // Overwrite in place.
        save_pwned_prefix(&mut conn, "5BAA6", b"SUFFIX:2", 200).await.unwrap();
        let cached = load_pwned_prefix(&mut conn, "5BAA6").await.unwrap().unwrap();
        assert_eq!(cached.fetched_at, 200);
    }

    #[tokio::test]
    async fn empty_bodies_read_as_absent() {
        let tmp = tempfile::tempdir().unwrap();
        let pool = open_pool(&tmp.path().join("db.sqlite3")).await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        save_favicon(&mut conn, "example.com", b"", 100).await.unwrap();
        assert!(load_favicon(&mut conn, "example.com").await.unwrap().is_none());

        save_favicon(&mut conn, "example.com", b"\x89PNG", 100).await.unwrap();
        assert!(load_favicon(&mut conn, "example.com").await.unwrap().is_some());
    }
}
