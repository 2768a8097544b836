//! SQLite persistence for the Toolbox password vault.
//!
//! This crate owns the schema and the row-level data access; it never
//! touches key material or plaintext secrets. Sealed fields pass through as
//! opaque blobs. DAO functions take `&mut SqliteConnection` so the same
//! code runs inside a transaction or on a plain pool connection.

pub mod caches;
pub mod db;
pub mod entries;
pub mod entry;
pub mod error;
pub mod groups;
pub mod meta;
pub mod paths;
pub mod tags;

pub use {
    db::{ensure_schema, open_pool, open_worker_pool},
    entry::{Entry, EntryRow, EntrySecrets, EntryType, NewEntry, ROOT_GROUP_ID},
    error::StoreError,
    meta::VaultMeta,
};

/// Current time as integer seconds since the epoch.
pub fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}
