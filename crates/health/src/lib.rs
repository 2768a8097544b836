//! Full-vault password health analysis.
//!
//! A background scan over every stored entry: strength scoring, reuse
//! grouping by SHA-256, staleness by last update, and an optional breach
//! lookup against the Pwned Passwords range API using the k-anonymity
//! 5-character SHA-1 prefix, backed by an offline cache. Plaintext exists
//! only transiently in zeroed buffers; nothing decrypted ever leaves the
//! worker.

pub mod analyzer;
pub mod error;
pub mod pwned;
pub mod types;

pub use {
    analyzer::{HealthAnalyzer, Progress},
    error::HealthError,
    types::HealthItem,
};
