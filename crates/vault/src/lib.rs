//! Vault state machine and the typed repository over encrypted entries.
//!
//! The vault owns the in-memory master key (derived from the master
//! password via PBKDF2) and mediates every seal/open. Unlock is gated by a
//! known-plaintext verifier blob — no entry is ever decrypted to test a
//! password. The repository composes sealing with row I/O and enforces the
//! unlocked precondition per call.

pub mod error;
pub mod repository;
pub mod vault;

pub use {
    error::VaultError,
    repository::Repository,
    vault::{Vault, VaultStatus},
};
