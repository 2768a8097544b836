//! Encrypted `.tbxpm` backup files.
//!
//! A backup is a human-readable JSON wrapper whose `ciphertext` field
//! base64-encodes the sealed inner payload. The backup key is derived
//! from its own password with a fresh salt and independent iteration
//! count, so a backup's security never depends on the live vault's KDF
//! parameters.

pub mod codec;
pub mod error;

pub use {
    codec::{export_backup, import_backup},
    error::BackupError,
};
