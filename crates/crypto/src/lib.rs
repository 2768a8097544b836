//! Cryptographic primitives for the Toolbox password vault.
//!
//! Everything sealed at rest (entry fields, the unlock verifier, backup
//! payloads) uses the same fixed-layout envelope built from HMAC-SHA256
//! subkeys; see [`envelope`]. Keys are derived with PBKDF2-SHA256 and held
//! in [`zeroize::Zeroizing`] buffers so they are wiped on drop.

pub mod envelope;
pub mod hash;
pub mod kdf;

pub use {
    envelope::{open, seal},
    hash::{sha1_hex_upper, sha256},
    kdf::{DEFAULT_KDF_ITERATIONS, KdfConfig, MIN_KDF_ITERATIONS, derive_key, generate_salt},
};
