//! PBKDF2-SHA256 derivation of the 256-bit master key.

use {pbkdf2::pbkdf2_hmac, rand::RngCore, sha2::Sha256, zeroize::Zeroizing};

/// Iteration count written into newly created vaults and backups.
pub const DEFAULT_KDF_ITERATIONS: u32 = 120_000;

/// Lowest iteration count ever accepted for a vault.
pub const MIN_KDF_ITERATIONS: u32 = 100_000;

const SALT_LEN: usize = 16;

/// KDF parameters for a vault. Stored in the meta row so the iteration
/// count can be raised for new vaults without breaking existing ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfConfig {
    iterations: u32,
}

impl KdfConfig {
    /// Build a config, clamping the iteration count to the accepted floor.
    pub fn new(iterations: u32) -> Self {
        Self {
            iterations: iterations.max(MIN_KDF_ITERATIONS),
        }
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }
}

impl Default for KdfConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_KDF_ITERATIONS,
        }
    }
}

/// Derive a 256-bit key from a password and salt.
///
/// Deterministic: identical inputs always yield the same key.
pub fn derive_key(password: &[u8], salt: &[u8], iterations: u32) -> Zeroizing<[u8; 32]> {
    let mut out = Zeroizing::new([0u8; 32]);
    pbkdf2_hmac::<Sha256>(password, salt, iterations, out.as_mut());
    out
}

/// Generate a random 16-byte salt.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    salt
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    // Tests use a low iteration count; the floor only binds real vaults.
    const TEST_ITERATIONS: u32 = 1_000;

    #[test]
    fn derive_key_deterministic() {
        let key1 = derive_key(b"password", b"test-salt-16byte", TEST_ITERATIONS);
        let key2 = derive_key(b"password", b"test-salt-16byte", TEST_ITERATIONS);
        assert_eq!(*key1, *key2);
    }

    #[test]
    fn different_passwords_different_keys() {
        let key1 = derive_key(b"password1", b"test-salt-16byte", TEST_ITERATIONS);
        let key2 = derive_key(b"password2", b"test-salt-16byte", TEST_ITERATIONS);
        assert_ne!(*key1, *key2);
    }

    #[test]
    fn different_salts_different_keys() {
        let key1 = derive_key(b"password", b"salt-aaaaaaaaaaaa", TEST_ITERATIONS);
        let key2 = derive_key(b"password", b"salt-bbbbbbbbbbbb", TEST_ITERATIONS);
        assert_ne!(*key1, *key2);
    }

    #[test]
    fn different_iterations_different_keys() {
        let key1 = derive_key(b"password", b"test-salt-16byte", TEST_ITERATIONS);
        let key2 = derive_key(b"password", b"test-salt-16byte", TEST_ITERATIONS + 1);
        assert_ne!(*key1, *key2);
    }

    #[test]
    fn salt_length() {
        assert_eq!(generate_salt().len(), 16);
    }

    #[test]
    fn config_clamps_to_floor() {
        assert_eq!(KdfConfig::new(1).iterations(), MIN_KDF_ITERATIONS);
        assert_eq!(KdfConfig::new(200_000).iterations(), 200_000);
        assert_eq!(KdfConfig::default().iterations(), DEFAULT_KDF_ITERATIONS);
    }
}
