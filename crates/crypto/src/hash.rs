//! Digest helpers for reuse grouping and breach lookups.
//!
//! SHA-1 appears here solely because the Pwned Passwords range API is keyed
//! by SHA-1; it is never used to protect anything.

use {
    sha1::Sha1,
    sha2::{Digest, Sha256},
};

/// SHA-256 digest of `data`.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// Uppercase hex SHA-1 digest of `data` (40 characters).
pub fn sha1_hex_upper(data: &[u8]) -> String {
    let digest = Sha1::digest(data);
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{byte:02X}"));
    }
    out
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_known_vector() {
        // SHA-256("abc")
        let digest = sha256(b"abc");
        assert_eq!(
            digest[..4],
            [0xba, 0x78, 0x16, 0xbf],
            "unexpected digest prefix"
        );
    }

    #[test]
    fn sha1_hex_known_vector() {
        // SHA-1("password"), the canonical breach-lookup example.
        assert_eq!(
            sha1_hex_upper(b"password"),
            "5BAA61E4C9B93F3F0682250B6CF8331B7EE68FD8"
        );
    }

    #[test]
    fn sha1_hex_is_40_uppercase_chars() {
        let hex = sha1_hex_upper(b"anything");
        assert_eq!(hex.len(), 40);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
    }
}
