//! The `TBX1` authenticated-encryption envelope.
//!
//! Blob layout: `"TBX1"` ‖ version ‖ 16-byte nonce ‖ 16-byte tag ‖
//! ciphertext (same length as the plaintext). Two subkeys are derived from
//! the caller's key via HMAC-SHA256 with fixed context strings; the
//! keystream is HMAC-SHA256 in counter mode over the nonce, and the tag is
//! the truncated HMAC-SHA256 of nonce ‖ ciphertext (encrypt-then-MAC).
//!
//! [`open`] verifies the tag before any decryption and collapses every
//! failure into `None`: callers cannot tell a bad magic from a bad tag.

use {
    hmac::{Hmac, Mac},
    rand::RngCore,
    sha2::Sha256,
    subtle::ConstantTimeEq,
    zeroize::Zeroizing,
};

type HmacSha256 = Hmac<Sha256>;

const MAGIC: &[u8; 4] = b"TBX1";
const VERSION: u8 = 0x01;
const NONCE_LEN: usize = 16;
const TAG_LEN: usize = 16;
const KEYSTREAM_BLOCK_LEN: usize = 32;
const HEADER_LEN: usize = MAGIC.len() + 1 + NONCE_LEN + TAG_LEN;

const ENC_CONTEXT: &[u8] = b"ToolboxPM/enc";
const MAC_CONTEXT: &[u8] = b"ToolboxPM/mac";

fn hmac_sha256(key: &[u8], parts: &[&[u8]]) -> [u8; 32] {
    // HMAC-SHA256 accepts keys of any length; construction cannot fail.
    #[allow(clippy::expect_used)]
    let mut mac = HmacSha256::new_from_slice(key).expect("hmac key length");
    for part in parts {
        mac.update(part);
    }
    mac.finalize().into_bytes().into()
}

fn derive_subkey(key: &[u8], context: &[u8]) -> Zeroizing<[u8; 32]> {
    Zeroizing::new(hmac_sha256(key, &[context]))
}

/// XOR `input` with the counter-mode keystream for `nonce`.
fn xor_stream(enc_key: &[u8; 32], nonce: &[u8], input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());

    for (block_index, chunk) in input.chunks(KEYSTREAM_BLOCK_LEN).enumerate() {
        let counter = (block_index as u32).to_be_bytes();
        let stream = Zeroizing::new(hmac_sha256(enc_key, &[nonce, &counter]));
        out.extend(chunk.iter().zip(stream.iter()).map(|(byte, key)| byte ^ key));
    }

    out
}

/// Seal `plaintext` under `key` into a self-contained envelope blob.
pub fn seal(key: &[u8], plaintext: &[u8]) -> Vec<u8> {
    let enc_key = derive_subkey(key, ENC_CONTEXT);
    let mac_key = derive_subkey(key, MAC_CONTEXT);

    let mut nonce = [0u8; NONCE_LEN];
    rand::rng().fill_bytes(&mut nonce);

    let ciphertext = xor_stream(&enc_key, &nonce, plaintext);
    let tag = hmac_sha256(mac_key.as_slice(), &[&nonce, &ciphertext]);

    let mut out = Vec::with_capacity(HEADER_LEN + ciphertext.len());
    out.extend_from_slice(MAGIC);
    out.push(VERSION);
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&tag[..TAG_LEN]);
    out.extend_from_slice(&ciphertext);
    out
}

/// Open an envelope previously produced by [`seal`].
///
/// Returns `None` on any verification failure — wrong key, tampered bytes,
/// truncation, unknown magic or version — without distinguishing the cause.
pub fn open(key: &[u8], blob: &[u8]) -> Option<Zeroizing<Vec<u8>>> {
    if blob.len() < HEADER_LEN {
        return None;
    }
    if &blob[..MAGIC.len()] != MAGIC || blob[MAGIC.len()] != VERSION {
        return None;
    }

    let nonce = &blob[MAGIC.len() + 1..MAGIC.len() + 1 + NONCE_LEN];
    let tag = &blob[HEADER_LEN - TAG_LEN..HEADER_LEN];
    let ciphertext = &blob[HEADER_LEN..];

    let mac_key = derive_subkey(key, MAC_CONTEXT);
    let expected = hmac_sha256(mac_key.as_slice(), &[nonce, ciphertext]);
    if !bool::from(expected[..TAG_LEN].ct_eq(tag)) {
        return None;
    }

    let enc_key = derive_subkey(key, ENC_CONTEXT);
    Some(Zeroizing::new(xor_stream(&enc_key, nonce, ciphertext)))
}
