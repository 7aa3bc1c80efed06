//! Envelope codec for objects at rest.
//!
//! Layout: `MAGIC | nonce | tag | ciphertext`. AES-256-GCM with a random
//! 96-bit nonce per object and the magic marker as AAD, so an envelope
//! cannot be reinterpreted under a different format version.
//!
//! Data that does not start with [`MAGIC`] is treated as a legacy
//! plaintext object and returned unchanged by [`open`].

use crate::error::{CryptoError, CryptoResult};
use crate::key::StorageKey;
use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce, Tag};
use rand::RngCore;

/// Format marker, version 1.
pub const MAGIC: &[u8; 6] = b"SSENC1";

/// AES-GCM nonce length.
pub const NONCE_SIZE: usize = 12;

/// AES-GCM authentication tag length.
pub const TAG_SIZE: usize = 16;

/// Bytes added on top of the plaintext length.
pub const ENVELOPE_OVERHEAD: usize = MAGIC.len() + NONCE_SIZE + TAG_SIZE;

const NONCE_OFFSET: usize = MAGIC.len();
const TAG_OFFSET: usize = NONCE_OFFSET + NONCE_SIZE;
const CIPHERTEXT_OFFSET: usize = TAG_OFFSET + TAG_SIZE;

/// Returns true if `data` carries the envelope marker.
pub fn is_sealed(data: &[u8]) -> bool {
    data.starts_with(MAGIC)
}

/// Length of the envelope produced for a plaintext of `plaintext_len` bytes.
pub fn sealed_len(plaintext_len: usize) -> usize {
    ENVELOPE_OVERHEAD + plaintext_len
}

fn cipher(key: &StorageKey) -> Aes256Gcm {
    Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()))
}

/// Encrypts `plaintext` into a fresh envelope.
///
/// A new nonce is drawn from the thread-local CSPRNG on every call.
pub fn seal(plaintext: &[u8], key: &StorageKey) -> CryptoResult<Vec<u8>> {
    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::rng().fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let mut out = Vec::with_capacity(sealed_len(plaintext.len()));
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&[0u8; TAG_SIZE]);
    out.extend_from_slice(plaintext);

    let tag = cipher(key)
        .encrypt_in_place_detached(nonce, MAGIC, &mut out[CIPHERTEXT_OFFSET..])
        .map_err(|e| CryptoError::Encryption(format!("AES-GCM seal failed: {e}")))?;
    out[TAG_OFFSET..CIPHERTEXT_OFFSET].copy_from_slice(&tag);

    Ok(out)
}

/// Decrypts an envelope, or passes legacy data through unchanged.
///
/// Fails with [`CryptoError::DecryptionFailed`] when the marker is present
/// but the envelope is truncated, was sealed under another key, or has been
/// modified. No plaintext is returned unless the tag verifies.
pub fn open(data: &[u8], key: &StorageKey) -> CryptoResult<Vec<u8>> {
    if !is_sealed(data) {
        return Ok(data.to_vec());
    }

    if data.len() < CIPHERTEXT_OFFSET {
        return Err(CryptoError::DecryptionFailed(format!(
            "truncated envelope: {} bytes, need at least {CIPHERTEXT_OFFSET}",
            data.len()
        )));
    }

    let nonce = Nonce::from_slice(&data[NONCE_OFFSET..TAG_OFFSET]);
    let tag = Tag::from_slice(&data[TAG_OFFSET..CIPHERTEXT_OFFSET]);

    let mut buffer = data[CIPHERTEXT_OFFSET..].to_vec();
    cipher(key)
        .decrypt_in_place_detached(nonce, MAGIC, &mut buffer, tag)
        .map_err(|_| {
            CryptoError::DecryptionFailed(
                "authentication failed (wrong key or tampered data)".to_string(),
            )
        })?;

    Ok(buffer)
}
