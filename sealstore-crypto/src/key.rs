//! Storage key derivation.

use crate::error::{CryptoError, CryptoResult};
use hkdf::Hkdf;
use sha2::Sha256;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of the derived AES-256 key in bytes.
pub const KEY_SIZE: usize = 32;

/// HKDF salt. Changing this makes every existing envelope unreadable.
pub const KDF_SALT: &[u8] = b"signsuite-storage-encryption";

/// HKDF info string separating storage encryption from other uses of the
/// same master secret.
pub const KDF_INFO: &[u8] = b"active-storage-file-encryption";

/// A 256-bit key used to seal and open storage envelopes.
///
/// Zeroized on drop. `Debug` never prints key bytes.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct StorageKey([u8; KEY_SIZE]);

impl StorageKey {
    /// Wraps raw key bytes.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Returns the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl fmt::Debug for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StorageKey([REDACTED])")
    }
}

/// Derives the storage key from operator-supplied key material.
///
/// HKDF-SHA256 with the fixed [`KDF_SALT`] and [`KDF_INFO`]. Deterministic:
/// the same material always yields the same key.
pub fn derive_key(key_material: &[u8]) -> CryptoResult<StorageKey> {
    let hk = Hkdf::<Sha256>::new(Some(KDF_SALT), key_material);
    let mut okm = [0u8; KEY_SIZE];
    hk.expand(KDF_INFO, &mut okm)
        .map_err(|e| CryptoError::KeyDerivation(format!("HKDF expand failed: {e}")))?;
    let key = StorageKey(okm);
    okm.zeroize();
    Ok(key)
}
