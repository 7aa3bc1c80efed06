//! Encryption layer for SealStore.
//!
//! Provides whole-object encryption at rest using:
//! - HKDF-SHA256 to turn operator key material into a storage key
//! - AES-256-GCM for authenticated encryption
//! - A fixed binary envelope so encrypted objects are self-identifying
//!
//! # Envelope format
//!
//! ```text
//! "SSENC1" (6) | nonce (12) | tag (16) | ciphertext (N)
//! ```
//!
//! The magic marker is bound into the authentication tag as additional
//! authenticated data. Anything that does not begin with the marker is a
//! legacy plaintext object and is passed through untouched on open.

pub mod envelope;
mod error;
mod key;

pub use envelope::{
    is_sealed, open, seal, sealed_len, ENVELOPE_OVERHEAD, MAGIC, NONCE_SIZE, TAG_SIZE,
};
pub use error::{CryptoError, CryptoResult};
pub use key::{derive_key, StorageKey, KDF_INFO, KDF_SALT, KEY_SIZE};
