//! Storage error types.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors raised by backends and by the encrypting adapter.
///
/// Backend failures pass through the adapter unchanged; only
/// `DecryptionFailed` and `Encryption` originate in the adapter itself.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("invalid storage key: {0}")]
    InvalidKey(String),

    #[error("checksum mismatch for {0}")]
    ChecksumMismatch(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("operation not supported by backend: {0}")]
    Unsupported(String),

    #[error("failed to decrypt {key}: {reason}")]
    DecryptionFailed { key: String, reason: String },

    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}
