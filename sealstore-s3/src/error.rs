//! S3 backend error types.

use sealstore_storage::StorageError;
use thiserror::Error;

/// Result type for S3 operations.
pub type S3Result<T> = Result<T, S3Error>;

#[derive(Debug, Error)]
pub enum S3Error {
    #[error("S3 operation failed: {0}")]
    S3(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("presigning failed: {0}")]
    Presign(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<S3Error> for StorageError {
    fn from(err: S3Error) -> Self {
        match err {
            S3Error::NotFound(key) => StorageError::NotFound(key),
            S3Error::Config(msg) => StorageError::Config(msg),
            other => StorageError::Backend(other.to_string()),
        }
    }
}
