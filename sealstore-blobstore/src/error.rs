//! Blob catalog and sweep error types.

use sealstore_storage::StorageError;
use thiserror::Error;

/// Result type for catalog and sweep operations.
pub type BlobStoreResult<T> = Result<T, BlobStoreError>;

#[derive(Debug, Error)]
pub enum BlobStoreError {
    #[error("blob not found: {0}")]
    NotFound(String),

    #[error("catalog error: {0}")]
    Catalog(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<rusqlite::Error> for BlobStoreError {
    fn from(err: rusqlite::Error) -> Self {
        BlobStoreError::Catalog(err.to_string())
    }
}
