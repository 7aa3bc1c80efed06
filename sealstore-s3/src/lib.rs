//! S3-compatible object storage backend for SealStore.
//!
//! [`S3Backend`] implements [`sealstore_storage::StorageBackend`] on top of
//! `aws-sdk-s3`: object CRUD, ranged GETs, presigned direct-upload and
//! download URLs, and compose. Works against AWS S3 or any compatible
//! endpoint (MinIO in tests).

pub mod config;
pub mod error;
pub mod s3_backend;

pub use config::S3Config;
pub use error::{S3Error, S3Result};
pub use s3_backend::S3Backend;
