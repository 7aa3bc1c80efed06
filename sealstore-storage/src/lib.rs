//! Encrypted blob storage for SealStore.
//!
//! [`EncryptedService`] wraps any [`StorageBackend`] and seals every object
//! on the way in and opens it on the way out. Objects written before
//! encryption was enabled are read back unchanged.
//!
//! Backends shipped here:
//! - [`MemoryBackend`] for tests and ephemeral use
//! - [`LocalBackend`] for a directory on local disk
//!
//! The S3 backend lives in `sealstore-s3`.

pub mod backend;
pub mod config;
pub mod encrypted;
mod error;
pub mod local;
pub mod memory;

pub use backend::{
    checksum, clamp_range, DirectUploadOptions, Disposition, Headers, StorageBackend, UrlOptions,
};
pub use config::{EncryptionConfig, Environment, KeySource};
pub use encrypted::EncryptedService;
pub use error::{StorageError, StorageResult};
pub use local::LocalBackend;
pub use memory::MemoryBackend;
