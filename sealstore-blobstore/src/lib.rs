//! Blob catalog and migration of legacy objects to encrypted envelopes.
//!
//! The catalog mirrors the application's blob records, including the
//! `encrypted` flag used to track migration progress. The flag is a hint:
//! whether an object is actually encrypted is decided by its stored bytes.

pub mod catalog;
mod error;
pub mod sweeper;

pub use catalog::{BlobCatalog, BlobRecord, CatalogCounts, NewBlob, SqliteBlobCatalog};
pub use error::{BlobStoreError, BlobStoreResult};
pub use sweeper::{MigrationSweeper, SweepFailure, SweepOptions, SweepReport};
