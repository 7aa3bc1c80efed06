//! Conversion of legacy plaintext objects into encrypted envelopes.
//!
//! The sweep walks catalog rows still flagged `encrypted = false` in id
//! order, reads each object raw from the wrapped backend and re-uploads it
//! through the [`EncryptedService`]. Objects that already carry the
//! envelope magic are left untouched. Running it again converts nothing.

use crate::catalog::{BlobCatalog, BlobRecord};
use crate::error::BlobStoreResult;
use sealstore_crypto::is_sealed;
use sealstore_storage::EncryptedService;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info};

pub const DEFAULT_BATCH_SIZE: usize = 100;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepOptions {
    /// Rows fetched from the catalog per batch.
    pub batch_size: usize,
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// A row the sweep could not convert.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SweepFailure {
    pub blob_id: i64,
    pub key: String,
    pub reason: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Legacy objects rewritten as envelopes.
    pub encrypted: usize,
    /// Objects that were already envelopes; only their flag was set.
    pub skipped: usize,
    pub failed: usize,
    pub failures: Vec<SweepFailure>,
}

impl SweepReport {
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

enum Outcome {
    Encrypted,
    Skipped,
}

pub struct MigrationSweeper {
    service: Arc<EncryptedService>,
    catalog: Arc<dyn BlobCatalog>,
    batch_size: usize,
}

impl MigrationSweeper {
    pub fn new(
        service: Arc<EncryptedService>,
        catalog: Arc<dyn BlobCatalog>,
        options: SweepOptions,
    ) -> Self {
        Self {
            service,
            catalog,
            batch_size: options.batch_size.max(1),
        }
    }

    /// Runs one full pass over the pending rows.
    ///
    /// Failures on individual rows are recorded in the report and do not
    /// stop the pass. A catalog error while listing rows aborts it.
    pub async fn run(&self) -> BlobStoreResult<SweepReport> {
        let mut report = SweepReport::default();
        let mut cursor = 0i64;

        loop {
            let batch = self.catalog.pending_after(cursor, self.batch_size)?;
            let Some(last) = batch.last() else {
                break;
            };
            cursor = last.id;
            debug!("Sweeping batch of {} blobs up to id {cursor}", batch.len());

            for record in &batch {
                match self.convert(record).await {
                    Ok(Outcome::Encrypted) => report.encrypted += 1,
                    Ok(Outcome::Skipped) => report.skipped += 1,
                    Err(e) => {
                        error!(
                            "Failed to encrypt blob {} ({}): {e}",
                            record.id, record.key
                        );
                        report.failed += 1;
                        report.failures.push(SweepFailure {
                            blob_id: record.id,
                            key: record.key.clone(),
                            reason: e.to_string(),
                        });
                    }
                }
            }

            if batch.len() < self.batch_size {
                break;
            }
        }

        info!(
            "Blob encryption sweep finished: {} encrypted, {} already encrypted, {} failed",
            report.encrypted, report.skipped, report.failed
        );
        Ok(report)
    }

    async fn convert(&self, record: &BlobRecord) -> BlobStoreResult<Outcome> {
        let raw = self.service.backend().get(&record.key).await?;

        let outcome = if is_sealed(&raw) {
            debug!("Blob {} ({}) already sealed", record.id, record.key);
            Outcome::Skipped
        } else {
            self.service.upload(&record.key, &raw).await?;
            info!("Encrypted blob {} ({})", record.id, record.key);
            Outcome::Encrypted
        };

        self.catalog.mark_encrypted(record.id)?;
        Ok(outcome)
    }
}

