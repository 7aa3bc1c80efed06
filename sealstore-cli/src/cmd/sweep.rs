use crate::backend::open_service;
use crate::cli::BackendArgs;
use anyhow::Context;
use sealstore_blobstore::{MigrationSweeper, SqliteBlobCatalog, SweepOptions};
use std::path::Path;
use std::sync::Arc;

pub(crate) async fn run(
    backend: &BackendArgs,
    catalog_path: &Path,
    batch_size: usize,
    json: bool,
) -> anyhow::Result<()> {
    let service = open_service(backend).await?;
    let catalog = SqliteBlobCatalog::open(catalog_path)
        .with_context(|| format!("opening catalog {}", catalog_path.display()))?;

    let sweeper = MigrationSweeper::new(service, Arc::new(catalog), SweepOptions { batch_size });
    let report = sweeper.run().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Encrypted:         {}", report.encrypted);
        println!("Already encrypted: {}", report.skipped);
        println!("Failed:            {}", report.failed);
        for failure in &report.failures {
            println!("  blob {} ({}): {}", failure.blob_id, failure.key, failure.reason);
        }
    }

    if !report.is_clean() {
        anyhow::bail!("{} blob(s) could not be encrypted", report.failed);
    }
    Ok(())
}
