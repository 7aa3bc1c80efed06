use anyhow::Context;
use sealstore_blobstore::SqliteBlobCatalog;
use std::path::Path;

pub(crate) fn run(catalog_path: &Path) -> anyhow::Result<()> {
    let catalog = SqliteBlobCatalog::open(catalog_path)
        .with_context(|| format!("opening catalog {}", catalog_path.display()))?;

    let counts = catalog.counts()?;

    println!("Blobs:     {}", counts.total);
    println!("Pending:   {}", counts.pending);
    println!("Encrypted: {}", counts.encrypted());
    Ok(())
}
