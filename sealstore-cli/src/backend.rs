use crate::cli::BackendArgs;
use anyhow::Context;
use sealstore_s3::{S3Backend, S3Config};
use sealstore_storage::{EncryptedService, EncryptionConfig, LocalBackend, StorageBackend};
use std::sync::Arc;
use tracing::info;

/// S3 settings from the environment with command-line overrides applied.
pub(crate) fn s3_config<F>(args: &BackendArgs, env: F) -> anyhow::Result<S3Config>
where
    F: Fn(&str) -> Option<String>,
{
    let flag = |name: &str| match name {
        "S3_BUCKET" => args.s3_bucket.clone(),
        "S3_REGION" => args.s3_region.clone(),
        "S3_ENDPOINT" => args.s3_endpoint.clone(),
        "S3_PREFIX" => args.s3_prefix.clone(),
        _ => None,
    };
    let mut config = S3Config::from_lookup(|name| flag(name).or_else(|| env(name)))?;
    config.force_path_style |= args.s3_path_style;
    Ok(config)
}

pub(crate) async fn open_backend(args: &BackendArgs) -> anyhow::Result<Arc<dyn StorageBackend>> {
    if let Some(dir) = &args.local {
        let backend = LocalBackend::new(dir)
            .await
            .with_context(|| format!("opening {}", dir.display()))?;
        info!("Using local storage at {}", backend.root().display());
        return Ok(Arc::new(backend));
    }

    let config = s3_config(args, |name| std::env::var(name).ok())?;
    let backend = S3Backend::connect(&config).await?;
    info!("Using S3 bucket {}", backend.bucket());
    Ok(Arc::new(backend))
}

pub(crate) async fn open_service(args: &BackendArgs) -> anyhow::Result<Arc<EncryptedService>> {
    let backend = open_backend(args).await?;
    let config = EncryptionConfig::from_env()?;
    Ok(Arc::new(EncryptedService::new(backend, &config)?))
}
