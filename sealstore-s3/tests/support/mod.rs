//! Shared helpers for integration tests against a local MinIO.

#![allow(dead_code)]

use sealstore_s3::{S3Backend, S3Config};
use uuid::Uuid;

/// Backend pointing at local MinIO (docker-compose.test.yml), scoped to a
/// per-test prefix so runs never collide.
pub async fn test_backend() -> S3Backend {
    let config = S3Config {
        prefix: Some(unique_prefix()),
        ..S3Config::minio()
    };
    S3Backend::connect(&config)
        .await
        .expect("MinIO config must be valid")
}

/// Per-test unique key prefix.
pub fn unique_prefix() -> String {
    format!("test-runs/{}", Uuid::new_v4())
}
