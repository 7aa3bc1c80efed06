//! S3 backend configuration.

use crate::error::{S3Error, S3Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Connection settings for an S3-compatible bucket.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct S3Config {
    /// Bucket name.
    pub bucket: String,

    /// AWS region.
    pub region: String,

    /// Optional endpoint override (MinIO, R2, ...). Implies path-style
    /// addressing.
    pub endpoint_override: Option<String>,

    /// Static access key. When unset, the default AWS credential chain is
    /// used.
    pub access_key_id: Option<String>,

    #[serde(skip_serializing)]
    pub secret_access_key: Option<String>,

    /// Key prefix prepended to every object key.
    pub prefix: Option<String>,

    /// Validity of presigned URLs in seconds.
    pub presign_expiry_secs: u64,

    pub force_path_style: bool,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            bucket: "sealstore".to_string(),
            region: "us-east-1".to_string(),
            endpoint_override: None,
            access_key_id: None,
            secret_access_key: None,
            prefix: None,
            presign_expiry_secs: 300, // 5 minutes
            force_path_style: false,
        }
    }
}

impl fmt::Debug for S3Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Config")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("endpoint_override", &self.endpoint_override)
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("prefix", &self.prefix)
            .field("presign_expiry_secs", &self.presign_expiry_secs)
            .field("force_path_style", &self.force_path_style)
            .finish()
    }
}

impl S3Config {
    /// Reads `S3_BUCKET`, `S3_REGION` (or `AWS_REGION`), `S3_ENDPOINT`,
    /// `S3_PREFIX`, `AWS_ACCESS_KEY_ID` and `AWS_SECRET_ACCESS_KEY`.
    pub fn from_env() -> S3Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`Self::from_env`] with an injected variable lookup.
    pub fn from_lookup<F>(lookup: F) -> S3Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let config = Self {
            bucket: read("S3_BUCKET").unwrap_or(defaults.bucket),
            region: read("S3_REGION")
                .or_else(|| read("AWS_REGION"))
                .unwrap_or(defaults.region),
            endpoint_override: read("S3_ENDPOINT"),
            access_key_id: read("AWS_ACCESS_KEY_ID"),
            secret_access_key: read("AWS_SECRET_ACCESS_KEY"),
            prefix: read("S3_PREFIX"),
            ..defaults
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks for settings the SDK would only reject at request time.
    pub fn validate(&self) -> S3Result<()> {
        if self.bucket.trim().is_empty() {
            return Err(S3Error::Config("bucket name is empty".to_string()));
        }
        if self.access_key_id.is_some() != self.secret_access_key.is_some() {
            return Err(S3Error::Config(
                "access_key_id and secret_access_key must be set together".to_string(),
            ));
        }
        if self.presign_expiry_secs == 0 {
            return Err(S3Error::Config(
                "presign_expiry_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Config for the MinIO instance in `docker-compose.test.yml`.
    pub fn minio() -> Self {
        Self {
            bucket: "sealstore-test".to_string(),
            endpoint_override: Some("http://localhost:9000".to_string()),
            access_key_id: Some("sealstore-test".to_string()),
            secret_access_key: Some("sealstore-test-secret".to_string()),
            force_path_style: true,
            ..Self::default()
        }
    }
}
