//! S3 object operations.
//!
//! Stores whatever bytes it is handed; encryption happens one layer up in
//! `EncryptedService`. Object bodies are collected in full before being
//! returned.

use crate::config::S3Config;
use crate::error::{S3Error, S3Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::error::ProvideErrorMetadata;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_types::region::Region;
use sealstore_storage::{
    checksum as compute_checksum, DirectUploadOptions, Headers, StorageBackend, StorageResult,
    UrlOptions,
};
use std::ops::Range;
use std::time::Duration;
use tracing::debug;

/// S3-backed blob storage.
pub struct S3Backend {
    client: S3Client,
    bucket: String,
    prefix: String,
    presign_expiry: Duration,
}

impl S3Backend {
    /// Builds a client from `config`.
    ///
    /// Static credentials are used when both keys are set; otherwise the
    /// default AWS provider chain (env, profile, IMDS) is loaded.
    pub async fn connect(config: &S3Config) -> S3Result<Self> {
        config.validate()?;
        let region = Region::new(config.region.clone());

        let mut builder = match (&config.access_key_id, &config.secret_access_key) {
            (Some(access_key_id), Some(secret_access_key)) => {
                let credentials = aws_credential_types::Credentials::new(
                    access_key_id,
                    secret_access_key,
                    None,
                    None,
                    "sealstore-static",
                );
                aws_sdk_s3::Config::builder()
                    .region(region)
                    .credentials_provider(credentials)
                    .behavior_version_latest()
            }
            _ => {
                let shared = aws_config::defaults(BehaviorVersion::latest())
                    .region(region)
                    .load()
                    .await;
                aws_sdk_s3::config::Builder::from(&shared)
            }
        };

        if let Some(ref endpoint) = config.endpoint_override {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        } else if config.force_path_style {
            builder = builder.force_path_style(true);
        }

        Ok(Self::from_client(
            S3Client::from_conf(builder.build()),
            config,
        ))
    }

    /// Wraps an existing client.
    pub fn from_client(client: S3Client, config: &S3Config) -> Self {
        Self {
            client,
            bucket: config.bucket.clone(),
            prefix: normalize_prefix(config.prefix.as_deref()),
            presign_expiry: Duration::from_secs(config.presign_expiry_secs),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn full_key(&self, key: &str) -> String {
        join_key(&self.prefix, key)
    }

    fn presigning(&self, expires_in: Option<Duration>) -> S3Result<PresigningConfig> {
        PresigningConfig::expires_in(expires_in.unwrap_or(self.presign_expiry))
            .map_err(|e| S3Error::Presign(e.to_string()))
    }

    async fn upload(&self, key: &str, data: Vec<u8>, checksum: Option<&str>) -> S3Result<()> {
        let full_key = self.full_key(key);
        let size = data.len();

        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&full_key)
            .body(ByteStream::from(data));
        if let Some(sum) = checksum {
            request = request.checksum_sha256(sum);
        }

        request
            .send()
            .await
            .map_err(|e| S3Error::S3(format!("upload failed for {key}: {e}")))?;

        debug!("uploaded {size} bytes to s3://{}/{full_key}", self.bucket);
        Ok(())
    }

    /// GETs `key`, optionally restricted by a `Range` header.
    async fn download(&self, key: &str, range: Option<String>) -> S3Result<Vec<u8>> {
        let full_key = self.full_key(key);

        let resp = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&full_key)
            .set_range(range)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                let service_err = e.into_service_error();
                if service_err.is_no_such_key() {
                    return Err(S3Error::NotFound(key.to_string()));
                }
                if service_err.code() == Some("InvalidRange") {
                    return Ok(Vec::new());
                }
                return Err(S3Error::S3(format!(
                    "download failed for {key}: {service_err}"
                )));
            }
        };

        let body = resp
            .body
            .collect()
            .await
            .map_err(|e| S3Error::S3(format!("failed to read body for {key}: {e}")))?;

        let bytes = body.into_bytes().to_vec();
        debug!(
            "downloaded {} bytes from s3://{}/{full_key}",
            bytes.len(),
            self.bucket
        );
        Ok(bytes)
    }

    async fn head(&self, key: &str) -> S3Result<bool> {
        let full_key = self.full_key(key);
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(&full_key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                let service_err = e.into_service_error();
                if service_err.is_not_found() {
                    Ok(false)
                } else {
                    Err(S3Error::S3(format!(
                        "head object failed for {key}: {service_err}"
                    )))
                }
            }
        }
    }

    async fn remove(&self, key: &str) -> S3Result<()> {
        let full_key = self.full_key(key);
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(&full_key)
            .send()
            .await
            .map_err(|e| S3Error::S3(format!("delete failed for {key}: {e}")))?;
        Ok(())
    }

    /// Lists keys (without the configured prefix) starting with `prefix`.
    pub async fn list_keys(&self, prefix: &str) -> S3Result<Vec<String>> {
        let full_prefix = self.full_key(prefix);
        let mut keys = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let resp = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(&full_prefix)
                .set_continuation_token(continuation.take())
                .send()
                .await
                .map_err(|e| S3Error::S3(format!("list failed for prefix {prefix}: {e}")))?;

            keys.extend(
                resp.contents()
                    .iter()
                    .filter_map(|obj| obj.key())
                    .map(|k| strip_prefix(&self.prefix, k).to_string()),
            );

            match resp.next_continuation_token() {
                Some(token) if resp.is_truncated() == Some(true) => {
                    continuation = Some(token.to_string());
                }
                _ => break,
            }
        }

        Ok(keys)
    }
}

#[async_trait]
impl StorageBackend for S3Backend {
    async fn put(&self, key: &str, data: Vec<u8>, checksum: Option<&str>) -> StorageResult<()> {
        Ok(self.upload(key, data, checksum).await?)
    }

    async fn get(&self, key: &str) -> StorageResult<Vec<u8>> {
        Ok(self.download(key, None).await?)
    }

    async fn get_range(&self, key: &str, range: Range<u64>) -> StorageResult<Vec<u8>> {
        match range_header(&range) {
            Some(header) => Ok(self.download(key, Some(header)).await?),
            None => Ok(Vec::new()),
        }
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        Ok(self.remove(key).await?)
    }

    async fn delete_prefixed(&self, prefix: &str) -> StorageResult<()> {
        let keys = self.list_keys(prefix).await?;
        for key in &keys {
            self.remove(key).await?;
        }
        debug!("deleted {} objects under prefix {prefix}", keys.len());
        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        Ok(self.head(key).await?)
    }

    async fn direct_upload_url(
        &self,
        key: &str,
        opts: &DirectUploadOptions,
    ) -> StorageResult<String> {
        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(self.full_key(key));
        if let Some(ref content_type) = opts.content_type {
            request = request.content_type(content_type);
        }
        if let Some(len) = opts.content_length {
            request = request.content_length(len as i64);
        }
        if let Some(ref sum) = opts.checksum {
            request = request.checksum_sha256(sum);
        }

        let presigned = request
            .presigned(self.presigning(opts.expires_in)?)
            .await
            .map_err(|e| S3Error::Presign(format!("direct upload url for {key}: {e}")))?;
        Ok(presigned.uri().to_string())
    }

    async fn direct_upload_headers(
        &self,
        _key: &str,
        opts: &DirectUploadOptions,
    ) -> StorageResult<Headers> {
        Ok(upload_headers(opts))
    }

    async fn compose(&self, source_keys: &[String], dest_key: &str) -> StorageResult<()> {
        let mut combined = Vec::new();
        for source in source_keys {
            combined.extend_from_slice(&self.download(source, None).await?);
        }
        let sum = compute_checksum(&combined);
        Ok(self.upload(dest_key, combined, Some(&sum)).await?)
    }

    async fn url(&self, key: &str, opts: &UrlOptions) -> StorageResult<String> {
        let mut request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(self.full_key(key));
        if let Some(disposition) = opts.disposition {
            let value = disposition.header_value(opts.filename.as_deref());
            request = request.response_content_disposition(value);
        }
        if let Some(ref content_type) = opts.content_type {
            request = request.response_content_type(content_type);
        }

        let presigned = request
            .presigned(self.presigning(opts.expires_in)?)
            .await
            .map_err(|e| S3Error::Presign(format!("url for {key}: {e}")))?;
        Ok(presigned.uri().to_string())
    }
}

/// Headers a client must send with a presigned PUT.
pub fn upload_headers(opts: &DirectUploadOptions) -> Headers {
    let mut headers = Headers::new();
    if let Some(ref content_type) = opts.content_type {
        headers.insert("Content-Type".to_string(), content_type.clone());
    }
    if let Some(len) = opts.content_length {
        headers.insert("Content-Length".to_string(), len.to_string());
    }
    if let Some(ref sum) = opts.checksum {
        headers.insert("x-amz-checksum-sha256".to_string(), sum.clone());
    }
    headers
}

/// HTTP `Range` header for a half-open range; `None` when empty.
pub fn range_header(range: &Range<u64>) -> Option<String> {
    if range.start >= range.end {
        return None;
    }
    Some(format!("bytes={}-{}", range.start, range.end - 1))
}

fn normalize_prefix(prefix: Option<&str>) -> String {
    prefix.unwrap_or_default().trim_matches('/').to_string()
}

fn join_key(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}/{key}")
    }
}

fn strip_prefix<'a>(prefix: &str, full_key: &'a str) -> &'a str {
    if prefix.is_empty() {
        return full_key;
    }
    full_key
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('/'))
        .unwrap_or(full_key)
}
