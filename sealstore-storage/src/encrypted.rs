//! Transparent encryption over any [`StorageBackend`].
//!
//! Every upload is sealed before it reaches the backend and every download
//! is opened after it leaves. Objects without the envelope marker were
//! written before encryption was enabled and are returned as stored.
//!
//! GCM authenticates the whole object with one tag, so downloads and range
//! reads always fetch and verify the complete object first. Range reads
//! over large encrypted objects therefore cost a full download.

use crate::backend::{
    checksum as compute_checksum, clamp_range, DirectUploadOptions, Headers, StorageBackend,
    UrlOptions,
};
use crate::config::EncryptionConfig;
use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use sealstore_crypto::{is_sealed, open, seal, StorageKey};
use std::ops::Range;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, error, info};

/// Encrypting wrapper around a raw backend.
///
/// The storage key is derived once at construction and shared read-only by
/// all operations.
pub struct EncryptedService {
    backend: Arc<dyn StorageBackend>,
    key: StorageKey,
}

impl EncryptedService {
    /// Wraps `backend`, deriving the storage key from `config`.
    pub fn new(backend: Arc<dyn StorageBackend>, config: &EncryptionConfig) -> StorageResult<Self> {
        let key = config.storage_key()?;
        Ok(Self { backend, key })
    }

    /// Wraps `backend` with an already-derived key.
    pub fn with_key(backend: Arc<dyn StorageBackend>, key: StorageKey) -> Self {
        Self { backend, key }
    }

    /// The wrapped backend. Reads through it return stored bytes as-is.
    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    /// Seals `content` and stores it under `key`.
    ///
    /// The checksum handed to the backend covers the sealed bytes, since
    /// that is what the backend persists.
    pub async fn upload(&self, key: &str, content: &[u8]) -> StorageResult<()> {
        let sealed =
            seal(content, &self.key).map_err(|e| StorageError::Encryption(e.to_string()))?;
        let sealed_checksum = compute_checksum(&sealed);
        let size = sealed.len();

        self.backend.put(key, sealed, Some(&sealed_checksum)).await?;

        debug!("uploaded {key}: {} plaintext bytes, {size} sealed", content.len());
        Ok(())
    }

    /// Reads `reader` to the end, then uploads it like [`Self::upload`].
    pub async fn upload_reader<R>(&self, key: &str, mut reader: R) -> StorageResult<()>
    where
        R: AsyncRead + Unpin + Send,
    {
        let mut content = Vec::new();
        reader.read_to_end(&mut content).await?;
        self.upload(key, &content).await
    }

    /// Fetches and opens the object under `key`.
    pub async fn download(&self, key: &str) -> StorageResult<Vec<u8>> {
        let stored = self.backend.get(key).await?;
        self.decode(key, &stored)
    }

    /// Returns `range` of the plaintext. Downloads the whole object.
    pub async fn download_range(&self, key: &str, range: Range<u64>) -> StorageResult<Vec<u8>> {
        let plaintext = self.download(key).await?;
        let range = clamp_range(plaintext.len(), range);
        Ok(plaintext[range].to_vec())
    }

    pub async fn delete(&self, key: &str) -> StorageResult<()> {
        self.backend.delete(key).await
    }

    pub async fn delete_prefixed(&self, prefix: &str) -> StorageResult<()> {
        self.backend.delete_prefixed(prefix).await
    }

    pub async fn exists(&self, key: &str) -> StorageResult<bool> {
        self.backend.exists(key).await
    }

    /// Backend upload URL. Bytes sent there bypass encryption and are
    /// stored as legacy objects until the migration sweep converts them.
    pub async fn direct_upload_url(
        &self,
        key: &str,
        opts: &DirectUploadOptions,
    ) -> StorageResult<String> {
        self.backend.direct_upload_url(key, opts).await
    }

    pub async fn direct_upload_headers(
        &self,
        key: &str,
        opts: &DirectUploadOptions,
    ) -> StorageResult<Headers> {
        self.backend.direct_upload_headers(key, opts).await
    }

    /// Concatenates stored bytes. The result only opens if the sources
    /// were legacy objects or `source_keys` has a single entry.
    pub async fn compose(&self, source_keys: &[String], dest_key: &str) -> StorageResult<()> {
        self.backend.compose(source_keys, dest_key).await
    }

    /// The backend's own URL. It serves stored (sealed) bytes; browser-facing
    /// links must go through a proxy that calls [`Self::download`].
    pub async fn url(&self, key: &str, opts: &UrlOptions) -> StorageResult<String> {
        if opts.is_browser_facing() {
            debug!("url for {key} serves sealed bytes; proxy through download for browsers");
        }
        self.backend.url(key, opts).await
    }

    fn decode(&self, key: &str, stored: &[u8]) -> StorageResult<Vec<u8>> {
        if !is_sealed(stored) {
            info!("{key} not encrypted (legacy), returning raw");
            return Ok(stored.to_vec());
        }

        open(stored, &self.key).map_err(|e| {
            error!("decryption failed for {key}: {e}");
            StorageError::DecryptionFailed {
                key: key.to_string(),
                reason: e.to_string(),
            }
        })
    }
}

#[async_trait]
impl StorageBackend for EncryptedService {
    /// `checksum`, if given, covers the plaintext the caller hands in.
    async fn put(&self, key: &str, data: Vec<u8>, checksum: Option<&str>) -> StorageResult<()> {
        if let Some(expected) = checksum {
            if compute_checksum(&data) != expected {
                return Err(StorageError::ChecksumMismatch(key.to_string()));
            }
        }
        self.upload(key, &data).await
    }

    async fn get(&self, key: &str) -> StorageResult<Vec<u8>> {
        self.download(key).await
    }

    async fn get_range(&self, key: &str, range: Range<u64>) -> StorageResult<Vec<u8>> {
        self.download_range(key, range).await
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        EncryptedService::delete(self, key).await
    }

    async fn delete_prefixed(&self, prefix: &str) -> StorageResult<()> {
        EncryptedService::delete_prefixed(self, prefix).await
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        EncryptedService::exists(self, key).await
    }

    async fn direct_upload_url(
        &self,
        key: &str,
        opts: &DirectUploadOptions,
    ) -> StorageResult<String> {
        EncryptedService::direct_upload_url(self, key, opts).await
    }

    async fn direct_upload_headers(
        &self,
        key: &str,
        opts: &DirectUploadOptions,
    ) -> StorageResult<Headers> {
        EncryptedService::direct_upload_headers(self, key, opts).await
    }

    async fn compose(&self, source_keys: &[String], dest_key: &str) -> StorageResult<()> {
        EncryptedService::compose(self, source_keys, dest_key).await
    }

    async fn url(&self, key: &str, opts: &UrlOptions) -> StorageResult<String> {
        EncryptedService::url(self, key, opts).await
    }
}
