//! In-process backend holding objects in a map.

use crate::backend::{
    checksum as compute_checksum, clamp_range, DirectUploadOptions, Headers, StorageBackend,
    UrlOptions,
};
use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::ops::Range;
use tokio::sync::RwLock;
use tracing::debug;

/// Backend that keeps every object in memory. Contents are lost on drop.
#[derive(Default)]
pub struct MemoryBackend {
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys currently stored, sorted.
    pub async fn keys(&self) -> Vec<String> {
        let objects = self.objects.read().await;
        let mut keys: Vec<String> = objects.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn put(&self, key: &str, data: Vec<u8>, checksum: Option<&str>) -> StorageResult<()> {
        if let Some(expected) = checksum {
            if compute_checksum(&data) != expected {
                return Err(StorageError::ChecksumMismatch(key.to_string()));
            }
        }
        debug!("stored {} bytes at memory://{key}", data.len());
        self.objects.write().await.insert(key.to_string(), data);
        Ok(())
    }

    async fn get(&self, key: &str) -> StorageResult<Vec<u8>> {
        self.objects
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn get_range(&self, key: &str, range: Range<u64>) -> StorageResult<Vec<u8>> {
        let objects = self.objects.read().await;
        let data = objects
            .get(key)
            .ok_or_else(|| StorageError::NotFound(key.to_string()))?;
        Ok(data[clamp_range(data.len(), range)].to_vec())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.objects.write().await.remove(key);
        Ok(())
    }

    async fn delete_prefixed(&self, prefix: &str) -> StorageResult<()> {
        self.objects
            .write()
            .await
            .retain(|key, _| !key.starts_with(prefix));
        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        Ok(self.objects.read().await.contains_key(key))
    }

    async fn direct_upload_url(
        &self,
        _key: &str,
        _opts: &DirectUploadOptions,
    ) -> StorageResult<String> {
        Err(StorageError::Unsupported(
            "direct uploads into a memory backend".to_string(),
        ))
    }

    async fn direct_upload_headers(
        &self,
        _key: &str,
        opts: &DirectUploadOptions,
    ) -> StorageResult<Headers> {
        let mut headers = Headers::new();
        if let Some(ref content_type) = opts.content_type {
            headers.insert("Content-Type".to_string(), content_type.clone());
        }
        Ok(headers)
    }

    async fn compose(&self, source_keys: &[String], dest_key: &str) -> StorageResult<()> {
        let mut objects = self.objects.write().await;
        let mut combined = Vec::new();
        for source in source_keys {
            let data = objects
                .get(source)
                .ok_or_else(|| StorageError::NotFound(source.clone()))?;
            combined.extend_from_slice(data);
        }
        objects.insert(dest_key.to_string(), combined);
        Ok(())
    }

    async fn url(&self, key: &str, _opts: &UrlOptions) -> StorageResult<String> {
        Ok(format!("memory://{key}"))
    }
}
