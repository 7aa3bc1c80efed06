//! Backend for a directory on local disk.

use crate::backend::{
    checksum as compute_checksum, clamp_range, DirectUploadOptions, Headers, StorageBackend,
    UrlOptions,
};
use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use std::io::{ErrorKind, SeekFrom};
use std::ops::Range;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::debug;

/// Stores each object as a file under `root`, using the key as a
/// `/`-separated relative path.
pub struct LocalBackend {
    root: PathBuf,
}

impl LocalBackend {
    /// Creates the root directory if needed.
    pub async fn new(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        let root = fs::canonicalize(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Rejects keys that could escape the root.
    fn validate_key(key: &str) -> StorageResult<()> {
        if key.is_empty() {
            return Err(StorageError::InvalidKey("empty key".into()));
        }
        if key.starts_with('/') || key.contains('\\') {
            return Err(StorageError::InvalidKey(format!(
                "absolute path or backslash in '{key}'"
            )));
        }
        for component in Path::new(key).components() {
            if !matches!(component, Component::Normal(_)) {
                return Err(StorageError::InvalidKey(format!(
                    "path traversal in '{key}'"
                )));
            }
        }
        Ok(())
    }

    fn path_for(&self, key: &str) -> StorageResult<PathBuf> {
        Self::validate_key(key)?;
        Ok(self.root.join(key))
    }

    /// Writes to a sibling temp file, then renames into place so readers
    /// never observe a partial object.
    async fn atomic_write(&self, path: &Path, data: &[u8]) -> StorageResult<()> {
        let dir = path.parent().unwrap_or(&self.root);
        fs::create_dir_all(dir).await?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tmp = dir.join(temp_file_name(&file_name));

        let mut file = fs::File::create(&tmp).await?;
        let written = match file.write_all(data).await {
            Ok(()) => file.sync_all().await,
            Err(e) => Err(e),
        };
        drop(file);
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        fs::rename(&tmp, path).await?;
        Ok(())
    }

    async fn read(&self, key: &str) -> StorageResult<Vec<u8>> {
        let path = self.path_for(key)?;
        match fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound(key.into())),
            Err(e) => Err(e.into()),
        }
    }

    /// All stored keys, relative to the root.
    pub async fn list_keys(&self) -> StorageResult<Vec<String>> {
        let mut keys = Vec::new();
        let mut dirs = vec![self.root.clone()];

        while let Some(dir) = dirs.pop() {
            let mut entries = fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if entry.file_type().await?.is_dir() {
                    dirs.push(path);
                    continue;
                }
                if is_temp_file_name(&entry.file_name().to_string_lossy()) {
                    continue;
                }
                if let Ok(rel) = path.strip_prefix(&self.root) {
                    let key = rel
                        .components()
                        .map(|c| c.as_os_str().to_string_lossy())
                        .collect::<Vec<_>>()
                        .join("/");
                    keys.push(key);
                }
            }
        }

        keys.sort();
        Ok(keys)
    }
}

/// `.{file_name}.{uuid}.tmp`, the sibling written before the rename.
fn temp_file_name(file_name: &str) -> String {
    format!(".{file_name}.{}.tmp", uuid::Uuid::new_v4())
}

/// True only for names produced by [`temp_file_name`]. A key that merely
/// ends in `.tmp` is an ordinary object.
fn is_temp_file_name(name: &str) -> bool {
    let Some(stem) = name.strip_suffix(".tmp") else {
        return false;
    };
    let Some((base, id)) = stem.rsplit_once('.') else {
        return false;
    };
    base.len() > 1 && base.starts_with('.') && uuid::Uuid::try_parse(id).is_ok()
}

#[async_trait]
impl StorageBackend for LocalBackend {
    async fn put(&self, key: &str, data: Vec<u8>, checksum: Option<&str>) -> StorageResult<()> {
        if let Some(expected) = checksum {
            if compute_checksum(&data) != expected {
                return Err(StorageError::ChecksumMismatch(key.to_string()));
            }
        }
        let path = self.path_for(key)?;
        self.atomic_write(&path, &data).await?;
        debug!("wrote {} bytes to {}", data.len(), path.display());
        Ok(())
    }

    async fn get(&self, key: &str) -> StorageResult<Vec<u8>> {
        self.read(key).await
    }

    async fn get_range(&self, key: &str, range: Range<u64>) -> StorageResult<Vec<u8>> {
        let path = self.path_for(key)?;
        let mut file = match fs::File::open(&path).await {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StorageError::NotFound(key.into()));
            }
            Err(e) => return Err(e.into()),
        };

        let len = file.metadata().await?.len() as usize;
        let range = clamp_range(len, range);
        let mut buf = vec![0u8; range.len()];
        if !buf.is_empty() {
            file.seek(SeekFrom::Start(range.start as u64)).await?;
            file.read_exact(&mut buf).await?;
        }
        Ok(buf)
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_prefixed(&self, prefix: &str) -> StorageResult<()> {
        for key in self.list_keys().await? {
            if key.starts_with(prefix) {
                self.delete(&key).await?;
            }
        }
        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let path = self.path_for(key)?;
        Ok(fs::try_exists(&path).await?)
    }

    async fn direct_upload_url(
        &self,
        _key: &str,
        _opts: &DirectUploadOptions,
    ) -> StorageResult<String> {
        Err(StorageError::Unsupported(
            "direct uploads into a local directory".to_string(),
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
        let mut combined = Vec::new();
        for source in source_keys {
            combined.extend_from_slice(&self.read(source).await?);
        }
        let path = self.path_for(dest_key)?;
        self.atomic_write(&path, &combined).await
    }

    async fn url(&self, key: &str, _opts: &UrlOptions) -> StorageResult<String> {
        let path = self.path_for(key)?;
        Ok(format!("file://{}", path.display()))
    }
}
