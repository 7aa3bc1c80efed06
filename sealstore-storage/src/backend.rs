//! The capability set every blob backend provides.

use crate::error::StorageResult;
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::ops::Range;
use std::time::Duration;

/// HTTP headers a client must send with a direct upload.
pub type Headers = BTreeMap<String, String>;

/// How a browser should present a downloaded object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Disposition {
    Inline,
    Attachment,
}

impl Disposition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inline => "inline",
            Self::Attachment => "attachment",
        }
    }

    /// Builds a `Content-Disposition` header value.
    pub fn header_value(&self, filename: Option<&str>) -> String {
        match filename {
            Some(name) => format!("{}; filename=\"{}\"", self.as_str(), name.replace('"', "")),
            None => self.as_str().to_string(),
        }
    }
}

/// Options for [`StorageBackend::url`].
#[derive(Clone, Debug, Default)]
pub struct UrlOptions {
    pub expires_in: Option<Duration>,
    pub disposition: Option<Disposition>,
    pub filename: Option<String>,
    pub content_type: Option<String>,
}

impl UrlOptions {
    /// True when the link is meant to be opened directly by a browser.
    pub fn is_browser_facing(&self) -> bool {
        self.disposition.is_some() || self.filename.is_some()
    }
}

/// Options for direct (client-to-backend) uploads.
#[derive(Clone, Debug, Default)]
pub struct DirectUploadOptions {
    pub expires_in: Option<Duration>,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    /// Base64 SHA-256 of the bytes the client will send.
    pub checksum: Option<String>,
}

/// Raw byte storage addressed by opaque string keys.
///
/// Implementations never interpret object contents. `delete` of a missing
/// key is not an error.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Stores `data` under `key`, replacing any previous object. When
    /// `checksum` is given it must equal [`checksum`] of `data`.
    async fn put(&self, key: &str, data: Vec<u8>, checksum: Option<&str>) -> StorageResult<()>;

    async fn get(&self, key: &str) -> StorageResult<Vec<u8>>;

    /// Reads `range` (half-open, clamped to the object length).
    async fn get_range(&self, key: &str, range: Range<u64>) -> StorageResult<Vec<u8>>;

    async fn delete(&self, key: &str) -> StorageResult<()>;

    async fn delete_prefixed(&self, prefix: &str) -> StorageResult<()>;

    async fn exists(&self, key: &str) -> StorageResult<bool>;

    async fn direct_upload_url(&self, key: &str, opts: &DirectUploadOptions)
    -> StorageResult<String>;

    async fn direct_upload_headers(
        &self,
        key: &str,
        opts: &DirectUploadOptions,
    ) -> StorageResult<Headers>;

    /// Concatenates `source_keys` in order into `dest_key`.
    async fn compose(&self, source_keys: &[String], dest_key: &str) -> StorageResult<()>;

    async fn url(&self, key: &str, opts: &UrlOptions) -> StorageResult<String>;
}

/// Base64 SHA-256 digest used for upload integrity checks.
pub fn checksum(data: &[u8]) -> String {
    STANDARD.encode(Sha256::digest(data))
}

/// Clamps a half-open byte range to an object of `len` bytes.
///
/// `end` is cut to `len`; a range starting at or past the end is empty.
pub fn clamp_range(len: usize, range: Range<u64>) -> Range<usize> {
    let len_u64 = len as u64;
    let end = range.end.min(len_u64);
    let start = range.start.min(end);
    start as usize..end as usize
}
