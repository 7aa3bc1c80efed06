//! SQLite-backed catalog of stored blobs.
//!
//! Rows identify objects by their backend key and carry the `encrypted`
//! migration flag. Blob bytes never live here.

use crate::error::{BlobStoreError, BlobStoreResult};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use std::path::Path;
use std::sync::{Arc, Mutex};

// ============================================================================
// Records
// ============================================================================

/// A catalogued blob.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BlobRecord {
    pub id: i64,
    pub key: String,
    pub filename: String,
    pub content_type: Option<String>,
    pub byte_size: i64,
    pub checksum: Option<String>,
    pub encrypted: bool,
    pub created_at: i64,
}

/// Row counts by migration state, taken in one query.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CatalogCounts {
    pub total: u64,
    pub pending: u64,
}

impl CatalogCounts {
    pub fn encrypted(&self) -> u64 {
        self.total.saturating_sub(self.pending)
    }
}

/// Fields supplied when registering a blob.
#[derive(Clone, Debug, Default)]
pub struct NewBlob {
    pub key: String,
    pub filename: String,
    pub content_type: Option<String>,
    pub byte_size: i64,
    pub checksum: Option<String>,
    pub encrypted: bool,
}

impl NewBlob {
    pub fn new(key: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            filename: filename.into(),
            ..Self::default()
        }
    }
}

// ============================================================================
// BlobCatalog
// ============================================================================

/// What the migration sweeper needs from the application's blob records.
pub trait BlobCatalog: Send + Sync {
    /// Up to `limit` unencrypted records with `id > after_id`, ordered by id.
    fn pending_after(&self, after_id: i64, limit: usize) -> BlobStoreResult<Vec<BlobRecord>>;

    /// Sets the `encrypted` flag on a record.
    fn mark_encrypted(&self, id: i64) -> BlobStoreResult<()>;
}

// ============================================================================
// SqliteBlobCatalog
// ============================================================================

const SELECT_COLUMNS: &str =
    "id, key, filename, content_type, byte_size, checksum, encrypted, created_at";

pub struct SqliteBlobCatalog {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteBlobCatalog {
    /// Opens (or creates) a catalog database file.
    pub fn open(db_path: &Path) -> BlobStoreResult<Self> {
        let conn = Connection::open(db_path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA busy_timeout=5000;")?;
        Self::open_with_conn(Arc::new(Mutex::new(conn)))
    }

    pub fn open_in_memory() -> BlobStoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::open_with_conn(Arc::new(Mutex::new(conn)))
    }

    /// Uses an existing shared connection.
    pub fn open_with_conn(conn: Arc<Mutex<Connection>>) -> BlobStoreResult<Self> {
        let catalog = Self { conn };
        catalog.ensure_tables()?;
        Ok(catalog)
    }

    fn lock(&self) -> BlobStoreResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| BlobStoreError::Catalog(e.to_string()))
    }

    fn ensure_tables(&self) -> BlobStoreResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS blobs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                key TEXT NOT NULL UNIQUE,
                filename TEXT NOT NULL,
                content_type TEXT,
                byte_size INTEGER NOT NULL DEFAULT 0,
                checksum TEXT,
                encrypted INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS blobs_encrypted_id ON blobs (encrypted, id);",
        )?;
        Ok(())
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<BlobRecord> {
        Ok(BlobRecord {
            id: row.get(0)?,
            key: row.get(1)?,
            filename: row.get(2)?,
            content_type: row.get(3)?,
            byte_size: row.get(4)?,
            checksum: row.get(5)?,
            encrypted: row.get(6)?,
            created_at: row.get(7)?,
        })
    }

    /// Adds a blob record and returns it with its assigned id.
    pub fn register(&self, blob: &NewBlob) -> BlobStoreResult<BlobRecord> {
        let now = Utc::now().timestamp_millis();
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO blobs
                 (key, filename, content_type, byte_size, checksum, encrypted, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                blob.key,
                blob.filename,
                blob.content_type,
                blob.byte_size,
                blob.checksum,
                blob.encrypted,
                now
            ],
        )?;

        Ok(BlobRecord {
            id: conn.last_insert_rowid(),
            key: blob.key.clone(),
            filename: blob.filename.clone(),
            content_type: blob.content_type.clone(),
            byte_size: blob.byte_size,
            checksum: blob.checksum.clone(),
            encrypted: blob.encrypted,
            created_at: now,
        })
    }

    pub fn get(&self, id: i64) -> BlobStoreResult<BlobRecord> {
        let conn = self.lock()?;
        conn.query_row(
            &format!("SELECT {SELECT_COLUMNS} FROM blobs WHERE id = ?1"),
            params![id],
            Self::from_row,
        )
        .optional()?
        .ok_or_else(|| BlobStoreError::NotFound(format!("id {id}")))
    }

    pub fn find_by_key(&self, key: &str) -> BlobStoreResult<Option<BlobRecord>> {
        let conn = self.lock()?;
        Ok(conn
            .query_row(
                &format!("SELECT {SELECT_COLUMNS} FROM blobs WHERE key = ?1"),
                params![key],
                Self::from_row,
            )
            .optional()?)
    }

    /// All records, ordered by id.
    pub fn list(&self) -> BlobStoreResult<Vec<BlobRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!("SELECT {SELECT_COLUMNS} FROM blobs ORDER BY id"))?;
        let items = stmt
            .query_map([], Self::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(items)
    }

    /// Number of records still flagged as unencrypted.
    pub fn count_pending(&self) -> BlobStoreResult<u64> {
        let conn = self.lock()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM blobs WHERE encrypted = 0", [], |row| {
                row.get(0)
            })?;
        Ok(count as u64)
    }

    /// Total and pending counts from a single snapshot.
    pub fn counts(&self) -> BlobStoreResult<CatalogCounts> {
        let conn = self.lock()?;
        let (total, pending): (i64, i64) = conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(encrypted = 0), 0) FROM blobs",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(CatalogCounts {
            total: total as u64,
            pending: pending as u64,
        })
    }
}

impl BlobCatalog for SqliteBlobCatalog {
    fn pending_after(&self, after_id: i64, limit: usize) -> BlobStoreResult<Vec<BlobRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM blobs
             WHERE encrypted = 0 AND id > ?1
             ORDER BY id LIMIT ?2"
        ))?;
        let items = stmt
            .query_map(params![after_id, limit as i64], Self::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(items)
    }

    fn mark_encrypted(&self, id: i64) -> BlobStoreResult<()> {
        let conn = self.lock()?;
        let affected = conn.execute("UPDATE blobs SET encrypted = 1 WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(BlobStoreError::NotFound(format!("id {id}")));
        }
        Ok(())
    }
}
