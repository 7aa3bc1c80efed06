//! Resolution of storage encryption key material.
//!
//! Resolved once at startup and handed to [`crate::EncryptedService`]; no
//! operation reads the environment afterwards.

use crate::error::{StorageError, StorageResult};
use sealstore_crypto::{derive_key, StorageKey};
use std::fmt;
use tracing::warn;
use zeroize::Zeroizing;

/// Dedicated storage encryption secret.
pub const STORAGE_KEY_VAR: &str = "STORAGE_ENCRYPTION_KEY";

/// The application's primary record-encryption secret. Deployments that
/// predate [`STORAGE_KEY_VAR`] derive their storage key from this one.
pub const PRIMARY_KEY_VAR: &str = "ACTIVE_RECORD_ENCRYPTION_PRIMARY_KEY";

/// Alternate name for the primary secret, read after [`PRIMARY_KEY_VAR`].
pub const PRIMARY_KEY_ALIAS_VAR: &str = "APP_PRIMARY_ENCRYPTION_KEY";

/// Deployment environment name (`production`, `development`, `test`).
pub const ENVIRONMENT_VAR: &str = "APP_ENV";

/// Read when [`ENVIRONMENT_VAR`] is unset.
pub const ENVIRONMENT_FALLBACK_VAR: &str = "RAILS_ENV";

/// Key material used outside production when no secret is configured.
pub const DEVELOPMENT_KEY_MATERIAL: &str = "dev-storage-key-do-not-use-in-production0";

/// Deployment environment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    Production,
    Development,
    Test,
}

impl Environment {
    /// Unknown names are treated as development.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "test" => Self::Test,
            _ => Self::Development,
        }
    }

    /// Reads [`ENVIRONMENT_VAR`], then [`ENVIRONMENT_FALLBACK_VAR`],
    /// defaulting to development.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        lookup(ENVIRONMENT_VAR)
            .filter(|v| !v.is_empty())
            .or_else(|| lookup(ENVIRONMENT_FALLBACK_VAR))
            .map(|v| Self::parse(&v))
            .unwrap_or(Self::Development)
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Where the key material came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeySource {
    StorageSecret,
    PrimarySecret,
    DevelopmentDefault,
    Explicit,
}

/// Key material for storage encryption. Never printed.
#[derive(Clone)]
pub struct EncryptionConfig {
    key_material: Zeroizing<Vec<u8>>,
    source: KeySource,
}

impl fmt::Debug for EncryptionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionConfig")
            .field("key_material", &"[REDACTED]")
            .field("source", &self.source)
            .finish()
    }
}

impl EncryptionConfig {
    /// Uses the given material directly.
    pub fn from_material(material: impl Into<Vec<u8>>) -> Self {
        Self {
            key_material: Zeroizing::new(material.into()),
            source: KeySource::Explicit,
        }
    }

    /// Resolves key material from the process environment.
    pub fn from_env() -> StorageResult<Self> {
        Self::resolve_with(Environment::from_env(), |name| std::env::var(name).ok())
    }

    /// Resolves key material using `lookup` for variable access.
    ///
    /// Order: [`STORAGE_KEY_VAR`], then [`PRIMARY_KEY_VAR`] (or its alias
    /// [`PRIMARY_KEY_ALIAS_VAR`]), then the development default. In
    /// production a missing secret is a configuration error. Empty values
    /// count as unset.
    pub fn resolve_with<F>(environment: Environment, lookup: F) -> StorageResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|v| !v.is_empty());

        if let Some(value) = read(STORAGE_KEY_VAR) {
            return Ok(Self {
                key_material: Zeroizing::new(value.into_bytes()),
                source: KeySource::StorageSecret,
            });
        }

        if let Some(value) = read(PRIMARY_KEY_VAR).or_else(|| read(PRIMARY_KEY_ALIAS_VAR)) {
            return Ok(Self {
                key_material: Zeroizing::new(value.into_bytes()),
                source: KeySource::PrimarySecret,
            });
        }

        if environment.is_production() {
            return Err(StorageError::Config(format!(
                "{STORAGE_KEY_VAR} or {PRIMARY_KEY_VAR} required in production"
            )));
        }

        warn!(
            "no storage encryption secret configured; using development key material \
             (never use this in production)"
        );
        Ok(Self {
            key_material: Zeroizing::new(DEVELOPMENT_KEY_MATERIAL.as_bytes().to_vec()),
            source: KeySource::DevelopmentDefault,
        })
    }

    pub fn source(&self) -> KeySource {
        self.source
    }

    /// Derives the AES-256 storage key from the material.
    pub fn storage_key(&self) -> StorageResult<StorageKey> {
        derive_key(&self.key_material).map_err(|e| StorageError::Config(e.to_string()))
    }
}
