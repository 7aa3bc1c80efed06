use crate::backend::open_backend;
use crate::cli::BackendArgs;
use sealstore_crypto::{is_sealed, open, StorageKey, ENVELOPE_OVERHEAD};
use sealstore_storage::EncryptionConfig;

#[derive(Debug, PartialEq, Eq)]
enum Format {
    Legacy,
    Verified { plaintext_len: usize },
    Unverified { expected_len: usize, reason: String },
}

/// Classifies stored bytes without fetching them again.
fn classify(raw: &[u8], storage_key: &StorageKey) -> Format {
    if !is_sealed(raw) {
        return Format::Legacy;
    }
    match open(raw, storage_key) {
        Ok(plaintext) => Format::Verified {
            plaintext_len: plaintext.len(),
        },
        Err(e) => Format::Unverified {
            expected_len: raw.len().saturating_sub(ENVELOPE_OVERHEAD),
            reason: e.to_string(),
        },
    }
}

pub(crate) async fn run(backend: &BackendArgs, key: &str) -> anyhow::Result<()> {
    let storage_key = EncryptionConfig::from_env()?.storage_key()?;
    let raw = open_backend(backend).await?.get(key).await?;

    println!("Key:          {key}");
    println!("Stored bytes: {}", raw.len());

    match classify(&raw, &storage_key) {
        Format::Legacy => println!("Format:       legacy (plaintext)"),
        Format::Verified { plaintext_len } => {
            println!("Format:       envelope");
            println!("Plaintext:    {plaintext_len} bytes");
            println!("Verified:     yes");
        }
        Format::Unverified {
            expected_len,
            reason,
        } => {
            println!("Format:       envelope");
            println!("Plaintext:    {expected_len} bytes (expected)");
            println!("Verified:     no ({reason})");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sealstore_crypto::{derive_key, seal};

    #[test]
    fn legacy_bytes() {
        let key = derive_key(b"inspect").unwrap();
        assert_eq!(classify(b"plain-legacy-data", &key), Format::Legacy);
    }

    #[test]
    fn envelope_opened_from_fetched_bytes() {
        let key = derive_key(b"inspect").unwrap();
        let raw = seal(b"hello world", &key).unwrap();
        assert_eq!(
            classify(&raw, &key),
            Format::Verified { plaintext_len: 11 }
        );
    }

    #[test]
    fn envelope_under_other_key_is_unverified() {
        let raw = seal(b"hello world", &derive_key(b"writer").unwrap()).unwrap();
        match classify(&raw, &derive_key(b"reader").unwrap()) {
            Format::Unverified { expected_len, .. } => assert_eq!(expected_len, 11),
            other => panic!("expected Unverified, got {other:?}"),
        }
    }
}
