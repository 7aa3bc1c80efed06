use pretty_assertions::assert_eq;
use sealstore_storage::{
    checksum, DirectUploadOptions, EncryptedService, EncryptionConfig, LocalBackend,
    StorageBackend, StorageError, UrlOptions,
};
use std::sync::Arc;
use tempfile::TempDir;

async fn backend() -> (TempDir, LocalBackend) {
    let dir = TempDir::new().unwrap();
    let backend = LocalBackend::new(dir.path().join("blobs")).await.unwrap();
    (dir, backend)
}

#[tokio::test]
async fn put_get_roundtrip() {
    let (_dir, backend) = backend().await;
    backend.put("ab/cd/abcdef", b"payload".to_vec(), None).await.unwrap();
    assert_eq!(backend.get("ab/cd/abcdef").await.unwrap(), b"payload");
}

#[tokio::test]
async fn put_writes_file_under_root() {
    let (_dir, backend) = backend().await;
    backend.put("nested/key", b"on disk".to_vec(), None).await.unwrap();

    let on_disk = std::fs::read(backend.root().join("nested/key")).unwrap();
    assert_eq!(on_disk, b"on disk");
}

#[tokio::test]
async fn put_verifies_checksum() {
    let (_dir, backend) = backend().await;
    let data = b"integrity".to_vec();

    let good = checksum(&data);
    backend.put("ok", data.clone(), Some(&good)).await.unwrap();

    let err = backend.put("bad", data, Some("AAAA")).await.unwrap_err();
    assert!(matches!(err, StorageError::ChecksumMismatch(k) if k == "bad"));
    assert!(!backend.exists("bad").await.unwrap());
}

#[tokio::test]
async fn get_missing_is_not_found() {
    let (_dir, backend) = backend().await;
    assert!(matches!(
        backend.get("missing").await,
        Err(StorageError::NotFound(_))
    ));
    assert!(matches!(
        backend.get_range("missing", 0..4).await,
        Err(StorageError::NotFound(_))
    ));
}

#[tokio::test]
async fn get_range_reads_slice() {
    let (_dir, backend) = backend().await;
    backend.put("r", b"abcdefghij".to_vec(), None).await.unwrap();

    assert_eq!(backend.get_range("r", 3..6).await.unwrap(), b"def");
    assert_eq!(backend.get_range("r", 8..64).await.unwrap(), b"ij");
    assert!(backend.get_range("r", 10..12).await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_is_idempotent() {
    let (_dir, backend) = backend().await;
    backend.put("d", b"x".to_vec(), None).await.unwrap();

    backend.delete("d").await.unwrap();
    backend.delete("d").await.unwrap();
    assert!(!backend.exists("d").await.unwrap());
}

#[tokio::test]
async fn delete_prefixed_removes_matching_keys_only() {
    let (_dir, backend) = backend().await;
    for key in ["variants/a/1", "variants/a/2", "variants/b/1", "other"] {
        backend.put(key, b"x".to_vec(), None).await.unwrap();
    }

    backend.delete_prefixed("variants/a").await.unwrap();

    assert_eq!(
        backend.list_keys().await.unwrap(),
        vec!["other".to_string(), "variants/b/1".to_string()]
    );
}

#[tokio::test]
async fn keys_ending_in_tmp_are_listed_and_deleted() {
    let (_dir, backend) = backend().await;
    backend.put("exports/report.tmp", b"scratch".to_vec(), None).await.unwrap();
    backend.put("exports/report.pdf", b"final".to_vec(), None).await.unwrap();

    assert_eq!(
        backend.list_keys().await.unwrap(),
        vec!["exports/report.pdf".to_string(), "exports/report.tmp".to_string()]
    );

    backend.delete_prefixed("exports/").await.unwrap();
    assert!(!backend.exists("exports/report.pdf").await.unwrap());
    assert!(!backend.exists("exports/report.tmp").await.unwrap());
}

#[tokio::test]
async fn in_flight_temp_files_are_not_listed() {
    let (_dir, backend) = backend().await;
    backend.put("a/b", b"one".to_vec(), None).await.unwrap();
    std::fs::write(
        backend.root().join("a/.b.0b7e6a52-3c8e-4f7b-9d7a-2f1c6e0a9b11.tmp"),
        b"partial",
    )
    .unwrap();

    assert_eq!(backend.list_keys().await.unwrap(), vec!["a/b".to_string()]);
}

#[tokio::test]
async fn compose_concatenates_sources() {
    let (_dir, backend) = backend().await;
    backend.put("p1", b"hello ".to_vec(), None).await.unwrap();
    backend.put("p2", b"world".to_vec(), None).await.unwrap();

    backend
        .compose(&["p1".to_string(), "p2".to_string()], "joined")
        .await
        .unwrap();
    assert_eq!(backend.get("joined").await.unwrap(), b"hello world");
}

#[tokio::test]
async fn rejects_traversal_keys() {
    let (_dir, backend) = backend().await;
    let err = backend
        .put("../escape", b"x".to_vec(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::InvalidKey(_)));
}

#[tokio::test]
async fn no_temp_files_left_after_put() {
    let (_dir, backend) = backend().await;
    backend.put("a/b", b"one".to_vec(), None).await.unwrap();
    backend.put("a/b", b"two".to_vec(), None).await.unwrap();

    let entries: Vec<_> = std::fs::read_dir(backend.root().join("a"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(entries, vec!["b".to_string()]);
}

#[tokio::test]
async fn url_points_at_file() {
    let (_dir, backend) = backend().await;
    let url = backend.url("k", &UrlOptions::default()).await.unwrap();
    assert!(url.starts_with("file://"));
    assert!(url.ends_with("/k"));
}

#[tokio::test]
async fn direct_upload_url_unsupported() {
    let (_dir, backend) = backend().await;
    assert!(matches!(
        backend
            .direct_upload_url("k", &DirectUploadOptions::default())
            .await,
        Err(StorageError::Unsupported(_))
    ));
}

#[tokio::test]
async fn encrypted_service_over_local_disk() {
    let (_dir, backend) = backend().await;
    let backend = Arc::new(backend);
    let service = EncryptedService::new(
        backend.clone(),
        &EncryptionConfig::from_material("disk-secret"),
    )
    .unwrap();

    service.upload("signed/001.pdf", b"%PDF-1.7 ...").await.unwrap();

    let on_disk = std::fs::read(backend.root().join("signed/001.pdf")).unwrap();
    assert!(on_disk.starts_with(b"SSENC1"));
    assert_eq!(on_disk.len(), 34 + 12);
    assert_eq!(service.download("signed/001.pdf").await.unwrap(), b"%PDF-1.7 ...");
}
