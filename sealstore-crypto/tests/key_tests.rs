use pretty_assertions::assert_eq;
use sealstore_crypto::{derive_key, KEY_SIZE};

#[test]
fn derivation_is_deterministic() {
    let a = derive_key(b"operator secret").unwrap();
    let b = derive_key(b"operator secret").unwrap();
    assert_eq!(a.as_bytes(), b.as_bytes());
}

#[test]
fn different_material_gives_different_keys() {
    let a = derive_key(b"operator secret").unwrap();
    let b = derive_key(b"operator secret!").unwrap();
    assert_ne!(a.as_bytes(), b.as_bytes());
}

#[test]
fn derived_key_is_32_bytes() {
    let key = derive_key(b"").unwrap();
    assert_eq!(key.as_bytes().len(), KEY_SIZE);
}

#[test]
fn derived_key_is_not_the_material() {
    let material = [0x42u8; KEY_SIZE];
    let key = derive_key(&material).unwrap();
    assert_ne!(key.as_bytes(), &material);
}

/// HKDF-SHA256(salt = "signsuite-storage-encryption",
/// info = "active-storage-file-encryption"), computed independently.
#[test]
fn matches_known_answer_for_development_key() {
    let key = derive_key(b"dev-storage-key-do-not-use-in-production0").unwrap();
    assert_eq!(
        hex::encode(key.as_bytes()),
        "7cb525a2fb87cbf5012578e421ceb2fa0e54b5426a47012e7d382572d0f033a1"
    );
}

#[test]
fn matches_known_answer_for_test_secret() {
    let key = derive_key(b"test-storage-secret").unwrap();
    assert_eq!(
        hex::encode(key.as_bytes()),
        "c324eb56aaa87a40ff1322385dd0b146a9c25a5bad3240a748573b57645877c4"
    );
}
