use pretty_assertions::assert_eq;
use proptest::prelude::*;
use sealstore_crypto::{
    derive_key, is_sealed, open, seal, sealed_len, ENVELOPE_OVERHEAD, MAGIC, NONCE_SIZE, TAG_SIZE,
};

fn test_key() -> sealstore_crypto::StorageKey {
    derive_key(b"test-storage-secret").unwrap()
}

#[test]
fn seal_open_roundtrip() {
    let key = test_key();
    let sealed = seal(b"quarterly contract, signed", &key).unwrap();
    assert_eq!(open(&sealed, &key).unwrap(), b"quarterly contract, signed");
}

#[test]
fn seal_open_empty_plaintext() {
    let key = test_key();
    let sealed = seal(b"", &key).unwrap();
    assert_eq!(sealed.len(), ENVELOPE_OVERHEAD);
    assert!(open(&sealed, &key).unwrap().is_empty());
}

#[test]
fn seal_open_large_plaintext() {
    let key = test_key();
    let large: Vec<u8> = (0..3_000_000u32).map(|i| (i % 251) as u8).collect();
    let sealed = seal(&large, &key).unwrap();
    assert_eq!(sealed.len(), large.len() + ENVELOPE_OVERHEAD);
    assert_eq!(open(&sealed, &key).unwrap(), large);
}

#[test]
fn hello_world_envelope_is_45_bytes() {
    let key = test_key();
    let sealed = seal(b"hello world", &key).unwrap();
    assert_eq!(sealed.len(), 45);
    assert!(sealed.starts_with(b"SSENC1"));
    assert_eq!(open(&sealed, &key).unwrap(), b"hello world");
}

#[test]
fn sealed_output_starts_with_magic() {
    let key = test_key();
    let sealed = seal(b"payload", &key).unwrap();
    assert_eq!(&sealed[..MAGIC.len()], MAGIC);
    assert!(is_sealed(&sealed));
}

#[test]
fn ciphertext_differs_from_plaintext() {
    let key = test_key();
    let plaintext = b"visible only to the signer";
    let sealed = seal(plaintext, &key).unwrap();
    assert_ne!(&sealed[ENVELOPE_OVERHEAD..], plaintext);
}

#[test]
fn each_seal_uses_a_fresh_nonce() {
    let key = test_key();
    let a = seal(b"same bytes every time", &key).unwrap();
    let b = seal(b"same bytes every time", &key).unwrap();

    let nonce_range = MAGIC.len()..MAGIC.len() + NONCE_SIZE;
    let tag_range = nonce_range.end..nonce_range.end + TAG_SIZE;
    assert_ne!(a[nonce_range.clone()], b[nonce_range]);
    assert_ne!(a[tag_range.clone()], b[tag_range]);
    assert_ne!(a[ENVELOPE_OVERHEAD..], b[ENVELOPE_OVERHEAD..]);

    assert_eq!(open(&a, &key).unwrap(), open(&b, &key).unwrap());
}

#[test]
fn legacy_data_passes_through() {
    let key = test_key();
    let raw = b"plain-legacy-data";
    assert!(!is_sealed(raw));
    assert_eq!(open(raw, &key).unwrap(), raw);
}

#[test]
fn legacy_data_shorter_than_magic_passes_through() {
    let key = test_key();
    let cases: [&[u8]; 4] = [b"", b"S", b"SSEN", b"SSENC"];
    for raw in cases {
        assert_eq!(open(raw, &key).unwrap(), raw);
    }
}

#[test]
fn near_miss_magic_is_legacy() {
    let key = test_key();
    let raw = b"SSENC2 this was never encrypted";
    assert_eq!(open(raw, &key).unwrap(), raw);
}

#[test]
fn sealed_len_matches_overhead() {
    assert_eq!(sealed_len(0), 34);
    assert_eq!(sealed_len(11), 45);
}

/// Envelope produced by an independent AES-256-GCM implementation with a
/// fixed nonce `00..0b` under the development key.
#[test]
fn opens_envelope_from_independent_implementation() {
    let key = derive_key(b"dev-storage-key-do-not-use-in-production0").unwrap();
    let sealed = hex::decode(
        "5353454e4331000102030405060708090a0b3849b781820d7d050f90f91304ee\
         39dd4ece6e96932bce6c2c773b",
    )
    .unwrap();
    assert_eq!(sealed.len(), 45);
    assert_eq!(open(&sealed, &key).unwrap(), b"hello world");
}

proptest! {
    #[test]
    fn roundtrip_any_plaintext(plaintext in proptest::collection::vec(any::<u8>(), 0..4096)) {
        let key = test_key();
        let sealed = seal(&plaintext, &key).unwrap();
        prop_assert_eq!(sealed.len(), 6 + 12 + 16 + plaintext.len());
        prop_assert_eq!(open(&sealed, &key).unwrap(), plaintext);
    }

    #[test]
    fn unmarked_data_is_returned_unchanged(data in proptest::collection::vec(any::<u8>(), 0..512)) {
        prop_assume!(!data.starts_with(MAGIC));
        let key = test_key();
        prop_assert_eq!(open(&data, &key).unwrap(), data);
    }
}
