//! Building signatories from GnuPG key files and keyrings on disk.

use std::path::{Path, PathBuf};

use chartprov_core::{ProvenanceError, TrustError};
use chartprov_crypto::{fingerprint_hex, load_keyring, Signatory};

fn data(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data").join(name)
}

#[test]
fn keyring_preserves_file_order() {
    let ring = load_keyring(&data("secring.gpg")).unwrap();
    assert_eq!(ring.len(), 2);
    assert_eq!(ring.entities()[0].identities()[0].email(), Some("signer@example.com"));
    assert_eq!(ring.entities()[1].identities()[0].email(), Some("bot@example.com"));
}

#[test]
fn empty_id_leaves_signing_identity_unset() {
    let s = Signatory::from_keyring(&data("secring.gpg"), "").unwrap();
    assert!(s.entity().is_none());
    assert_eq!(s.keyring().len(), 2);
}

#[test]
fn exact_identity_selects_entity() {
    let s = Signatory::from_keyring(&data("secring.gpg"), "Release Bot <bot@example.com>").unwrap();
    let entity = s.entity().unwrap();
    assert_eq!(
        fingerprint_hex(&entity.fingerprint()),
        "9CE23FD6A1F2A8826D7245421EBDCBA38CE1D89A"
    );
    assert!(entity.secret_key().is_some());
}

#[test]
fn unique_substring_selects_entity() {
    let s = Signatory::from_keyring(&data("secring.gpg"), "(charts)").unwrap();
    assert_eq!(s.entity().unwrap().primary_identity().unwrap().name(), "Chart Signer");
}

#[test]
fn substring_shared_by_entities_is_ambiguous() {
    let err = Signatory::from_keyring(&data("secring.gpg"), "example.com").unwrap_err();
    match err {
        ProvenanceError::Trust(TrustError::AmbiguousIdentity { query, matches }) => {
            assert_eq!(query, "example.com");
            assert_eq!(matches.len(), 2);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unmatched_id_defers_failure_to_signing() {
    let dir = tempfile::tempdir().unwrap();
    let s = Signatory::from_keyring(&data("secring.gpg"), "nobody").unwrap();
    assert!(s.entity().is_none());

    let chart = dir.path().join("x.tgz");
    std::fs::write(&chart, "x").unwrap();
    let err = s.clear_sign(&chart).unwrap_err();
    assert!(matches!(err, ProvenanceError::Trust(TrustError::PrivateKeyNotFound)));
}

#[test]
fn public_keyring_cannot_sign() {
    let dir = tempfile::tempdir().unwrap();
    let s = Signatory::from_keyring(&data("pubring.gpg"), "Chart Signer").unwrap();
    assert!(s.entity().unwrap().secret_key().is_none());

    let chart = dir.path().join("x.tgz");
    std::fs::write(&chart, "x").unwrap();
    let err = s.clear_sign(&chart).unwrap_err();
    assert!(matches!(err, ProvenanceError::Trust(TrustError::PrivateKeyNotFound)));
}

#[test]
fn from_files_loads_armored_key_and_binary_keyring() {
    let s = Signatory::from_files(&data("signer.asc"), &data("pubring.gpg")).unwrap();
    assert!(s.entity().unwrap().secret_key().is_some());
    assert_eq!(s.keyring().len(), 2);
}

#[test]
fn unreadable_keyring_is_io_error() {
    let err = Signatory::from_keyring(Path::new("/nonexistent/ring.gpg"), "x").unwrap_err();
    assert!(matches!(err, ProvenanceError::Io { .. }));
}
