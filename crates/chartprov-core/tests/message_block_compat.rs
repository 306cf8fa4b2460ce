//! # Message Block Compatibility Tests
//!
//! Attestations already published by other chart tooling must keep parsing.
//! These tests decode hand-written message blocks in the layout those tools
//! emit (alphabetically ordered metadata keys, a blank line before the
//! separator, quoted digests) and check known SHA-256 vectors so that the
//! `sha256:<hex>` strings we write agree with every other implementation.

use chartprov_core::message::{self, SEPARATOR};
use chartprov_core::{ContentDigest, DigestAlgorithm, FormatError, SumCollection};

const PUBLISHED_BLOCK: &str = "\
description: Test chart versioning
name: hashtest
version: 1.2.3

...
files:
  hashtest-1.2.3.tgz: sha256:8e90e879e2a04b1900570e1c198755e46e4706d70b0e79f5edabfac7900e4e75
";

#[test]
fn published_block_decodes() {
    let (md, sums) = message::decode(PUBLISHED_BLOCK).expect("published block should parse");
    assert_eq!(md.name, "hashtest");
    assert_eq!(md.version, "1.2.3");
    assert_eq!(md.description, "Test chart versioning");
    assert_eq!(
        sums.files["hashtest-1.2.3.tgz"],
        "sha256:8e90e879e2a04b1900570e1c198755e46e4706d70b0e79f5edabfac7900e4e75"
    );
    assert!(sums.images.is_empty());
}

#[test]
fn published_digest_is_well_formed() {
    let (_, sums) = message::decode(PUBLISHED_BLOCK).unwrap();
    let digest = ContentDigest::parse(&sums.files["hashtest-1.2.3.tgz"]).unwrap();
    assert_eq!(digest.algorithm(), DigestAlgorithm::Sha256);
}

#[test]
fn quoted_digest_values_decode() {
    let block = "name: q\n...\nfiles:\n  \"q-0.1.0.tgz\": \"sha256:00\"\n";
    let (_, sums) = message::decode(block).unwrap();
    assert_eq!(sums.files["q-0.1.0.tgz"], "sha256:00");
}

#[test]
fn metadata_only_block_is_rejected() {
    let only_metadata = PUBLISHED_BLOCK.split(SEPARATOR).next().unwrap();
    assert!(matches!(
        message::decode(only_metadata),
        Err(FormatError::MalformedMessageBlock)
    ));
}

#[test]
fn empty_sums_section_yields_empty_collection() {
    let (_, sums) = message::decode("name: x\n...\n").unwrap();
    assert_eq!(sums, SumCollection::default());
}

/// SHA-256 vectors from FIPS 180-2 appendix B.
#[test]
fn sha256_known_vectors() {
    let vectors: &[(&[u8], &str)] = &[
        (
            b"",
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
        ),
        (
            b"abc",
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad",
        ),
        (
            b"abcdbcdecdefdefgefghfghighijhijkijkljklmklmnlmnomnopnopq",
            "248d6a61d20638b8e5c026930c3e6039a33ce45964ff2167f6ecedd419db06c1",
        ),
    ];
    for (input, expected) in vectors {
        let digest = ContentDigest::of_bytes(DigestAlgorithm::Sha256, input);
        assert_eq!(digest.to_string(), format!("sha256:{expected}"));
    }
}
