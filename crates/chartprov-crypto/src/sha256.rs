//! # Archive Hashing
//!
//! Streams a file through a [`Hasher`] in fixed-size chunks and returns the
//! tagged digest. Archives are never loaded into memory whole.
//!
//! Delegates the hash itself to [`chartprov_core::Hasher`], the single
//! implementation in the workspace.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use chartprov_core::{ContentDigest, DigestAlgorithm, Hasher, ProvenanceError};

const CHUNK_SIZE: usize = 32 * 1024;

/// Compute the SHA-256 digest of an archive file.
///
/// This is the digest recorded in, and checked against, checksum
/// collections.
pub fn sum_archive(path: &Path) -> Result<ContentDigest, ProvenanceError> {
    digest_file(path, DigestAlgorithm::Sha256)
}

/// Compute the digest of a file with the given algorithm.
pub fn digest_file(path: &Path, algorithm: DigestAlgorithm) -> Result<ContentDigest, ProvenanceError> {
    let mut file = File::open(path).map_err(|e| ProvenanceError::io(path, e))?;
    digest_reader(&mut file, algorithm).map_err(|e| ProvenanceError::io(path, e))
}

/// Compute the digest of everything a reader yields.
pub fn digest_reader<R: Read>(
    reader: &mut R,
    algorithm: DigestAlgorithm,
) -> std::io::Result<ContentDigest> {
    let mut hasher = Hasher::new(algorithm);
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize())
}
