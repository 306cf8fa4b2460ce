//! # Error Types: Provenance Error Taxonomy
//!
//! Defines the error types shared by every chartprov crate. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! Errors fall into four classes, each with its own enum so callers can
//! match on the class without inspecting messages:
//!
//! - **Input**: missing or unreadable files, a directory where a file is
//!   required. Carried directly on [`ProvenanceError`].
//! - **Format**: malformed message blocks, unparseable YAML sub-documents,
//!   provenance files that are not OpenPGP cleartext signed messages,
//!   unreadable chart archives.
//! - **Trust**: unusable key material, ambiguous identity lookups, invalid
//!   signatures, signers absent from the keyring.
//! - **Integrity**: the recomputed archive digest is missing from, or does
//!   not match, the attestation's checksum collection.
//!
//! Every variant carries enough context (path, filename, expected and actual
//! digests) to render a precise message. None of these conditions is
//! transient, so nothing is retried.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Top-level error type for provenance operations.
#[derive(Error, Debug)]
pub enum ProvenanceError {
    /// A file could not be opened, stat'ed, or read.
    #[error("{}: {source}", .path.display())]
    Io {
        /// The file that failed.
        path: PathBuf,
        /// The underlying I/O failure.
        source: std::io::Error,
    },

    /// A directory was supplied where a regular file is required.
    #[error("{} cannot be a directory", .0.display())]
    IsDirectory(PathBuf),

    /// The signing target is a directory.
    #[error("cannot sign a directory: {}", .0.display())]
    CannotSignDirectory(PathBuf),

    /// Structural or encoding failure.
    #[error("format error: {0}")]
    Format(#[from] FormatError),

    /// Key material or signature failure.
    #[error("trust error: {0}")]
    Trust(#[from] TrustError),

    /// Archive digest missing from or mismatched against the attestation.
    #[error("integrity error: {0}")]
    Integrity(#[from] IntegrityError),
}

impl ProvenanceError {
    /// Wrap an I/O error with the path it occurred on.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

/// Errors in the shape of provenance documents and chart archives.
#[derive(Error, Debug)]
pub enum FormatError {
    /// The message block did not contain the metadata/sums separator.
    #[error("message block must have at least two parts")]
    MalformedMessageBlock,

    /// One half of the message block is not valid YAML for its type.
    #[error("failed to parse {part} section of message block: {source}")]
    Yaml {
        /// Which sub-document failed (`metadata` or `sums`).
        part: &'static str,
        /// The YAML error.
        source: serde_yaml::Error,
    },

    /// Serializing a sub-document of the message block failed.
    #[error("failed to serialize {part} section of message block: {source}")]
    Serialize {
        /// Which sub-document failed (`metadata` or `sums`).
        part: &'static str,
        /// The YAML error.
        source: serde_yaml::Error,
    },

    /// The provenance file is not an OpenPGP cleartext signed message.
    #[error("signature block not found")]
    SignatureBlockNotFound,

    /// The chart archive has no `<chart>/Chart.yaml` entry.
    #[error("Chart.yaml file is missing from {}", .0.display())]
    ChartYamlMissing(PathBuf),

    /// The chart archive could not be decompressed or unpacked.
    #[error("invalid chart archive {}: {reason}", .path.display())]
    Archive {
        /// The archive that failed.
        path: PathBuf,
        /// Decoder diagnostic.
        reason: String,
    },
}

/// Errors in key material, identity resolution, and signature checks.
#[derive(Error, Debug)]
pub enum TrustError {
    /// A key or keyring file did not contain parseable entities.
    #[error("no usable key material in {}: {reason}", .path.display())]
    KeyUnparseable {
        /// The key or keyring file.
        path: PathBuf,
        /// Parser diagnostic.
        reason: String,
    },

    /// Signing was requested without a secret key.
    #[error("private key not found")]
    PrivateKeyNotFound,

    /// The secret key could not be unlocked or could not produce a signature.
    #[error("failed to sign: {0}")]
    SigningFailed(String),

    /// More than one keyring entity loosely matched an identity name.
    #[error("more than one key contain the id {query:?}: {}", .matches.join(", "))]
    AmbiguousIdentity {
        /// The name that was searched for.
        query: String,
        /// Labels of the matching entities.
        matches: Vec<String>,
    },

    /// The signature is malformed or does not verify.
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// The signature was made by a key that is not in the keyring.
    #[error("signature made by unknown entity (key id {key_id})")]
    UnknownSigner {
        /// Key id recorded in the signature.
        key_id: String,
    },
}

/// Errors comparing the archive against its attestation.
#[derive(Error, Debug)]
pub enum IntegrityError {
    /// The checksum collection has no entry for the archive.
    #[error("provenance does not contain a SHA for a file named {file:?}")]
    MissingSum {
        /// Archive basename.
        file: String,
    },

    /// The recorded digest differs from the recomputed one.
    #[error("sha256 sum does not match for {file}: {expected:?} != {actual:?}")]
    SumMismatch {
        /// Archive basename.
        file: String,
        /// Digest recorded in the attestation.
        expected: String,
        /// Digest recomputed from the archive.
        actual: String,
    },
}
