//! # Content Digest: Algorithm-Tagged Hashes
//!
//! Defines `ContentDigest` and `DigestAlgorithm`, the self-describing digest
//! values recorded in provenance checksum collections (`sha256:<hex>`) and
//! used as the hash step of signature creation.
//!
//! [`Hasher`] is the single incremental hashing implementation in the
//! workspace. The archive hasher and the signature packet both feed it, so
//! the algorithm tag on a digest always matches the function that produced
//! it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};

/// Hash algorithm family.
///
/// SHA-256 addresses archive content. SHA-512 is the default strength for
/// new signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    /// SHA-256, 32-byte output.
    Sha256,
    /// SHA-512, 64-byte output.
    Sha512,
}

impl DigestAlgorithm {
    /// Returns the lower-case tag used as a digest prefix.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
        }
    }

    /// Output length in bytes.
    pub fn output_len(&self) -> usize {
        match self {
            Self::Sha256 => 32,
            Self::Sha512 => 64,
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha256" => Ok(Self::Sha256),
            "sha512" => Ok(Self::Sha512),
            other => Err(format!("unsupported digest algorithm: {other}")),
        }
    }
}

/// A digest value with its algorithm tag.
///
/// Displays as `<algorithm>:<lower-case hex>`, the form stored in
/// checksum collections.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentDigest {
    algorithm: DigestAlgorithm,
    bytes: Vec<u8>,
}

impl ContentDigest {
    /// Create a digest from raw output bytes.
    ///
    /// Returns `None` when the length does not match the algorithm.
    pub fn new(algorithm: DigestAlgorithm, bytes: Vec<u8>) -> Option<Self> {
        (bytes.len() == algorithm.output_len()).then_some(Self { algorithm, bytes })
    }

    /// Compute a digest over an in-memory buffer.
    pub fn of_bytes(algorithm: DigestAlgorithm, data: &[u8]) -> Self {
        let mut hasher = Hasher::new(algorithm);
        hasher.update(data);
        hasher.finalize()
    }

    /// The algorithm that produced this digest.
    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Render the digest as a lower-case hex string, without the tag.
    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Parse a tagged digest string such as `sha256:<hex>`.
    pub fn parse(tagged: &str) -> Result<Self, String> {
        let (tag, hex) = tagged
            .split_once(':')
            .ok_or_else(|| format!("digest {tagged:?} has no algorithm prefix"))?;
        let algorithm: DigestAlgorithm = tag.parse()?;
        if hex.len() != algorithm.output_len() * 2 {
            return Err(format!(
                "{algorithm} digest must be {} hex chars, got {}",
                algorithm.output_len() * 2,
                hex.len()
            ));
        }
        let bytes = (0..hex.len())
            .step_by(2)
            .map(|i| {
                hex.get(i..i + 2)
                    .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                    .ok_or_else(|| format!("invalid hex at position {i}"))
            })
            .collect::<Result<Vec<u8>, String>>()?;
        Ok(Self { algorithm, bytes })
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.to_hex())
    }
}

/// Incremental hasher over any [`DigestAlgorithm`].
#[derive(Clone)]
pub enum Hasher {
    /// SHA-256 state.
    Sha256(Sha256),
    /// SHA-512 state.
    Sha512(Sha512),
}

impl Hasher {
    /// Start a new hash computation.
    pub fn new(algorithm: DigestAlgorithm) -> Self {
        match algorithm {
            DigestAlgorithm::Sha256 => Self::Sha256(Sha256::new()),
            DigestAlgorithm::Sha512 => Self::Sha512(Sha512::new()),
        }
    }

    /// Feed more input.
    pub fn update(&mut self, data: &[u8]) {
        match self {
            Self::Sha256(h) => h.update(data),
            Self::Sha512(h) => h.update(data),
        }
    }

    /// Finish and return the tagged digest.
    pub fn finalize(self) -> ContentDigest {
        match self {
            Self::Sha256(h) => ContentDigest {
                algorithm: DigestAlgorithm::Sha256,
                bytes: h.finalize().to_vec(),
            },
            Self::Sha512(h) => ContentDigest {
                algorithm: DigestAlgorithm::Sha512,
                bytes: h.finalize().to_vec(),
            },
        }
    }
}

impl fmt::Debug for Hasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha256(_) => f.write_str("Hasher(sha256)"),
            Self::Sha512(_) => f.write_str("Hasher(sha512)"),
        }
    }
}
