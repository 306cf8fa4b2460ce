//! # Provenance Message Block
//!
//! The plaintext payload that gets clear-signed: the chart's metadata as
//! YAML, a separator line, then the checksum collection as YAML.
//!
//! ```text
//! name: hello
//! version: 0.1.0
//!
//! ...
//! files:
//!   hello-0.1.0.tgz: sha256:8e9b...
//! ```
//!
//! The separator is the YAML document-end marker `...`. The document-start
//! marker `---` is unusable because a clear-signed message dash-escapes any
//! line beginning with `-`. serde_yaml always quotes a scalar `...`, so the
//! separator cannot appear inside either sub-document.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::digest::ContentDigest;
use crate::error::FormatError;
use crate::metadata::Metadata;

/// Separator between the metadata and checksum sub-documents.
pub const SEPARATOR: &str = "\n...\n";

/// File and image checksums recorded in an attestation.
///
/// Files are keyed by archive basename, images by `IMAGE:TAG`. Values are
/// tagged digests such as `sha256:<hex>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SumCollection {
    /// Archive basename to tagged digest.
    #[serde(default)]
    pub files: BTreeMap<String, String>,
    /// Image reference to tagged digest. Carried but never verified.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub images: BTreeMap<String, String>,
}

impl SumCollection {
    /// A collection holding a single archive checksum.
    pub fn for_file(basename: impl Into<String>, digest: &ContentDigest) -> Self {
        let mut files = BTreeMap::new();
        files.insert(basename.into(), digest.to_string());
        Self {
            files,
            images: BTreeMap::new(),
        }
    }
}

/// Serialize metadata and sums into a message block.
pub fn encode(metadata: &Metadata, sums: &SumCollection) -> Result<String, FormatError> {
    let mut block = serde_yaml::to_string(metadata).map_err(|source| FormatError::Serialize {
        part: "metadata",
        source,
    })?;
    block.push_str(SEPARATOR);
    let sums_yaml = serde_yaml::to_string(sums).map_err(|source| FormatError::Serialize {
        part: "sums",
        source,
    })?;
    block.push_str(&sums_yaml);
    Ok(block)
}

/// Build the message block for one archive.
pub fn encode_for_archive(
    metadata: &Metadata,
    basename: &str,
    digest: &ContentDigest,
) -> Result<String, FormatError> {
    encode(metadata, &SumCollection::for_file(basename, digest))
}

/// Split a message block back into metadata and sums.
///
/// Parts after the second separator are ignored.
pub fn decode(block: &str) -> Result<(Metadata, SumCollection), FormatError> {
    let mut parts = block.split(SEPARATOR);
    let (Some(metadata_part), Some(sums_part)) = (parts.next(), parts.next()) else {
        return Err(FormatError::MalformedMessageBlock);
    };

    let metadata = parse_part::<Metadata>(metadata_part, "metadata")?;
    let sums = parse_part::<SumCollection>(sums_part, "sums")?;
    Ok((metadata, sums))
}

fn parse_part<T>(part: &str, name: &'static str) -> Result<T, FormatError>
where
    T: for<'de> Deserialize<'de> + Default,
{
    // An empty YAML document is null; treat it as an empty record.
    if part.trim().is_empty() {
        return Ok(T::default());
    }
    serde_yaml::from_str(part).map_err(|source| FormatError::Yaml { part: name, source })
}
