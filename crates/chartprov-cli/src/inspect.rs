//! # Inspect Subcommand
//!
//! Prints what a provenance file claims without checking the signature:
//! the chart metadata, the recorded checksums, and the issuer the
//! signature packet names.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Args;
use pgp::composed::cleartext::CleartextSignedMessage;
use serde::Serialize;

use chartprov_core::{message, Metadata, SumCollection};
use chartprov_crypto::{fingerprint_hex, key_id_hex};

/// Arguments for `chartprov inspect`.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Provenance file to read.
    #[arg(value_name = "PROV")]
    pub prov: PathBuf,

    /// Print as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Decoded, unverified view of a provenance file.
#[derive(Debug, Serialize)]
pub struct Inspection {
    /// Chart metadata from the first half of the message block.
    pub metadata: Metadata,
    /// Recorded archive and image digests.
    pub sums: SumCollection,
    /// What the first signature packet claims about itself.
    pub signature: SignatureSummary,
}

/// Unverified fields of a signature packet.
#[derive(Debug, Serialize)]
pub struct SignatureSummary {
    /// Issuer key id, 16 upper-case hex digits. Empty when not recorded.
    pub key_id: String,
    /// Issuer fingerprint, upper-case hex. Empty when not recorded.
    pub fingerprint: String,
    /// Signature hash algorithm, e.g. `SHA512`.
    pub hash: String,
    /// Signature creation time, RFC 3339. Empty when not recorded.
    pub created: String,
}

/// Decode provenance text into an [`Inspection`].
pub fn inspect_text(text: &str) -> Result<Inspection> {
    let (signed, _headers) = CleartextSignedMessage::from_string(text.trim_start())
        .map_err(|_| anyhow!("signature block not found"))?;
    let signature = &signed
        .signatures()
        .first()
        .ok_or_else(|| anyhow!("signature block not found"))?
        .signature;
    let (metadata, sums) = message::decode(&signed.signed_text().replace("\r\n", "\n"))?;

    Ok(Inspection {
        metadata,
        sums,
        signature: SignatureSummary {
            key_id: signature
                .issuer()
                .first()
                .map(|id| key_id_hex(id))
                .unwrap_or_default(),
            fingerprint: signature
                .issuer_fingerprint()
                .first()
                .map(|fp| fingerprint_hex(fp))
                .unwrap_or_default(),
            hash: signature.hash_alg().to_string(),
            created: signature
                .created()
                .map(|t| t.to_rfc3339())
                .unwrap_or_default(),
        },
    })
}

/// Execute `chartprov inspect`.
pub fn run_inspect(args: &InspectArgs) -> Result<u8> {
    let text = std::fs::read_to_string(&args.prov)
        .with_context(|| format!("failed to read provenance file: {}", args.prov.display()))?;
    let inspection = inspect_text(&text)
        .with_context(|| format!("failed to decode {}", args.prov.display()))?;

    if args.json {
        let out = serde_json::to_string_pretty(&inspection).context("failed to serialize")?;
        println!("{out}");
        return Ok(0);
    }

    let md = &inspection.metadata;
    println!("Chart: {} {}", md.name, md.version);
    if !md.description.is_empty() {
        println!("Description: {}", md.description);
    }
    println!("Files:");
    for (file, sum) in &inspection.sums.files {
        println!("  {file}: {sum}");
    }
    if !inspection.sums.images.is_empty() {
        println!("Images:");
        for (image, sum) in &inspection.sums.images {
            println!("  {image}: {sum}");
        }
    }
    let sig = &inspection.signature;
    println!("Signing Key ID: {}", sig.key_id);
    if !sig.fingerprint.is_empty() {
        println!("Signing Key Fingerprint: {}", sig.fingerprint);
    }
    println!("Signature Hash: {}", sig.hash);
    println!("Signed At: {}", sig.created);
    Ok(0)
}
