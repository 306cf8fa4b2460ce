//! # Verify Subcommand
//!
//! Checks a chart archive against its provenance file and the keyring.
//! Exits 0 when the signature and the archive digest both check out, 1
//! otherwise.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use chartprov_crypto::{fingerprint_hex, Signatory, Verification};

use crate::config::CliContext;
use crate::signing::provenance_path;

/// Arguments for `chartprov verify`.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Chart archive to verify.
    #[arg(value_name = "ARCHIVE")]
    pub archive: PathBuf,

    /// Provenance file (default: <ARCHIVE>.prov).
    #[arg(long)]
    pub prov: Option<PathBuf>,

    /// Keyring of trusted signers.
    #[arg(long, env = "CHARTPROV_KEYRING")]
    pub keyring: Option<PathBuf>,

    /// Print the result as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Machine-readable verification result.
#[derive(Debug, Serialize)]
pub struct VerifyReport {
    /// True only when both the signature and the archive digest check out.
    pub verified: bool,
    /// User ids of the signing key.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub signed_by: Vec<String>,
    /// Primary key fingerprint of the signer, upper-case hex.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    /// The verified archive digest, `sha256:<hex>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_hash: Option<String>,
    /// Signature creation time, RFC 3339.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signed_at: Option<String>,
    /// Why verification failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&Verification> for VerifyReport {
    fn from(v: &Verification) -> Self {
        Self {
            verified: true,
            signed_by: v
                .signed_by
                .identities()
                .iter()
                .map(ToString::to_string)
                .collect(),
            fingerprint: Some(fingerprint_hex(&v.signed_by.fingerprint())),
            file_hash: Some(v.file_hash.clone()),
            signed_at: Some(v.signed_at.to_rfc3339()),
            error: None,
        }
    }
}

/// Execute `chartprov verify`.
pub fn run_verify(args: &VerifyArgs, ctx: &CliContext) -> Result<u8> {
    let keyring_path = ctx.keyring_path(args.keyring.as_deref());
    let prov = args
        .prov
        .clone()
        .unwrap_or_else(|| provenance_path(&args.archive));

    let signatory = Signatory::from_keyring(&keyring_path, "")
        .with_context(|| format!("failed to load keyring: {}", keyring_path.display()))?;
    tracing::debug!(
        keyring = %keyring_path.display(),
        entities = signatory.keyring().len(),
        "loaded keyring"
    );

    match signatory.verify(&args.archive, &prov) {
        Ok(v) => {
            if args.json {
                print_json(&VerifyReport::from(&v))?;
            } else {
                for id in v.signed_by.identities() {
                    println!("Signed by: {id}");
                }
                println!(
                    "Using Key With Fingerprint: {}",
                    fingerprint_hex(&v.signed_by.fingerprint())
                );
                println!("Chart Hash Verified: {}", v.file_hash);
            }
            Ok(0)
        }
        Err(e) if args.json => {
            print_json(&VerifyReport {
                verified: false,
                signed_by: Vec::new(),
                fingerprint: None,
                file_hash: None,
                signed_at: None,
                error: Some(e.to_string()),
            })?;
            Ok(1)
        }
        Err(e) => Err(anyhow::Error::new(e).context(format!(
            "failed to verify {} against {}",
            args.archive.display(),
            prov.display()
        ))),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("failed to serialize report")?;
    println!("{out}");
    Ok(())
}
