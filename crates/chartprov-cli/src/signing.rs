//! # Sign Subcommand
//!
//! Signs a chart archive and writes `<archive>.prov` next to it.
//!
//! The signing key comes from `--key-file`, or is looked up by name
//! (`--key`, `CHARTPROV_KEY`, or the config file) in the keyring. Either
//! way it is an OpenPGP secret key; a protected key is unlocked with the
//! first line of `--passphrase-file`.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;

use chartprov_crypto::{load_key, load_keyring, KeyRing, Signatory};

use crate::config::CliContext;

/// Arguments for `chartprov sign`.
#[derive(Args, Debug)]
pub struct SignArgs {
    /// Chart archive to sign.
    #[arg(value_name = "ARCHIVE")]
    pub archive: PathBuf,

    /// Name (or unique part of a name) of the signing identity in the keyring.
    #[arg(long, env = "CHARTPROV_KEY")]
    pub key: Option<String>,

    /// Key file holding the signing identity. Takes precedence over --key.
    #[arg(long)]
    pub key_file: Option<PathBuf>,

    /// Keyring to look the signing key up in.
    #[arg(long, env = "CHARTPROV_KEYRING")]
    pub keyring: Option<PathBuf>,

    /// File whose first line is the passphrase of the signing key.
    #[arg(long, env = "CHARTPROV_PASSPHRASE_FILE")]
    pub passphrase_file: Option<PathBuf>,

    /// Where to write the provenance file (default: <ARCHIVE>.prov).
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

/// Execute `chartprov sign`.
pub fn run_sign(args: &SignArgs, ctx: &CliContext) -> Result<u8> {
    let keyring_path = ctx.keyring_path(args.keyring.as_deref());

    let signatory = match &args.key_file {
        Some(key_file) => {
            let entity = load_key(key_file)
                .with_context(|| format!("failed to load signing key: {}", key_file.display()))?;
            let keyring = if keyring_path.exists() {
                load_keyring(&keyring_path)?
            } else {
                KeyRing::default()
            };
            Signatory::new(Some(entity), keyring)
        }
        None => {
            let Some(name) = ctx.key_name(args.key.as_deref()) else {
                bail!("no signing key selected: pass --key or --key-file");
            };
            let signatory = Signatory::from_keyring(&keyring_path, &name)
                .with_context(|| format!("failed to load keyring: {}", keyring_path.display()))?;
            if signatory.entity().is_none() {
                bail!(
                    "no key in {} matches {name:?}",
                    keyring_path.display()
                );
            }
            signatory
        }
    }
    .with_config(ctx.config.signing.clone());
    let signatory = match &args.passphrase_file {
        Some(path) => signatory.with_passphrase(read_passphrase(path)?),
        None => signatory,
    };

    let text = signatory
        .clear_sign(&args.archive)
        .with_context(|| format!("failed to sign {}", args.archive.display()))?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| provenance_path(&args.archive));
    write_provenance(&output, &text)?;

    tracing::info!(provenance = %output.display(), "wrote provenance file");
    tracing::info!("\n{text}");
    println!("Signed {} -> {}", args.archive.display(), output.display());
    Ok(0)
}

/// First line of a passphrase file, without its line ending.
fn read_passphrase(path: &Path) -> Result<String> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read passphrase file: {}", path.display()))?;
    Ok(data.lines().next().unwrap_or_default().to_string())
}

/// `<archive>.prov`.
pub fn provenance_path(archive: &Path) -> PathBuf {
    let mut name = archive.as_os_str().to_os_string();
    name.push(".prov");
    PathBuf::from(name)
}

/// Write provenance text world-readable and not executable.
pub fn write_provenance(path: &Path, text: &str) -> Result<()> {
    std::fs::write(path, text)
        .with_context(|| format!("failed to write provenance file: {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o644))
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }
    Ok(())
}
