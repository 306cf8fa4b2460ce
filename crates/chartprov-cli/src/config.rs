//! # CLI Configuration
//!
//! Settings shared by every subcommand, read from an optional YAML file:
//!
//! ```yaml
//! keyring: /home/me/.chartprov/keyring.gpg
//! key: "Chart Signer"
//! signing:
//!   hash: sha512
//! ```
//!
//! The file lives at `--config`, or `$CHARTPROV_HOME/config.yaml` when no
//! flag is given. `CHARTPROV_HOME` defaults to `~/.chartprov`.
//!
//! Values resolve in this order: command-line flag, environment variable
//! (`CHARTPROV_KEYRING`, `CHARTPROV_KEY`, read by clap into the flag), the
//! config file, then the built-in default.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use chartprov_crypto::SigningConfig;

/// Name of the config file inside the home directory.
pub const CONFIG_FILE: &str = "config.yaml";
/// Name of the default keyring inside the home directory.
///
/// An OpenPGP keyring, binary or armored, such as the output of
/// `gpg --export-secret-keys`.
pub const KEYRING_FILE: &str = "keyring.gpg";

/// Contents of the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Keyring used for signing-key lookup and verification.
    pub keyring: Option<PathBuf>,
    /// Identity name of the signing key.
    pub key: Option<String>,
    /// Signature parameters.
    pub signing: SigningConfig,
}

/// Home directory plus loaded config, handed to every subcommand.
#[derive(Debug, Clone)]
pub struct CliContext {
    /// Directory holding the default config file and keyring.
    pub home: PathBuf,
    /// Parsed config file, or defaults when there is none.
    pub config: CliConfig,
}

impl CliContext {
    /// Load the config file.
    ///
    /// An explicit `config_path` must exist. The default location is
    /// optional and a missing file means default settings.
    pub fn load(home: PathBuf, config_path: Option<&Path>) -> Result<Self> {
        let (path, required) = match config_path {
            Some(p) => (p.to_path_buf(), true),
            None => (home.join(CONFIG_FILE), false),
        };

        let config = if !required && !path.exists() {
            tracing::debug!(path = %path.display(), "no config file; using defaults");
            CliConfig::default()
        } else {
            let data = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config file: {}", path.display()))?;
            if data.trim().is_empty() {
                CliConfig::default()
            } else {
                serde_yaml::from_str(&data)
                    .with_context(|| format!("failed to parse config file: {}", path.display()))?
            }
        };

        Ok(Self { home, config })
    }

    /// Keyring path: flag (or its env var), config file, then the default.
    pub fn keyring_path(&self, flag: Option<&Path>) -> PathBuf {
        flag.map(Path::to_path_buf)
            .or_else(|| self.config.keyring.clone())
            .unwrap_or_else(|| self.home.join(KEYRING_FILE))
    }

    /// Signing key name: flag (or its env var), then config file.
    pub fn key_name(&self, flag: Option<&str>) -> Option<String> {
        flag.map(str::to_string).or_else(|| self.config.key.clone())
    }
}

/// `$CHARTPROV_HOME` is read by clap; this is the fallback.
pub fn default_home() -> PathBuf {
    std::env::var_os("HOME")
        .map(|h| PathBuf::from(h).join(".chartprov"))
        .unwrap_or_else(|| PathBuf::from(".chartprov"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chartprov_core::DigestAlgorithm;

    #[test]
    fn missing_default_config_is_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = CliContext::load(dir.path().to_path_buf(), None).unwrap();
        assert_eq!(ctx.config, CliConfig::default());
        assert_eq!(ctx.keyring_path(None), dir.path().join("keyring.gpg"));
        assert_eq!(ctx.key_name(None), None);
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.yaml");
        assert!(CliContext::load(dir.path().to_path_buf(), Some(&missing)).is_err());
    }

    #[test]
    fn config_file_in_home_is_read() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "keyring: /etc/chartprov/ring.gpg\nkey: release\nsigning:\n  hash: sha256\n",
        )
        .unwrap();
        let ctx = CliContext::load(dir.path().to_path_buf(), None).unwrap();
        assert_eq!(ctx.keyring_path(None), PathBuf::from("/etc/chartprov/ring.gpg"));
        assert_eq!(ctx.key_name(None).as_deref(), Some("release"));
        assert_eq!(ctx.config.signing.hash, DigestAlgorithm::Sha256);
    }

    #[test]
    fn flags_override_config_file() {
        let ctx = CliContext {
            home: PathBuf::from("/home/me/.chartprov"),
            config: CliConfig {
                keyring: Some(PathBuf::from("/from/config.gpg")),
                key: Some("config-key".to_string()),
                signing: SigningConfig::default(),
            },
        };
        assert_eq!(
            ctx.keyring_path(Some(Path::new("/from/flag.gpg"))),
            PathBuf::from("/from/flag.gpg")
        );
        assert_eq!(ctx.key_name(Some("flag-key")).as_deref(), Some("flag-key"));
    }

    #[test]
    fn malformed_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, "signing: [not, a, map]\n").unwrap();
        assert!(CliContext::load(dir.path().to_path_buf(), Some(&path)).is_err());
    }
}
