//! # chartprov-cli: Chart Provenance Command-Line Interface
//!
//! Provides the `chartprov` command:
//!
//! - `chartprov sign`: sign a chart archive, writing `<archive>.prov`.
//! - `chartprov verify`: check an archive against its provenance file.
//! - `chartprov inspect`: print what a provenance file claims.
//!
//! ```bash
//! chartprov sign hello-0.1.0.tgz --key "Chart Signer"
//! chartprov verify hello-0.1.0.tgz --keyring ~/.chartprov/keyring.gpg
//! chartprov inspect hello-0.1.0.tgz.prov --json
//! ```
//!
//! ## Crate Policy
//!
//! - Argument parsing lives here; signing and verification live in
//!   `chartprov-crypto`.
//! - Handlers return `anyhow::Result<u8>`, the process exit code.

pub mod config;
pub mod inspect;
pub mod signing;
pub mod verify;
