//! # chartprov-crypto: Signing and Verification
//!
//! Everything between a chart archive on disk and a trusted `.prov` file:
//!
//! - **Archive hashing** ([`sha256`]): streaming SHA-256 of an archive.
//! - **Key material** ([`keyring`]): OpenPGP transferable keys and keyrings,
//!   and name-based identity lookup.
//! - **Signatory** ([`signatory`]): clear-sign an archive's message block,
//!   verify a provenance file against a keyring.
//!
//! The OpenPGP packet, armor and cleartext framework handling all comes from
//! the `pgp` crate, so provenance files interoperate with GnuPG.
//!
//! ## Crate Policy
//!
//! - Depends only on `chartprov-core` internally.
//! - No mocking of cryptographic operations in tests. Keys come from GnuPG
//!   exports under `tests/data` and every test runs real SHA-2 and real
//!   EdDSA.

pub mod keyring;
pub mod sha256;
pub mod signatory;

pub use keyring::{
    fingerprint_hex, key_id_hex, load_key, load_keyring, select_identity, Entity, KeyRing, UserId,
};
pub use sha256::{digest_file, sum_archive};
pub use signatory::{Signatory, SigningConfig, Verification};
