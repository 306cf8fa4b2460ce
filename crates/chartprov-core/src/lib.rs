//! # chartprov-core: Foundational Types for Chart Provenance
//!
//! This crate defines the data that flows through signing and verification
//! without touching key material:
//!
//! - **Errors**: the four-class [`ProvenanceError`] taxonomy shared by every
//!   crate in the workspace.
//! - **Digests**: [`ContentDigest`] values tagged with their
//!   [`DigestAlgorithm`], rendered as `sha256:<hex>`.
//! - **Metadata**: the chart manifest record embedded in attestations.
//! - **Message block**: the metadata + checksum payload that gets
//!   clear-signed, and its inverse parser.
//! - **Chart archives**: reading `Chart.yaml` out of a packaged chart.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `chartprov-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod chart;
pub mod digest;
pub mod error;
pub mod message;
pub mod metadata;

// Re-export primary types for ergonomic imports.
pub use chart::load_archive_metadata;
pub use digest::{ContentDigest, DigestAlgorithm, Hasher};
pub use error::{FormatError, IntegrityError, ProvenanceError, TrustError};
pub use message::SumCollection;
pub use metadata::{Maintainer, Metadata};
