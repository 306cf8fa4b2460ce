//! # Signatory
//!
//! Signs chart archives and verifies their provenance files.
//!
//! A [`Signatory`] holds an optional signing [`Entity`] and a [`KeyRing`] of
//! trusted signers. It is built once from key material on disk and then only
//! read, so one instance may verify many archives, from several threads.
//!
//! Provenance files are OpenPGP cleartext signed messages (RFC 4880 section
//! 7) whose signed text is the message block. Files written by
//! `gpg --clearsign` over a message block verify the same way as files this
//! module writes.
//!
//! ## Security Invariant
//!
//! - Both paths given to [`Signatory::verify`] are checked to be files before
//!   any hashing or signature work.
//! - The message block is decoded only from the signed text of a signature
//!   that has already been verified against the keyring. The signed text is
//!   the cleartext with dash escapes removed and trailing spaces and tabs
//!   trimmed from every line, so whitespace outside the signature never
//!   reaches the decoder.
//! - Lines of the message block are trimmed the same way before signing.
//! - Integrity checks compare the archive basename's recorded digest against
//!   a fresh SHA-256 of the archive bytes. Image digests are carried but not
//!   checked.

use std::fmt;
use std::fs;
use std::path::Path;

use chrono::{DateTime, SubsecRound, Utc};
use pgp::composed::cleartext::CleartextSignedMessage;
use pgp::crypto::hash::HashAlgorithm;
use pgp::packet::{Signature, SignatureConfig, SignatureType, Subpacket, SubpacketData};
use pgp::types::{KeyVersion, PublicKeyTrait};
use pgp::ArmorOptions;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use chartprov_core::{
    message, load_archive_metadata, DigestAlgorithm, FormatError, IntegrityError,
    ProvenanceError, TrustError,
};

use crate::keyring::{fingerprint_hex, key_id_hex, load_key, load_keyring, Entity, KeyRing};
use crate::sha256::sum_archive;

/// Parameters of the signatures a [`Signatory`] issues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SigningConfig {
    /// Hash used for the signature digest.
    pub hash: DigestAlgorithm,
    /// Fixed creation time. `None` means the current time at signing.
    pub created: Option<DateTime<Utc>>,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            hash: DigestAlgorithm::Sha512,
            created: None,
        }
    }
}

/// The outcome of a successful verification.
#[derive(Debug, Clone)]
pub struct Verification {
    /// The keyring entity whose key made the signature.
    pub signed_by: Entity,
    /// The matched archive digest, e.g. `sha256:<hex>`.
    pub file_hash: String,
    /// Creation time recorded in the signature.
    pub signed_at: DateTime<Utc>,
    /// Hash used for the signature digest, as named in the `Hash:` header.
    pub signature_hash: String,
}

/// Passphrase for a protected secret key. Wiped on drop, never printed.
#[derive(Clone, Default)]
struct Passphrase(Zeroizing<String>);

impl fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Passphrase(..)")
    }
}

/// Signing identity plus trust store.
#[derive(Debug, Clone, Default)]
pub struct Signatory {
    entity: Option<Entity>,
    keyring: KeyRing,
    config: SigningConfig,
    passphrase: Passphrase,
}

impl Signatory {
    /// Assemble a signatory from already-loaded key material.
    pub fn new(entity: Option<Entity>, keyring: KeyRing) -> Self {
        Self {
            entity,
            keyring,
            config: SigningConfig::default(),
            passphrase: Passphrase::default(),
        }
    }

    /// Load the signing entity from `keyfile` and the trust store from
    /// `keyringfile`.
    pub fn from_files(keyfile: &Path, keyringfile: &Path) -> Result<Self, ProvenanceError> {
        let entity = load_key(keyfile)?;
        let keyring = load_keyring(keyringfile)?;
        Ok(Self::new(Some(entity), keyring))
    }

    /// Load a keyring and pick the signing entity from it by name.
    ///
    /// An empty `id` leaves the signing entity unset, as does a name that
    /// matches nothing. In both cases verification still works and signing
    /// fails with "private key not found". A name matching several entities
    /// is an error.
    pub fn from_keyring(keyringfile: &Path, id: &str) -> Result<Self, ProvenanceError> {
        let keyring = load_keyring(keyringfile)?;
        if id.is_empty() {
            return Ok(Self::new(None, keyring));
        }

        let entity = keyring.find_by_name(id)?.cloned();
        match &entity {
            Some(e) => tracing::debug!(id, key_id = %e.key_id(), "resolved signing identity"),
            None => tracing::debug!(id, "no keyring identity matches; signing disabled"),
        }
        Ok(Self::new(entity, keyring))
    }

    /// Replace the signing configuration.
    pub fn with_config(mut self, config: SigningConfig) -> Self {
        self.config = config;
        self
    }

    /// Passphrase used to unlock a protected secret key when signing.
    pub fn with_passphrase(mut self, passphrase: impl Into<String>) -> Self {
        self.passphrase = Passphrase(Zeroizing::new(passphrase.into()));
        self
    }

    /// Assign a signing entity after construction.
    pub fn set_entity(&mut self, entity: Option<Entity>) {
        self.entity = entity;
    }

    /// The signing entity, if any.
    pub fn entity(&self) -> Option<&Entity> {
        self.entity.as_ref()
    }

    /// The trust store.
    pub fn keyring(&self) -> &KeyRing {
        &self.keyring
    }

    /// The signing configuration.
    pub fn config(&self) -> &SigningConfig {
        &self.config
    }

    /// Produce the clear-signed provenance text for the archive at `path`.
    ///
    /// Nothing is written; persisting the result is up to the caller.
    pub fn clear_sign(&self, path: &Path) -> Result<String, ProvenanceError> {
        let secret = self
            .entity
            .as_ref()
            .and_then(Entity::secret_key)
            .ok_or(TrustError::PrivateKeyNotFound)?;

        let meta = fs::metadata(path).map_err(|e| ProvenanceError::io(path, e))?;
        if meta.is_dir() {
            return Err(ProvenanceError::CannotSignDirectory(path.to_path_buf()));
        }

        let digest = sum_archive(path)?;
        let metadata = load_archive_metadata(path)?;
        let block = message::encode_for_archive(&metadata, &basename(path), &digest)?;

        let created = self.config.created.unwrap_or_else(Utc::now).trunc_subsecs(0);
        let hash = hash_algorithm(self.config.hash);
        let mut config = match secret.version() {
            KeyVersion::V4 => SignatureConfig::v4(SignatureType::Text, secret.algorithm(), hash),
            KeyVersion::V6 => {
                SignatureConfig::v6(rand::thread_rng(), SignatureType::Text, secret.algorithm(), hash)
                    .map_err(signing_failed)?
            }
            other => {
                return Err(TrustError::SigningFailed(format!("unsupported key version {other:?}")).into())
            }
        };
        config.hashed_subpackets = vec![
            Subpacket::regular(SubpacketData::IssuerFingerprint(secret.fingerprint())),
            Subpacket::regular(SubpacketData::SignatureCreationTime(created)),
        ];
        config.unhashed_subpackets = vec![Subpacket::regular(SubpacketData::Issuer(secret.key_id()))];

        let passphrase = self.passphrase.0.clone();
        let signed = CleartextSignedMessage::new(&trim_line_ends(&block), config, secret, || {
            String::clone(&passphrase)
        })
        .map_err(signing_failed)?;
        let text = signed
            .to_armored_string(ArmorOptions::default())
            .map_err(signing_failed)?;

        tracing::debug!(
            archive = %path.display(),
            chart = %metadata.name,
            version = %metadata.version,
            key_id = %key_id_hex(&secret.key_id()),
            %digest,
            "signed chart archive"
        );
        Ok(text)
    }

    /// Check the provenance file at `sigpath` against the archive at
    /// `chartpath`.
    pub fn verify(&self, chartpath: &Path, sigpath: &Path) -> Result<Verification, ProvenanceError> {
        for path in [chartpath, sigpath] {
            let meta = fs::metadata(path).map_err(|e| ProvenanceError::io(path, e))?;
            if meta.is_dir() {
                return Err(ProvenanceError::IsDirectory(path.to_path_buf()));
            }
        }

        let text = fs::read_to_string(sigpath).map_err(|e| ProvenanceError::io(sigpath, e))?;
        let (signed, _headers) = CleartextSignedMessage::from_string(text.trim_start())
            .map_err(|_| FormatError::SignatureBlockNotFound)?;

        let (signer, signature) = match self.check_signature(&signed) {
            Ok(found) => found,
            Err(err) => {
                tracing::warn!(provenance = %sigpath.display(), error = %err, "signature rejected");
                return Err(err.into());
            }
        };

        let actual = sum_archive(chartpath)?.to_string();
        let (_, sums) = message::decode(&signed.signed_text().replace("\r\n", "\n"))?;

        let file = basename(chartpath);
        let expected = sums
            .files
            .get(&file)
            .ok_or_else(|| IntegrityError::MissingSum { file: file.clone() })?;
        if *expected != actual {
            return Err(IntegrityError::SumMismatch {
                file,
                expected: expected.clone(),
                actual,
            }
            .into());
        }

        tracing::debug!(
            archive = %chartpath.display(),
            key_id = %signer.key_id(),
            file_hash = %actual,
            "verified chart archive"
        );
        Ok(Verification {
            signed_by: signer.to_public(),
            file_hash: actual,
            signed_at: signature.created().copied().unwrap_or_default(),
            signature_hash: signature.hash_alg().to_string(),
        })
    }

    /// Authenticate a parsed cleartext message and return the signing
    /// entity with the signature that verified.
    ///
    /// Signatures are tried in file order. A signature whose issuer is in
    /// the keyring but fails to verify rejects the whole message.
    fn check_signature<'a>(
        &'a self,
        signed: &'a CleartextSignedMessage,
    ) -> Result<(&'a Entity, &'a Signature), TrustError> {
        let data = signed.signed_text();
        let mut unknown = None;

        for standalone in signed.signatures() {
            let signature = &standalone.signature;
            let Some(signer) = self.keyring.find_issuer(signature) else {
                unknown = Some(issuer_label(signature));
                continue;
            };
            signer
                .verify(signature, data.as_bytes())
                .map_err(|e| TrustError::InvalidSignature(e.to_string()))?;
            return Ok((signer, signature));
        }

        match unknown {
            Some(key_id) => Err(TrustError::UnknownSigner { key_id }),
            None => Err(TrustError::InvalidSignature("no signature present".to_string())),
        }
    }
}

fn hash_algorithm(digest: DigestAlgorithm) -> HashAlgorithm {
    match digest {
        DigestAlgorithm::Sha256 => HashAlgorithm::SHA2_256,
        DigestAlgorithm::Sha512 => HashAlgorithm::SHA2_512,
    }
}

fn signing_failed(err: pgp::errors::Error) -> TrustError {
    TrustError::SigningFailed(err.to_string())
}

/// Issuer key id of a signature, or its fingerprint when no key id is
/// recorded.
fn issuer_label(signature: &Signature) -> String {
    if let Some(key_id) = signature.issuer().first() {
        return key_id_hex(key_id);
    }
    signature
        .issuer_fingerprint()
        .first()
        .map(|fp| fingerprint_hex(fp))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Strip spaces and tabs at the end of every line.
fn trim_line_ends(text: &str) -> String {
    text.split_inclusive('\n')
        .map(|line| {
            let content = line.strip_suffix('\n').unwrap_or(line);
            let ending = &line[content.len()..];
            format!("{}{ending}", content.trim_end_matches([' ', '\t']))
        })
        .collect()
}

fn basename(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
