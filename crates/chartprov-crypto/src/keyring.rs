//! # Keyrings and Identity Resolution
//!
//! An [`Entity`] is one signer: an OpenPGP transferable key with its
//! subkeys, optionally the secret key material, and one or more user ids
//! such as `Jane Doe (chart signing) <jane@example.com>`. A [`KeyRing`] is an
//! ordered list of entities and serves as the trust store.
//!
//! ## File format
//!
//! Key and keyring files are OpenPGP transferable keys (RFC 4880 section 11),
//! binary or ASCII-armored, exactly as `gpg --export` and
//! `gpg --export-secret-keys` write them. A keyring may mix public and
//! secret keys; a secret key contributes its public half to the trust store.
//!
//! ## Identity lookup
//!
//! [`select_identity`] resolves a user-supplied name the way GnuPG does: an
//! exact user id wins outright, otherwise the name may be any substring of a
//! user id as long as only one entity matches.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use pgp::composed::signed_key::{self, PublicOrSecret};
use pgp::composed::{SignedPublicKey, SignedSecretKey};
use pgp::packet::Signature;
use pgp::types::{Fingerprint, KeyId, PublicKeyTrait, SignedUser};
use serde::{Deserialize, Serialize};

use chartprov_core::{ProvenanceError, TrustError};

/// A user id label attached to an entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wrap a raw user id string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The full label.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The name part, before any `(comment)` or `<email>`.
    pub fn name(&self) -> &str {
        let end = self.0.find(['(', '<']).unwrap_or(self.0.len());
        self.0[..end].trim()
    }

    /// The text inside parentheses, if any.
    pub fn comment(&self) -> Option<&str> {
        let start = self.0.find('(')? + 1;
        let end = start + self.0[start..].find(')')?;
        Some(self.0[start..end].trim())
    }

    /// The text inside angle brackets, if any.
    pub fn email(&self) -> Option<&str> {
        let start = self.0.rfind('<')? + 1;
        let end = start + self.0[start..].find('>')?;
        Some(self.0[start..end].trim())
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A signer known to the keyring: one OpenPGP transferable key.
#[derive(Debug, Clone)]
pub struct Entity {
    public_key: SignedPublicKey,
    secret_key: Option<SignedSecretKey>,
    identities: Vec<UserId>,
}

impl Entity {
    /// Wrap a transferable public key.
    pub fn from_public(public_key: SignedPublicKey) -> Self {
        let identities = user_ids(&public_key.details.users);
        Self {
            public_key,
            secret_key: None,
            identities,
        }
    }

    /// Wrap a transferable secret key. The entity can sign.
    pub fn from_secret(secret_key: SignedSecretKey) -> Self {
        let identities = user_ids(&secret_key.details.users);
        Self {
            public_key: SignedPublicKey::from(secret_key.clone()),
            secret_key: Some(secret_key),
            identities,
        }
    }

    /// The public half, including subkeys and user id certifications.
    pub fn public_key(&self) -> &SignedPublicKey {
        &self.public_key
    }

    /// The secret key, if this entity carries one.
    pub fn secret_key(&self) -> Option<&SignedSecretKey> {
        self.secret_key.as_ref()
    }

    /// User id labels in key order.
    pub fn identities(&self) -> &[UserId] {
        &self.identities
    }

    /// The first user id, used when reporting who signed.
    pub fn primary_identity(&self) -> Option<&UserId> {
        self.identities.first()
    }

    /// Fingerprint of the primary key.
    pub fn fingerprint(&self) -> Fingerprint {
        self.public_key.fingerprint()
    }

    /// Key id of the primary key, as 16 upper-case hex digits.
    pub fn key_id(&self) -> String {
        key_id_hex(&self.public_key.key_id())
    }

    /// A copy without the secret key.
    pub fn to_public(&self) -> Self {
        Self {
            public_key: self.public_key.clone(),
            secret_key: None,
            identities: self.identities.clone(),
        }
    }

    /// True when `signature` names the primary key or one of the subkeys
    /// as its issuer, by fingerprint or by key id.
    pub fn is_issuer_of(&self, signature: &Signature) -> bool {
        let fingerprints = signature.issuer_fingerprint();
        let key_ids = signature.issuer();
        let named = |fingerprint: Fingerprint, key_id: KeyId| {
            fingerprints.iter().any(|f| **f == fingerprint) || key_ids.iter().any(|k| **k == key_id)
        };

        named(self.public_key.fingerprint(), self.public_key.key_id())
            || self
                .public_key
                .public_subkeys
                .iter()
                .any(|sub| named(sub.fingerprint(), sub.key_id()))
    }

    /// Check `signature` over `data` against the primary key, then each
    /// subkey. The first key that verifies wins.
    pub fn verify(&self, signature: &Signature, data: &[u8]) -> pgp::errors::Result<()> {
        let mut result = signature.verify(&self.public_key, data);
        for sub in &self.public_key.public_subkeys {
            if result.is_ok() {
                break;
            }
            result = signature.verify(sub, data);
        }
        result
    }
}

impl From<PublicOrSecret> for Entity {
    fn from(key: PublicOrSecret) -> Self {
        match key {
            PublicOrSecret::Public(pk) => Self::from_public(pk),
            PublicOrSecret::Secret(sk) => Self::from_secret(sk),
        }
    }
}

fn user_ids(users: &[SignedUser]) -> Vec<UserId> {
    users
        .iter()
        .map(|user| UserId::new(String::from_utf8_lossy(user.id.id())))
        .collect()
}

/// Upper-case hex of a fingerprint, the way `gpg --with-colons` prints it.
pub fn fingerprint_hex(fingerprint: &Fingerprint) -> String {
    fingerprint
        .as_bytes()
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect()
}

/// Upper-case hex of a key id.
pub fn key_id_hex(key_id: &KeyId) -> String {
    format!("{key_id:X}")
}

/// An ordered collection of trusted entities.
#[derive(Debug, Clone, Default)]
pub struct KeyRing {
    entities: Vec<Entity>,
}

impl KeyRing {
    /// Build a keyring from entities, preserving order.
    pub fn new(entities: Vec<Entity>) -> Self {
        Self { entities }
    }

    /// Entities in file order.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Number of entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// True when the keyring holds no entities.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Find the entity whose primary key has `fingerprint`.
    pub fn find_by_fingerprint(&self, fingerprint: &Fingerprint) -> Option<&Entity> {
        self.entities.iter().find(|e| e.fingerprint() == *fingerprint)
    }

    /// Find the first entity that issued `signature`.
    pub fn find_issuer(&self, signature: &Signature) -> Option<&Entity> {
        self.entities.iter().find(|e| e.is_issuer_of(signature))
    }

    /// Resolve a signing entity by name.
    ///
    /// See [`select_identity`] for the matching rules.
    pub fn find_by_name(&self, query: &str) -> Result<Option<&Entity>, TrustError> {
        let labels = self.entities.iter().enumerate().flat_map(|(index, entity)| {
            entity
                .identities
                .iter()
                .map(move |id| (index, id.as_str()))
        });
        Ok(select_identity(labels, query)?.map(|index| &self.entities[index]))
    }
}

/// Pick one entity index from `(entity index, label)` pairs.
///
/// 1. The first label equal to `query` selects its entity.
/// 2. Otherwise every entity with a label containing `query` is a
///    candidate: none gives `Ok(None)`, one gives that entity, and more than
///    one distinct entity is an ambiguity error.
///
/// Matching is case-sensitive. Several labels of one entity matching count
/// as a single candidate.
pub fn select_identity<'a, I>(labels: I, query: &str) -> Result<Option<usize>, TrustError>
where
    I: IntoIterator<Item = (usize, &'a str)>,
    I::IntoIter: Clone,
{
    let labels = labels.into_iter();

    if let Some((index, _)) = labels.clone().find(|(_, label)| *label == query) {
        return Ok(Some(index));
    }

    let mut candidates = BTreeSet::new();
    let mut matched_labels = Vec::new();
    for (index, label) in labels {
        if label.contains(query) {
            candidates.insert(index);
            matched_labels.push(label.to_string());
        }
    }

    match candidates.len() {
        0 => Ok(None),
        1 => Ok(candidates.into_iter().next()),
        _ => Err(TrustError::AmbiguousIdentity {
            query: query.to_string(),
            matches: matched_labels,
        }),
    }
}

/// Load a single entity from a key file.
///
/// The file may be binary or ASCII-armored and may hold a public or a
/// secret key. When it holds several keys the first one is used.
pub fn load_key(path: &Path) -> Result<Entity, ProvenanceError> {
    let data = fs::read(path).map_err(|e| ProvenanceError::io(path, e))?;
    if data.iter().all(u8::is_ascii_whitespace) {
        return Err(unparseable(path, "file is empty").into());
    }
    read_entities(path, &data)?
        .into_iter()
        .next()
        .ok_or_else(|| unparseable(path, "no OpenPGP key found").into())
}

/// Load every entity from a keyring file.
///
/// An empty file is an empty keyring. Public and secret keys may be mixed.
pub fn load_keyring(path: &Path) -> Result<KeyRing, ProvenanceError> {
    let data = fs::read(path).map_err(|e| ProvenanceError::io(path, e))?;
    if data.iter().all(u8::is_ascii_whitespace) {
        return Ok(KeyRing::default());
    }
    let entities = read_entities(path, &data)?;
    if entities.is_empty() {
        return Err(unparseable(path, "no OpenPGP key found").into());
    }
    Ok(KeyRing::new(entities))
}

fn read_entities(path: &Path, data: &[u8]) -> Result<Vec<Entity>, TrustError> {
    let (keys, _headers) =
        signed_key::from_reader_many(data).map_err(|e| unparseable(path, e))?;
    keys.map(|key| key.map(Entity::from))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| unparseable(path, e))
}

fn unparseable(path: &Path, reason: impl std::fmt::Display) -> TrustError {
    TrustError::KeyUnparseable {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}
