//! Chain data structures.

use ed25519_dalek::VerifyingKey;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Borrow;
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;

use crate::chain::ChainError;

/// Identifier of an entry, derived from the signature over its signable payload.
///
/// The same string is both the key of the entry inside a [`History`] and the
/// authentication tag checked during merge.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProofId(String);

impl ProofId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ProofId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProofId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hex-encoded Ed25519 public key declared by a root or rotation entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VerificationKey(String);

impl VerificationKey {
    pub fn from_verifying_key(key: &VerifyingKey) -> Self {
        Self(hex::encode(key.to_bytes()))
    }

    /// Wrap a hex string without checking it. Undecodable keys verify nothing.
    pub fn from_hex(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode into an Ed25519 verifying key, if the hex is a valid point.
    pub fn to_verifying_key(&self) -> Option<VerifyingKey> {
        let bytes = hex::decode(&self.0).ok()?;
        let array: [u8; 32] = bytes.try_into().ok()?;
        VerifyingKey::from_bytes(&array).ok()
    }
}

impl fmt::Display for VerificationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Headers of a chain entry.
///
/// Absent fields deserialize as `None`; unknown fields are rejected.
/// `next` is the only field that may change after signing and is assigned at
/// most once through [`Header::set_next`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Header {
    /// Logical owner of the whole history.
    #[serde(default)]
    pub subject: Option<String>,

    /// Proof of the causal predecessor; `None` only on the root.
    #[serde(default)]
    pub prev: Option<ProofId>,

    #[serde(default)]
    pub(crate) next: Option<ProofId>,

    /// Key rotation: governs verification starting with the following entry.
    #[serde(default)]
    pub verification_key: Option<VerificationKey>,
}

impl Header {
    /// Headers for a non-root entry following `prev`.
    pub fn new(subject: impl Into<String>, prev: Option<ProofId>) -> Self {
        Self {
            subject: Some(subject.into()),
            prev,
            next: None,
            verification_key: None,
        }
    }

    /// Headers for a root entry declaring the initial verification key.
    pub fn root(subject: impl Into<String>, key: VerificationKey) -> Self {
        Self {
            subject: Some(subject.into()),
            prev: None,
            next: None,
            verification_key: Some(key),
        }
    }

    /// Declare a key rotation on these headers.
    pub fn with_rotation(mut self, key: Option<VerificationKey>) -> Self {
        self.verification_key = key;
        self
    }

    /// Supply a successor pointer on fresh headers, before they are signed.
    pub fn with_next(mut self, next: Option<ProofId>) -> Self {
        self.next = next;
        self
    }

    pub fn next(&self) -> Option<&ProofId> {
        self.next.as_ref()
    }

    /// Record the successor of this entry.
    ///
    /// Succeeds when `next` is unset or already equal to `proof`; a different
    /// existing successor is never overwritten.
    pub fn set_next(&mut self, proof: ProofId) -> Result<(), ChainError> {
        match &self.next {
            None => {
                self.next = Some(proof);
                Ok(())
            }
            Some(current) if *current == proof => Ok(()),
            Some(current) => Err(ChainError::NextAlreadySet {
                current: current.clone(),
                attempted: proof,
            }),
        }
    }

    pub fn is_root(&self) -> bool {
        self.prev.is_none()
    }

    pub fn is_head(&self) -> bool {
        self.next.is_none()
    }
}

/// A single entry: signed headers plus an opaque JSON body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Entry {
    pub headers: Header,
    #[serde(default)]
    pub body: Value,
}

impl Entry {
    pub fn new(headers: Header, body: Value) -> Self {
        Self { headers, body }
    }
}

/// Mapping from proof id to entry.
///
/// Values handed out by merge and extend form one verified linear chain. A
/// history built with [`History::from_entries`] or decoded from a snapshot is
/// unvalidated until it has been through merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    entries: BTreeMap<ProofId, Entry>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an unvalidated history from raw entries.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (ProofId, Entry)>,
    {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, proof: &str) -> Option<&Entry> {
        self.entries.get(proof)
    }

    pub fn get_key_value(&self, proof: &str) -> Option<(&ProofId, &Entry)> {
        self.entries.get_key_value(proof)
    }

    pub fn contains(&self, proof: &str) -> bool {
        self.entries.contains_key(proof)
    }

    /// Entries in proof-id order (not chain order).
    pub fn iter(&self) -> btree_map::Iter<'_, ProofId, Entry> {
        self.entries.iter()
    }

    pub fn proofs(&self) -> impl Iterator<Item = &ProofId> {
        self.entries.keys()
    }

    /// Consume the history, yielding its raw entries.
    pub fn into_entries(self) -> BTreeMap<ProofId, Entry> {
        self.entries
    }

    pub(crate) fn insert(&mut self, proof: ProofId, entry: Entry) {
        self.entries.insert(proof, entry);
    }

    pub(crate) fn get_mut(&mut self, proof: &str) -> Option<&mut Entry> {
        self.entries.get_mut(proof)
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = (&'a ProofId, &'a Entry);
    type IntoIter = btree_map::Iter<'a, ProofId, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl FromIterator<(ProofId, Entry)> for History {
    fn from_iter<I: IntoIterator<Item = (ProofId, Entry)>>(iter: I) -> Self {
        Self::from_entries(iter)
    }
}
