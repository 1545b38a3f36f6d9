//! History creation, extension, and chain digests.

use ed25519_dalek::SigningKey;
use serde_json::Value;
use sha3::{Digest, Sha3_256};
use thiserror::Error;
use tracing::debug;

use crate::merge::{merge, merge_with, MergeFailure, MergeOptions};
use crate::navigate::{canonical_order, find_head};
use crate::signature::create_entry;
use crate::types::{Header, History, ProofId, VerificationKey};

/// Errors that can occur during chain operations.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("Malformed history: {0}")]
    MalformedHistory(String),

    #[error("Subject must be a non-empty string")]
    InvalidSubject,

    #[error("Successor already set to {current}, refusing {attempted}")]
    NextAlreadySet { current: ProofId, attempted: ProofId },

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error(transparent)]
    Merge(#[from] MergeFailure),
}

fn well_formed_subject(subject: Option<&str>) -> Option<&str> {
    subject.filter(|s| !s.trim().is_empty())
}

/// Start a history for `subject` with a root entry declaring `verification_key`.
///
/// The root is validated through merge, so `signing_key` must match
/// `verification_key`.
pub fn create_history(
    subject: &str,
    body: Value,
    signing_key: &SigningKey,
    verification_key: VerificationKey,
) -> Result<History, ChainError> {
    let subject = well_formed_subject(Some(subject)).ok_or(ChainError::InvalidSubject)?;
    let (proof, entry) = create_entry(signing_key, Header::root(subject, verification_key), body)?;
    debug!(%proof, subject, "created history");
    let root = History::from_entries([(proof, entry)]);
    Ok(merge(&History::new(), &root)?)
}

/// Append `body` after the current head.
///
/// `rotate_to` declares a new verification key for every later entry.
/// The result is re-validated by merging against the untouched `history`.
pub fn extend(
    history: &History,
    body: Value,
    signing_key: &SigningKey,
    rotate_to: Option<VerificationKey>,
) -> Result<History, ChainError> {
    extend_with(history, body, signing_key, rotate_to, &MergeOptions::default())
}

pub fn extend_with(
    history: &History,
    body: Value,
    signing_key: &SigningKey,
    rotate_to: Option<VerificationKey>,
    options: &MergeOptions<'_>,
) -> Result<History, ChainError> {
    let (head_proof, head) = find_head(history)?;
    let subject = well_formed_subject(head.headers.subject.as_deref()).ok_or_else(|| {
        ChainError::MalformedHistory(format!("head {head_proof} has no well-formed subject"))
    })?;

    let headers = Header::new(subject, Some(head_proof.clone())).with_rotation(rotate_to);
    let (proof, entry) = create_entry(signing_key, headers, body)?;

    let mut working = history.clone();
    if let Some(head) = working.get_mut(head_proof.as_str()) {
        head.headers.set_next(proof.clone())?;
    }
    working.insert(proof.clone(), entry);

    let extended = merge_with(history, &working, options)?;
    debug!(%proof, prev = %head_proof, len = extended.len(), "extended history");
    Ok(extended)
}

/// SHA3-256 over the root-to-head proof sequence.
///
/// Two histories with the same digest hold the same canonical chain.
pub fn chain_digest(history: &History) -> Result<String, ChainError> {
    let mut hasher = Sha3_256::new();
    for proof in canonical_order(history)? {
        hasher.update(proof.as_str().as_bytes());
        hasher.update([0]);
    }
    Ok(format!("sha3-256:{}", hex::encode(hasher.finalize())))
}
