//! Reconciliation of two histories into one verified chain.
//!
//! [`merge`] unions the entries of `trusted` and `alleged`, then walks the
//! result from its root, verifying every entry against the key active at its
//! position. Only entries reached by that walk survive. Inputs are never
//! modified, whether the merge succeeds or fails.

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ChainConfig;
use crate::events::{CorruptionNotifier, CorruptionReport};
use crate::navigate::root_candidates;
use crate::schema::body_schema;
use crate::signature::verify_entry;
use crate::types::{History, ProofId};

/// Reasons a merge rejects its input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeFailure {
    #[error("root entry is missing or declares no verification key")]
    MissingRootKey,

    #[error("history is malformed: {0}")]
    Malformed(String),

    #[error("entry {proof} failed signature verification")]
    SignatureInvalid { proof: ProofId },

    #[error("entry {proof} has subject {found:?}, expected {expected:?}")]
    SubjectDiscontinuity {
        proof: ProofId,
        expected: Option<String>,
        found: Option<String>,
    },

    #[error("entry {proof} links to {found:?}, expected {expected:?}")]
    LinkageDiscontinuity {
        proof: ProofId,
        expected: Option<ProofId>,
        found: Option<ProofId>,
    },

    #[error("entry {proof} is referenced but not present")]
    DanglingPointer { proof: ProofId },

    #[error("entry {proof} body shape {found} differs from {expected}")]
    SchemaDivergence {
        proof: ProofId,
        expected: String,
        found: String,
    },
}

/// Knobs for [`merge_with`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeOptions<'a> {
    /// Require every body to share the root body's shape.
    pub enforce_body_schema: bool,
    /// Told about every rejected merge.
    pub notifier: Option<&'a CorruptionNotifier>,
}

impl<'a> MergeOptions<'a> {
    pub fn from_config(config: &ChainConfig) -> Self {
        Self {
            enforce_body_schema: config.merge.enforce_body_schema,
            notifier: None,
        }
    }

    pub fn with_notifier(mut self, notifier: &'a CorruptionNotifier) -> Self {
        self.notifier = Some(notifier);
        self
    }
}

/// Merge `alleged` into `trusted` with default options.
pub fn merge(trusted: &History, alleged: &History) -> Result<History, MergeFailure> {
    merge_with(trusted, alleged, &MergeOptions::default())
}

pub fn merge_with(
    trusted: &History,
    alleged: &History,
    options: &MergeOptions<'_>,
) -> Result<History, MergeFailure> {
    let candidate = union(trusted, alleged);

    match walk(&candidate, options.enforce_body_schema) {
        Ok((accepted, head)) => {
            debug!(
                %head,
                accepted = accepted.len(),
                dropped = candidate.len() - accepted.len(),
                "merged history"
            );
            Ok(accepted)
        }
        Err(failure) => {
            warn!(%failure, candidate = candidate.len(), "merge rejected");
            if let Some(notifier) = options.notifier {
                notifier.notify(&CorruptionReport {
                    failure: failure.clone(),
                    candidate_len: candidate.len(),
                });
            }
            Err(failure)
        }
    }
}

/// Fold several histories together, left to right.
///
/// The first history is itself validated. An empty slice has no root.
pub fn merge_all(snapshots: &[History], options: &MergeOptions<'_>) -> Result<History, MergeFailure> {
    let Some((first, rest)) = snapshots.split_first() else {
        return Err(MergeFailure::MissingRootKey);
    };
    let mut merged = merge_with(&History::new(), first, options)?;
    for snapshot in rest {
        merged = merge_with(&merged, snapshot, options)?;
    }
    Ok(merged)
}

/// Copy `trusted`, add entries only `alleged` has, and fill unset successors.
///
/// A successor already recorded on the trusted side is never replaced.
fn union(trusted: &History, alleged: &History) -> History {
    let mut candidate = trusted.clone();
    for (proof, incoming) in alleged {
        match candidate.get_mut(proof.as_str()) {
            Some(known) => {
                if known.headers.next.is_none() {
                    known.headers.next = incoming.headers.next.clone();
                }
            }
            None => candidate.insert(proof.clone(), incoming.clone()),
        }
    }
    candidate
}

/// Returns the accepted entries and the proof of the last one.
fn walk(
    candidate: &History,
    enforce_body_schema: bool,
) -> Result<(History, ProofId), MergeFailure> {
    let mut roots = root_candidates(candidate);
    let (root_proof, root) = match roots.len() {
        0 => return Err(MergeFailure::MissingRootKey),
        1 => roots.remove(0),
        n => return Err(MergeFailure::Malformed(format!("{n} root entries"))),
    };
    let Some(mut active_key) = root.headers.verification_key.clone() else {
        return Err(MergeFailure::MissingRootKey);
    };
    let subject = &root.headers.subject;
    let schema = enforce_body_schema.then(|| body_schema(&root.body));

    let mut accepted = History::new();
    let mut expected_prev: Option<ProofId> = None;
    let mut cursor = Some(root_proof.clone());

    while let Some(proof) = cursor {
        let Some(entry) = candidate.get(proof.as_str()) else {
            return Err(MergeFailure::DanglingPointer { proof });
        };

        if !verify_entry(&active_key, &proof, entry) {
            return Err(MergeFailure::SignatureInvalid { proof });
        }

        if entry.headers.subject != *subject {
            return Err(MergeFailure::SubjectDiscontinuity {
                proof,
                expected: subject.clone(),
                found: entry.headers.subject.clone(),
            });
        }

        // A cycle has to come back through the root, whose prev is null.
        if entry.headers.prev != expected_prev {
            return Err(MergeFailure::LinkageDiscontinuity {
                proof,
                expected: expected_prev,
                found: entry.headers.prev.clone(),
            });
        }

        if let Some(expected) = &schema {
            let found = body_schema(&entry.body);
            if found != *expected {
                return Err(MergeFailure::SchemaDivergence {
                    proof,
                    expected: expected.clone(),
                    found,
                });
            }
        }

        accepted.insert(proof.clone(), entry.clone());
        if let Some(key) = &entry.headers.verification_key {
            active_key = key.clone();
        }
        cursor = entry.headers.next.clone();
        expected_prev = Some(proof);
    }

    let head = expected_prev.unwrap_or_else(|| root_proof.clone());
    Ok((accepted, head))
}
