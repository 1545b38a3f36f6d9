//! Locating and walking entries inside a history.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};

use crate::chain::ChainError;
use crate::config::ChainConfig;
use crate::types::{Entry, Header, History, ProofId};

/// Every entry with no predecessor.
pub(crate) fn root_candidates(history: &History) -> Vec<(&ProofId, &Entry)> {
    history
        .iter()
        .filter(|(_, entry)| entry.headers.prev.is_none())
        .collect()
}

fn exactly_one<'a>(
    mut candidates: Vec<(&'a ProofId, &'a Entry)>,
    what: &str,
) -> Result<(&'a ProofId, &'a Entry), ChainError> {
    match candidates.len() {
        1 => Ok(candidates.remove(0)),
        0 => Err(ChainError::MalformedHistory(format!("no {what} entry"))),
        n => Err(ChainError::MalformedHistory(format!("{n} {what} entries"))),
    }
}

/// Find the unique entry with no predecessor.
pub fn find_root(history: &History) -> Result<(&ProofId, &Entry), ChainError> {
    exactly_one(root_candidates(history), "root")
}

/// Find the unique entry with no successor.
pub fn find_head(history: &History) -> Result<(&ProofId, &Entry), ChainError> {
    let candidates = history
        .iter()
        .filter(|(_, entry)| entry.headers.next().is_none())
        .collect();
    exactly_one(candidates, "head")
}

/// Resolve the successor of `entry`, if it has one present in `history`.
pub fn find_next<'a>(history: &'a History, entry: &Entry) -> Option<(&'a ProofId, &'a Entry)> {
    let next = entry.headers.next()?;
    history.get_key_value(next.as_str())
}

/// Resolve the predecessor of `entry`, if it has one present in `history`.
pub fn find_prev<'a>(history: &'a History, entry: &Entry) -> Option<(&'a ProofId, &'a Entry)> {
    let prev = entry.headers.prev.as_ref()?;
    history.get_key_value(prev.as_str())
}

pub fn find_by_proof<'a>(history: &'a History, proof: &str) -> Option<&'a Entry> {
    history.get(proof)
}

/// Proof ids from root to head following `next` pointers.
///
/// Fails unless the walk is a single linear chain covering every entry.
pub fn canonical_order(history: &History) -> Result<Vec<ProofId>, ChainError> {
    let (root, _) = find_root(history)?;
    let mut order = Vec::with_capacity(history.len());
    let mut seen = HashSet::new();
    let mut cursor = Some(root);

    while let Some(proof) = cursor {
        if !seen.insert(proof) {
            return Err(ChainError::MalformedHistory(format!(
                "cycle detected at {proof}"
            )));
        }
        let Some((proof, entry)) = history.get_key_value(proof.as_str()) else {
            return Err(ChainError::MalformedHistory(format!(
                "missing referenced entry {proof}"
            )));
        };
        order.push(proof.clone());
        cursor = entry.headers.next();
    }

    if order.len() != history.len() {
        return Err(ChainError::MalformedHistory(format!(
            "{} entries are not reachable from the root",
            history.len() - order.len()
        )));
    }
    Ok(order)
}

/// Where a listing starts, which also fixes its direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Origin {
    /// Walk forward from the root.
    Root,
    /// Walk backward from the head.
    #[default]
    Head,
}

/// Options for [`list_history`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOptions {
    pub origin: Origin,
    pub limit: usize,
    /// Body fields to keep for object bodies; `None` keeps the whole body.
    pub fields: Option<Vec<String>>,
    pub include_headers: bool,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            origin: Origin::Head,
            limit: 1,
            fields: None,
            include_headers: false,
        }
    }
}

impl ListOptions {
    pub fn from_config(config: &ChainConfig) -> Self {
        Self {
            limit: config.list.limit,
            include_headers: config.list.include_headers,
            ..Self::default()
        }
    }

    pub fn from_root(mut self) -> Self {
        self.origin = Origin::Root;
        self
    }

    pub fn from_head(mut self) -> Self {
        self.origin = Origin::Head;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn include_headers(mut self, include: bool) -> Self {
        self.include_headers = include;
        self
    }
}

/// A projected entry produced by [`list_history`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListedEntry {
    pub proof: ProofId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<Header>,
    pub body: Value,
}

fn project(proof: &ProofId, entry: &Entry, options: &ListOptions) -> ListedEntry {
    let body = match (&options.fields, &entry.body) {
        (Some(fields), Value::Object(object)) => {
            let picked: Map<String, Value> = fields
                .iter()
                .filter_map(|field| object.get(field).map(|v| (field.clone(), v.clone())))
                .collect();
            Value::Object(picked)
        }
        (_, body) => body.clone(),
    };
    ListedEntry {
        proof: proof.clone(),
        headers: options.include_headers.then(|| entry.headers.clone()),
        body,
    }
}

/// List up to `options.limit` projected entries.
///
/// From the head the walk follows `prev`. From the root it prefers the
/// smallest proof whose `prev` names the current entry and falls back to
/// `next`, so an unmerged union still lists deterministically.
pub fn list_history(
    history: &History,
    options: &ListOptions,
) -> Result<Vec<ListedEntry>, ChainError> {
    if options.limit == 0 {
        return Ok(Vec::new());
    }

    let (mut proof, mut entry) = match options.origin {
        Origin::Root => find_root(history)?,
        Origin::Head => find_head(history)?,
    };

    // Iteration is in proof order, so the first successor pushed is the smallest.
    let mut successors: BTreeMap<&ProofId, Vec<&ProofId>> = BTreeMap::new();
    if options.origin == Origin::Root {
        for (candidate, e) in history {
            if let Some(prev) = &e.headers.prev {
                successors.entry(prev).or_default().push(candidate);
            }
        }
    }

    let mut out = Vec::new();
    let mut visited = HashSet::new();

    while out.len() < options.limit {
        if !visited.insert(proof) {
            return Err(ChainError::MalformedHistory(format!(
                "cycle detected at {proof}"
            )));
        }
        out.push(project(proof, entry, options));

        let step = match options.origin {
            Origin::Head => entry.headers.prev.as_ref(),
            Origin::Root => successors
                .get(proof)
                .and_then(|s| s.first().copied())
                .or(entry.headers.next()),
        };
        let Some(step) = step else {
            break;
        };

        let Some(found) = history.get_key_value(step.as_str()) else {
            return Err(ChainError::MalformedHistory(format!(
                "missing referenced entry {step}"
            )));
        };
        (proof, entry) = found;
    }

    Ok(out)
}
