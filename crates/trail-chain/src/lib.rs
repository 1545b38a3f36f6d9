//! Verifiable append-only histories of signed entries.
//!
//! A [`History`] maps proof ids to entries. Each proof id is the Ed25519
//! signature over its entry (with the mutable `next` pointer left out), so it
//! both names and authenticates the entry. Histories grow through [`extend`]
//! and are reconciled with other snapshots through [`merge`]; both return a
//! new, fully verified chain and never touch their inputs.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use trail_chain::{create_history, extend, find_head, generate_key_pair, merge};
//!
//! let (signing_key, verification_key) = generate_key_pair();
//! let history = create_history("alice", json!({}), &signing_key, verification_key).unwrap();
//!
//! let ours = extend(&history, json!({ "v": 1 }), &signing_key, None).unwrap();
//! let theirs = extend(&history, json!({ "v": 2 }), &signing_key, None).unwrap();
//!
//! // Our successor claim wins; theirs is discarded.
//! let merged = merge(&ours, &theirs).unwrap();
//! let (_, head) = find_head(&merged).unwrap();
//! assert_eq!(head.body, json!({ "v": 1 }));
//! assert_eq!(merged.len(), 2);
//! ```

mod chain;
mod config;
mod cursor;
mod events;
mod merge;
mod navigate;
mod schema;
mod signature;
mod types;

pub use chain::{chain_digest, create_history, extend, extend_with, ChainError};
pub use config::{ChainConfig, ListConfig, MergeConfig};
pub use cursor::Cursor;
pub use events::{CorruptionNotifier, CorruptionReport, ListenerId};
pub use merge::{merge, merge_all, merge_with, MergeFailure, MergeOptions};
pub use navigate::{
    canonical_order, find_by_proof, find_head, find_next, find_prev, find_root, list_history,
    ListOptions, ListedEntry, Origin,
};
pub use schema::body_schema;
pub use signature::{create_entry, generate_key_pair, signable_payload, verify_entry};
pub use types::{Entry, Header, History, ProofId, VerificationKey};
