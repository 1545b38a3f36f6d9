//! Snapshot codecs for trail histories.
//!
//! A [`History`](trail_chain::History) travels between holders as one of three
//! snapshot formats: native JSON, CBOR bytes, or base64url text over the JSON
//! bytes. This crate only transcodes; decoded histories are unvalidated until
//! they go through [`trail_chain::merge`].

mod codec;
mod error;
mod format;
mod persist;

pub use codec::{close_history, open_history};
pub use error::SnapshotError;
pub use format::{Snapshot, SnapshotFormat};
pub use persist::{load_snapshot, save_snapshot};
