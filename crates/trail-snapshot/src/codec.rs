//! Transcoding between histories and snapshots.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;
use tracing::debug;
use trail_chain::History;

use crate::error::SnapshotError;
use crate::format::{Snapshot, SnapshotFormat};

/// Decode a snapshot into an unvalidated history.
///
/// Header shape is checked (unknown fields are rejected, absent pointers are
/// null) but signatures and linkage are not.
pub fn open_history(snapshot: &Snapshot) -> Result<History, SnapshotError> {
    let history: History = match snapshot {
        Snapshot::Json(value) => History::deserialize(value)?,
        Snapshot::Binary(bytes) => ciborium::de::from_reader(bytes.as_slice())
            .map_err(|e| SnapshotError::Binary(e.to_string()))?,
        Snapshot::Base64Url(text) => {
            let bytes = URL_SAFE_NO_PAD.decode(text.as_bytes())?;
            serde_json::from_slice(&bytes)?
        }
    };
    debug!(format = %snapshot.format(), entries = history.len(), "opened snapshot");
    Ok(history)
}

/// Encode a history in the requested format.
pub fn close_history(format: SnapshotFormat, history: &History) -> Result<Snapshot, SnapshotError> {
    let snapshot = match format {
        SnapshotFormat::Json => Snapshot::Json(serde_json::to_value(history)?),
        SnapshotFormat::Binary => {
            let mut bytes = Vec::new();
            ciborium::ser::into_writer(history, &mut bytes)
                .map_err(|e| SnapshotError::Binary(e.to_string()))?;
            Snapshot::Binary(bytes)
        }
        SnapshotFormat::Base64Url => {
            Snapshot::Base64Url(URL_SAFE_NO_PAD.encode(serde_json::to_vec(history)?))
        }
    };
    debug!(%format, entries = history.len(), "closed snapshot");
    Ok(snapshot)
}
