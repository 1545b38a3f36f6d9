//! Reading and writing snapshot files.

use std::fs;
use std::path::Path;
use trail_chain::History;

use crate::codec::{close_history, open_history};
use crate::error::SnapshotError;
use crate::format::{Snapshot, SnapshotFormat};

/// Write `history` to `path` in `format`.
///
/// JSON is pretty-printed, binary is raw CBOR, base64url is the text itself.
pub fn save_snapshot<P: AsRef<Path>>(
    path: P,
    format: SnapshotFormat,
    history: &History,
) -> Result<(), SnapshotError> {
    match close_history(format, history)? {
        Snapshot::Json(value) => fs::write(path, serde_json::to_string_pretty(&value)?)?,
        Snapshot::Binary(bytes) => fs::write(path, bytes)?,
        Snapshot::Base64Url(text) => fs::write(path, text)?,
    }
    Ok(())
}

/// Read a snapshot file written in `format`.
pub fn load_snapshot<P: AsRef<Path>>(
    path: P,
    format: SnapshotFormat,
) -> Result<History, SnapshotError> {
    let snapshot = match format {
        SnapshotFormat::Json => Snapshot::Json(serde_json::from_str(&fs::read_to_string(path)?)?),
        SnapshotFormat::Binary => Snapshot::Binary(fs::read(path)?),
        SnapshotFormat::Base64Url => {
            Snapshot::Base64Url(fs::read_to_string(path)?.trim().to_string())
        }
    };
    open_history(&snapshot)
}
