//! Error types for snapshot transcoding.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Unsupported snapshot format: {0}")]
    UnsupportedSnapshotFormat(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Binary encoding error: {0}")]
    Binary(String),

    #[error("Base64 error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
