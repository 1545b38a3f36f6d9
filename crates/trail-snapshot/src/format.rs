//! Snapshot formats and encoded snapshot values.

use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::SnapshotError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapshotFormat {
    /// The history as a JSON object.
    Json,
    /// CBOR bytes of the same structure.
    Binary,
    /// base64url (no padding) of the JSON bytes.
    Base64Url,
}

impl SnapshotFormat {
    pub const ALL: [SnapshotFormat; 3] = [Self::Json, Self::Binary, Self::Base64Url];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Binary => "binary",
            Self::Base64Url => "base64url",
        }
    }
}

impl fmt::Display for SnapshotFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SnapshotFormat {
    type Err = SnapshotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(Self::Json),
            "binary" => Ok(Self::Binary),
            "base64url" => Ok(Self::Base64Url),
            other => Err(SnapshotError::UnsupportedSnapshotFormat(other.to_string())),
        }
    }
}

/// An encoded history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Snapshot {
    Json(Value),
    Binary(Vec<u8>),
    Base64Url(String),
}

impl Snapshot {
    pub fn format(&self) -> SnapshotFormat {
        match self {
            Self::Json(_) => SnapshotFormat::Json,
            Self::Binary(_) => SnapshotFormat::Binary,
            Self::Base64Url(_) => SnapshotFormat::Base64Url,
        }
    }
}
