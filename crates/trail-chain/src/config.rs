//! Chain configuration loaded from TOML.
//!
//! ```toml
//! [merge]
//! enforce_body_schema = true
//!
//! [list]
//! limit = 20
//! include_headers = false
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChainConfig {
    pub merge: MergeConfig,
    pub list: ListConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MergeConfig {
    /// Reject entries whose body shape differs from the root body's shape.
    pub enforce_body_schema: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ListConfig {
    pub limit: usize,
    pub include_headers: bool,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            limit: 1,
            include_headers: false,
        }
    }
}

impl ChainConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }

    /// Load a configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config = Self::from_toml_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config)
    }
}
