//! Runtime configuration

use serde::{Deserialize, Serialize};

use crate::error::MetaError;

/// Settings of one composition session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RuntimeConfig {
    /// Warn when a mixed-in module shadows or is shadowed by an existing member
    pub traits_mode: bool,
    /// Turn rejected writes into `WriteRejected` errors
    pub strict_writes: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            traits_mode: true,
            strict_writes: false,
        }
    }
}

impl RuntimeConfig {
    /// Parse a JSON document such as `{"traitsMode": false}`; absent fields keep
    /// their defaults.
    pub fn from_json(source: &str) -> Result<Self, MetaError> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn to_json(&self) -> Result<String, MetaError> {
        Ok(serde_json::to_string(self)?)
    }
}
