//! Store configuration.

use serde::{Deserialize, Serialize};

use crate::error::{TreeError, TreeResult};

/// When the invariant checker runs after a mutation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerifyMode {
    Never,
    /// Only in builds with `debug_assertions`.
    #[default]
    Debug,
    Always,
}

impl VerifyMode {
    pub fn enabled(&self) -> bool {
        match self {
            VerifyMode::Never => false,
            VerifyMode::Debug => cfg!(debug_assertions),
            VerifyMode::Always => true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    pub verify: VerifyMode,
}

impl TreeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_verify(mut self, verify: VerifyMode) -> Self {
        self.verify = verify;
        self
    }

    /// Parse a config from JSON, e.g. `{"verify": "always"}`.
    pub fn from_json(json: &str) -> TreeResult<Self> {
        serde_json::from_str(json).map_err(|e| TreeError::InvalidConfig(e.to_string()))
    }
}
