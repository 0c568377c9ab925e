//! # Engine Configuration
//!
//! Loader policy shared by the CLI and the API service. Read from YAML;
//! every field has a default, so an empty document is a valid config.
//!
//! ```yaml
//! ignore_features: [AzSKCfg, SubscriptionCore]
//! passed_verdict: Passed
//! strict: false
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::RecoError;

/// Dataset loader policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Pseudo-features excluded from both set membership and counting.
    pub ignore_features: Vec<String>,
    /// The verdict string that counts as a pass. Any other verdict is a fail.
    pub passed_verdict: String,
    /// Abort the load on the first malformed row instead of skipping it.
    pub strict: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ignore_features: vec!["AzSKCfg".to_string(), "SubscriptionCore".to_string()],
            passed_verdict: "Passed".to_string(),
            strict: false,
        }
    }
}

impl EngineConfig {
    /// Parse a config from YAML.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, RecoError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(|e| RecoError::Config(e.to_string()))
    }

    /// Read a config file.
    pub fn load(path: &Path) -> Result<Self, RecoError> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_yaml_str(&text)?;
        tracing::debug!(path = %path.display(), ?config, "loaded engine config");
        Ok(config)
    }

    /// Whether rows for `feature` should be dropped.
    pub fn is_ignored(&self, feature: &str) -> bool {
        self.ignore_features.iter().any(|f| f == feature)
    }

    /// Whether `verdict` counts as a pass.
    pub fn is_pass(&self, verdict: &str) -> bool {
        verdict == self.passed_verdict
    }
}
