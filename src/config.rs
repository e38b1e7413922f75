//! Record configuration.
//!
//! Every setting has a default; a JSON document only needs the keys it
//! overrides:
//!
//! ```
//! use seqrun_qc::config::QcConfig;
//!
//! let config = QcConfig::from_json(r#"{"run_info_yaml_file": "bcbio.yaml"}"#).unwrap();
//! assert_eq!(config.run_info_yaml_file, "bcbio.yaml");
//! assert_eq!(config.run_info_file, "RunInfo.xml");
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Settings shared by sample and flowcell records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QcConfig {
    /// Directories whose path below the run directory contains any of these
    /// substrings are not searched
    pub ignore_patterns: Vec<String>,

    /// Run descriptor file name, relative to the run directory
    pub run_info_file: String,

    /// Run metadata YAML file name, relative to the run directory
    pub run_info_yaml_file: String,
}

impl Default for QcConfig {
    fn default() -> Self {
        Self {
            ignore_patterns: ["tmp", "tx", "-split", "log"].map(String::from).to_vec(),
            run_info_file: "RunInfo.xml".to_string(),
            run_info_yaml_file: "run_info.yaml".to_string(),
        }
    }
}

impl QcConfig {
    /// Parse a configuration from JSON; absent keys keep their defaults
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` if the JSON is invalid.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration from a JSON file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Read` if the file cannot be read, or
    /// `ConfigError::Parse` if its content is invalid.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}
