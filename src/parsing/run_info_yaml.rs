//! Raw transcription of pipeline run configuration (`run_info.yaml`).

use std::path::Path;

use serde_json::Value;

use crate::parsing::ParseError;

/// Load a YAML document as an opaque value
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, or
/// `ParseError::Yaml` if it is not valid YAML.
pub fn parse_run_info_yaml_file(path: &Path) -> Result<Value, ParseError> {
    let content = std::fs::read_to_string(path)?;
    parse_run_info_yaml_text(&content)
}

/// Load YAML text as an opaque value
///
/// # Errors
///
/// Returns `ParseError::Yaml` if the text is not valid YAML.
pub fn parse_run_info_yaml_text(text: &str) -> Result<Value, ParseError> {
    Ok(serde_yaml::from_str(text)?)
}
