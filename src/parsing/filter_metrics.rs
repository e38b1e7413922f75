//! Parser for alignment filter summaries (`*.filter_metrics`).
//!
//! The file is three fixed lines:
//!
//! ```text
//! Reads: 1000000
//! Reads Aligned: 950000 (95.0%)
//! Reads Fail Align: 50000 (5.0%)
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::parsing::ParseError;
use crate::utils::lines::token_from_end;

/// Read counts from a filter summary. `None` means not (yet) measured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterMetrics {
    pub reads: Option<u64>,
    pub reads_aligned: Option<u64>,
    pub reads_fail_align: Option<u64>,
}

/// Parse a filter summary file
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, or
/// `ParseError::InvalidFormat` if the three count lines are not present.
pub fn parse_filter_metrics_file(path: &Path) -> Result<FilterMetrics, ParseError> {
    let content = std::fs::read_to_string(path)?;
    parse_filter_metrics_text(&content)
}

/// Parse a filter summary from text
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` if fewer than three lines are present
/// or a count token is not an unsigned integer.
pub fn parse_filter_metrics_text(text: &str) -> Result<FilterMetrics, ParseError> {
    let mut lines = text.lines();

    // Total reads is the last token, the other two carry a trailing percentage
    let reads = count_at(lines.next(), 0, "Reads")?;
    let reads_aligned = count_at(lines.next(), 1, "Reads Aligned")?;
    let reads_fail_align = count_at(lines.next(), 1, "Reads Fail Align")?;

    Ok(FilterMetrics {
        reads: Some(reads),
        reads_aligned: Some(reads_aligned),
        reads_fail_align: Some(reads_fail_align),
    })
}

fn count_at(line: Option<&str>, from_end: usize, label: &str) -> Result<u64, ParseError> {
    let line = line
        .ok_or_else(|| ParseError::InvalidFormat(format!("Missing '{label}' line")))?;
    let token = token_from_end(line.trim_end(), from_end)
        .ok_or_else(|| ParseError::InvalidFormat(format!("No count on '{label}' line")))?;
    token.parse().map_err(|_| {
        ParseError::InvalidFormat(format!("Invalid count on '{label}' line: '{token}'"))
    })
}
