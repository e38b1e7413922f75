//! Parser for barcode count files (`*.bc_metrics`).
//!
//! Format: one `barcode_id\tcount` pair per line.

use std::collections::BTreeMap;
use std::path::Path;

use crate::parsing::ParseError;
use crate::utils::lines::tab_fields;

/// Read counts keyed by barcode id.
pub type BarcodeCounts = BTreeMap<String, u64>;

/// Parse a barcode count file
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, or
/// `ParseError::InvalidFormat` if a line is not a barcode/count pair.
pub fn parse_bc_metrics_file(path: &Path) -> Result<BarcodeCounts, ParseError> {
    let content = std::fs::read_to_string(path)?;
    parse_bc_metrics_text(&content)
}

/// Parse barcode counts from text
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` if a non-empty line has fewer than two
/// fields or a count is not an unsigned integer.
pub fn parse_bc_metrics_text(text: &str) -> Result<BarcodeCounts, ParseError> {
    let mut counts = BarcodeCounts::new();

    for (i, line) in text.lines().enumerate() {
        let line = line.trim_end_matches(['\t', '\r']);
        if line.is_empty() {
            continue;
        }

        let fields = tab_fields(line);
        if fields.len() < 2 {
            return Err(ParseError::InvalidFormat(format!(
                "Line {} has fewer than 2 fields",
                i + 1
            )));
        }

        let count: u64 = fields[1].trim().parse().map_err(|_| {
            ParseError::InvalidFormat(format!(
                "Invalid read count for barcode '{}': '{}'",
                fields[0], fields[1]
            ))
        })?;
        counts.insert(fields[0].to_string(), count);
    }

    Ok(counts)
}
