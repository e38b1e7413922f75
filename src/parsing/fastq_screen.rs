//! Parser for FastQ Screen contamination tables (`*_fastq_screen.txt`).
//!
//! A header line is followed by `Library\tUnmapped\tMapped_One_Library\tMapped_Multiple_Libraries`
//! rows holding percentages.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::parsing::ParseError;
use crate::utils::lines::tab_fields;

/// Mapping fractions for one screened library
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScreenHit {
    pub unmapped: f64,
    #[serde(rename = "Mapped_One_Library")]
    pub mapped_one_library: f64,
    #[serde(rename = "Mapped_Multiple_Libraries")]
    pub mapped_multiple_libraries: f64,
}

/// Screen results keyed by library name, in file order.
pub type ScreenMetrics = IndexMap<String, ScreenHit>;

/// Parse a FastQ Screen file
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, or
/// `ParseError::InvalidFormat` if a row is malformed.
pub fn parse_fastq_screen_file(path: &Path) -> Result<ScreenMetrics, ParseError> {
    let content = std::fs::read_to_string(path)?;
    parse_fastq_screen_text(&content)
}

/// Parse FastQ Screen results from text
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` if a data row has fewer than four
/// columns or a fraction is not a number.
pub fn parse_fastq_screen_text(text: &str) -> Result<ScreenMetrics, ParseError> {
    let mut metrics = ScreenMetrics::new();

    // First line is the column header
    for (i, line) in text.lines().enumerate().skip(1) {
        let line = line.trim_end_matches(['\t', '\r']);
        // Newer releases append '%Hit_no_libraries' style footers
        if line.is_empty() || line.starts_with('%') || line.starts_with('#') {
            continue;
        }

        let fields = tab_fields(line);
        if fields.len() < 4 {
            return Err(ParseError::InvalidFormat(format!(
                "Line {} has {} fields, expected 4",
                i + 1,
                fields.len()
            )));
        }

        let fraction = |idx: usize| -> Result<f64, ParseError> {
            fields[idx].trim().parse().map_err(|_| {
                ParseError::InvalidFormat(format!(
                    "Invalid value for library '{}': '{}'",
                    fields[0], fields[idx]
                ))
            })
        };

        metrics.insert(
            fields[0].to_string(),
            ScreenHit {
                unmapped: fraction(1)?,
                mapped_one_library: fraction(2)?,
                mapped_multiple_libraries: fraction(3)?,
            },
        );
    }

    Ok(metrics)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fastq_screen_text() {
        let text = "Library\tUnmapped\tMapped_One_Library\tMapped_Multiple_Libraries\n\
                    Human\t5.2\t90.1\t4.7\n\
                    PhiX\t99.9\t0.1\t0.0\n";
        let metrics = parse_fastq_screen_text(text).unwrap();
        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics.get_index(0).unwrap().0, "Human");
        assert!((metrics["Human"].mapped_one_library - 90.1).abs() < f64::EPSILON);
        assert!((metrics["PhiX"].unmapped - 99.9).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_fastq_screen_footer_ignored() {
        let text = "Library\tUnmapped\tMapped_One_Library\tMapped_Multiple_Libraries\n\
                    Mouse\t80\t15\t5\n\n%Hit_no_libraries: 12.5\n";
        let metrics = parse_fastq_screen_text(text).unwrap();
        assert_eq!(metrics.len(), 1);
    }

    #[test]
    fn test_parse_fastq_screen_short_row() {
        let text = "Library\tUnmapped\n Human\t5.2\n";
        assert!(matches!(
            parse_fastq_screen_text(text),
            Err(ParseError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_screen_hit_serialized_names() {
        let hit = ScreenHit {
            unmapped: 1.0,
            mapped_one_library: 2.0,
            mapped_multiple_libraries: 3.0,
        };
        let json = serde_json::to_string(&hit).unwrap();
        assert_eq!(
            json,
            r#"{"Unmapped":1.0,"Mapped_One_Library":2.0,"Mapped_Multiple_Libraries":3.0}"#
        );
    }
}
