//! Extractor for FastQC reports (`fastqc_data.txt`).
//!
//! A report is a sequence of modules:
//!
//! ```text
//! >>Basic Statistics	pass
//! #Measure	Value
//! Filename	1_120829_AC0UUUACXX_2_1.fastq
//! Total Sequences	1000000
//! >>END_MODULE
//! ```
//!
//! Each module listed in [`FASTQC_SECTIONS`] is shaped into columns: the first
//! row (with its leading `#` removed) names the columns, and every column maps
//! to its values across the remaining rows.

use std::collections::BTreeMap;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::parsing::ParseError;
use crate::utils::lines::tab_fields;

/// Report file inside an unpacked FastQC directory
pub const FASTQC_DATA_FILE: &str = "fastqc_data.txt";

/// Modules extracted from every report
pub const FASTQC_SECTIONS: [&str; 11] = [
    "Per base sequence quality",
    "Basic Statistics",
    "Per sequence quality scores",
    "Per base sequence content",
    "Per base GC content",
    "Per sequence GC content",
    "Per base N content",
    "Sequence Length Distribution",
    "Sequence Duplication Levels",
    "Overrepresented sequences",
    "Kmer Content",
];

const SECTION_START: &str = ">>";
const SECTION_END: &str = ">>END";

/// One module as columns: column name -> values in row order
pub type SectionColumns = IndexMap<String, Vec<String>>;

/// All extracted modules, keyed by module name
pub type FastqcSummary = BTreeMap<String, SectionColumns>;

/// FastQC container of a sample record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FastqcMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<FastqcSummary>,
}

/// Read the modules of the report in `report_dir`
///
/// # Errors
///
/// Returns `ParseError::Io` if `fastqc_data.txt` cannot be read, or
/// `ParseError::InvalidFormat` if a module has rows wider than its header.
pub fn parse_fastqc_dir(report_dir: &Path) -> Result<FastqcSummary, ParseError> {
    let content = std::fs::read_to_string(report_dir.join(FASTQC_DATA_FILE))?;
    parse_fastqc_text(&content)
}

/// Shape every module of [`FASTQC_SECTIONS`] found in `text`; absent modules
/// map to an empty set of columns.
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` if a module has rows wider than its
/// header.
pub fn parse_fastqc_text(text: &str) -> Result<FastqcSummary, ParseError> {
    FASTQC_SECTIONS
        .iter()
        .map(|name| -> Result<(String, SectionColumns), ParseError> {
            let section = extract_section(text, name);
            Ok(((*name).to_string(), section_to_columns(&section)?))
        })
        .collect()
}

/// Lines of module `name`, excluding its `>>` start and end markers
#[must_use]
pub fn extract_section<'a>(text: &'a str, name: &str) -> Vec<&'a str> {
    let start = format!("{SECTION_START}{name}");
    text.lines()
        .skip_while(|line| !line.starts_with(&start))
        .skip(1)
        .take_while(|line| !line.starts_with(SECTION_END))
        .collect()
}

/// Shape section lines into columns
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` if a row has more fields than the
/// header. Shorter rows leave the trailing columns without a value.
pub fn section_to_columns(section: &[&str]) -> Result<SectionColumns, ParseError> {
    let Some((header, rows)) = section.split_first() else {
        return Ok(SectionColumns::new());
    };

    let names: Vec<String> = tab_fields(header.trim_end_matches('\t'))
        .into_iter()
        .map(|name| name.trim_matches('#').to_string())
        .collect();
    let mut columns: SectionColumns = names.iter().map(|n| (n.clone(), Vec::new())).collect();

    for row in rows {
        let fields = tab_fields(row);
        if fields.len() > names.len() {
            return Err(ParseError::InvalidFormat(format!(
                "Row '{row}' has {} fields, header has {}",
                fields.len(),
                names.len()
            )));
        }
        for (name, value) in names.iter().zip(fields) {
            if let Some(column) = columns.get_mut(name) {
                column.push(value.to_string());
            }
        }
    }

    Ok(columns)
}
