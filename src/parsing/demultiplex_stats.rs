//! Parser for the CASAVA `Demultiplex_Stats.htm` report.
//!
//! The report is loosely formed HTML holding four tables. The first and third
//! carry only the column headers, the second and fourth the per-lane barcode
//! statistics and the sample information rows. Header cells are compared
//! against the layout CASAVA 1.8 writes; a mismatch is logged as a warning and
//! the headers actually present are used.

use std::path::Path;

use indexmap::IndexMap;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::parsing::ParseError;

/// Barcode lane statistics header written by CASAVA 1.8
pub const BARCODE_HEADER_KNOWN: [&str; 15] = [
    "Lane",
    "Sample ID",
    "Sample Ref",
    "Index",
    "Description",
    "Control",
    "Project",
    "Yield (Mbases)",
    "% PF",
    "# Reads",
    "% of raw clusters per lane",
    "% Perfect Index Reads",
    "% One Mismatch Reads (Index)",
    "% of >= Q30 Bases (PF)",
    "Mean Quality Score (PF)",
];

/// Sample information header written by CASAVA 1.8
pub const SAMPLE_HEADER_KNOWN: [&str; 4] = ["Sample ID", "Recipe", "Operator", "Directory"];

/// Index of the data tables among all `table` elements
const BARCODE_TABLE: usize = 1;
const SAMPLE_TABLE: usize = 3;

/// One table row: header -> cell text
pub type StatsRow = IndexMap<String, String>;

/// The two data tables of a demultiplexing report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemultiplexStats {
    #[serde(rename = "Barcode_lane_statistics")]
    pub barcode_lane_statistics: Vec<StatsRow>,

    #[serde(rename = "Sample_information")]
    pub sample_information: Vec<StatsRow>,
}

/// Parse a `Demultiplex_Stats.htm` file
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, or
/// `ParseError::InvalidFormat` if the header rows or data tables are missing.
pub fn parse_demultiplex_stats_file(path: &Path) -> Result<DemultiplexStats, ParseError> {
    let content = std::fs::read_to_string(path)?;
    parse_demultiplex_stats_text(&content)
}

/// Parse a demultiplexing report from HTML text
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` if fewer than two header rows or four
/// tables are present.
pub fn parse_demultiplex_stats_text(html: &str) -> Result<DemultiplexStats, ParseError> {
    let document = Html::parse_document(html);
    let tr = selector("tr")?;
    let th = selector("th")?;
    let td = selector("td")?;
    let table = selector("table")?;

    let mut header_rows = document
        .select(&tr)
        .map(|row| row.select(&th).map(cell_text).collect::<Vec<_>>())
        .filter(|cells| !cells.is_empty());
    let bc_header = header_rows
        .next()
        .ok_or_else(|| ParseError::InvalidFormat("Barcode lane header row not found".to_string()))?;
    let mut smp_header = header_rows
        .next()
        .ok_or_else(|| ParseError::InvalidFormat("Sample header row not found".to_string()))?;

    // The report writes the first sample header as <th>Sample<p></p>ID</th>
    smp_header[0] = "Sample ID".to_string();

    if !headers_match(&BARCODE_HEADER_KNOWN, &bc_header) {
        warn!(
            expected = ?BARCODE_HEADER_KNOWN,
            observed = ?bc_header,
            "Barcode lane statistics header information has changed. New format?"
        );
    }
    if !headers_match(&SAMPLE_HEADER_KNOWN, &smp_header) {
        warn!(
            expected = ?SAMPLE_HEADER_KNOWN,
            observed = ?smp_header,
            "Sample header information has changed. New format?"
        );
    }

    let tables: Vec<ElementRef<'_>> = document.select(&table).collect();
    if tables.len() <= SAMPLE_TABLE {
        return Err(ParseError::InvalidFormat(format!(
            "Expected at least {} tables, found {}",
            SAMPLE_TABLE + 1,
            tables.len()
        )));
    }

    Ok(DemultiplexStats {
        barcode_lane_statistics: read_rows(tables[BARCODE_TABLE], &bc_header, &tr, &td),
        sample_information: read_rows(tables[SAMPLE_TABLE], &smp_header, &tr, &td),
    })
}

/// Zip each data row of `table` against `header`; rows without cells are skipped
fn read_rows(table: ElementRef<'_>, header: &[String], tr: &Selector, td: &Selector) -> Vec<StatsRow> {
    table
        .select(tr)
        .map(|row| row.select(td).map(cell_text).collect::<Vec<_>>())
        .filter(|cells| !cells.is_empty())
        .map(|cells| {
            if cells.len() != header.len() {
                debug!(
                    cells = cells.len(),
                    columns = header.len(),
                    "data row width differs from header"
                );
            }
            header.iter().cloned().zip(cells).collect()
        })
        .collect()
}

/// True if the observed header cells equal the known layout
#[must_use]
pub fn headers_match(known: &[&str], observed: &[String]) -> bool {
    known.len() == observed.len() && known.iter().zip(observed).all(|(k, o)| k == o)
}

fn selector(css: &str) -> Result<Selector, ParseError> {
    Selector::parse(css)
        .map_err(|e| ParseError::InvalidFormat(format!("Invalid selector '{css}': {e}")))
}

/// Cell text with runs of whitespace collapsed
fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
