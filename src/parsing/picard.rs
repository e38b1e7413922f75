//! Parser for Picard metrics files.
//!
//! Picard writes every metrics file with the same layout:
//!
//! ```text
//! ## net.sf.picard.metrics.StringHeader
//! # net.sf.picard.analysis.CollectAlignmentSummaryMetrics INPUT=... OUTPUT=...
//! ## net.sf.picard.metrics.StringHeader
//! # Started on: ...
//!
//! ## METRICS CLASS	net.sf.picard.analysis.AlignmentSummaryMetrics
//! CATEGORY	TOTAL_READS	PF_READS	...
//! FIRST_OF_PAIR	1000	990	...
//! PAIR	2000	1980	...
//!
//! ## HISTOGRAM	java.lang.Integer
//! insert_size	All_Reads.fr_count
//! 1	10
//! ```
//!
//! The preamble ends with the command invocation comment. A `## METRICS`
//! marker precedes the column header, then one or more data rows follow.
//! Duplication and insert-size files append a histogram section.
//!
//! Every header column is kept and every value is kept verbatim as a string.

use std::path::{Path, PathBuf};
use std::str::Lines;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::parsing::ParseError;
use crate::utils::lines::tab_fields;

/// Comment prefixes that mark the command invocation line
const COMMAND_PREFIXES: [&str; 4] = [
    "# net.sf.picard.analysis",
    "# net.sf.picard.sam",
    "# picard.analysis",
    "# picard.sam",
];

const METRICS_MARKER: &str = "## METRICS";
const HISTOGRAM_MARKER: &str = "## HISTOGRAM";

/// One metrics row: column name -> value, in header order.
pub type MetricsRow = IndexMap<String, String>;

/// Histogram columns: column name -> values in row order.
pub type Histogram = IndexMap<String, Vec<String>>;

/// Alignment summary metrics, one row per read category
/// (`FIRST_OF_PAIR`, `SECOND_OF_PAIR`, `PAIR`, `UNPAIRED`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignmentMetrics {
    pub command: String,

    /// Rows keyed by their first column
    #[serde(flatten)]
    pub categories: IndexMap<String, MetricsRow>,
}

/// A single-row metrics table with an optional histogram.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMetrics {
    pub command: String,
    pub metrics: MetricsRow,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hist: Option<Histogram>,
}

/// The Picard metrics of one sample, one slot per metrics kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PicardMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align_metrics: Option<AlignmentMetrics>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dup_metrics: Option<TableMetrics>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insert_metrics: Option<TableMetrics>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hs_metrics: Option<TableMetrics>,
}

impl PicardMetrics {
    /// True when no metrics kind has been filled
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.align_metrics.is_none()
            && self.dup_metrics.is_none()
            && self.insert_metrics.is_none()
            && self.hs_metrics.is_none()
    }

    fn has(&self, kind: MetricsKind) -> bool {
        match kind {
            MetricsKind::Alignment => self.align_metrics.is_some(),
            MetricsKind::Duplication => self.dup_metrics.is_some(),
            MetricsKind::InsertSize => self.insert_metrics.is_some(),
            MetricsKind::HybridSelection => self.hs_metrics.is_some(),
        }
    }
}

/// Kinds of Picard metrics file, identified by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricsKind {
    Alignment,
    Duplication,
    InsertSize,
    HybridSelection,
}

impl MetricsKind {
    /// File extension (without the dot) for this kind
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Alignment => "align_metrics",
            Self::Duplication => "dup_metrics",
            Self::InsertSize => "insert_metrics",
            Self::HybridSelection => "hs_metrics",
        }
    }

    /// Detect the metrics kind from a path's extension
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("align_metrics") => Some(Self::Alignment),
            Some("dup_metrics") => Some(Self::Duplication),
            Some("insert_metrics") => Some(Self::InsertSize),
            Some("hs_metrics") => Some(Self::HybridSelection),
            _ => None,
        }
    }
}

/// Parse a set of Picard metrics files into one [`PicardMetrics`].
///
/// Files are dispatched on their extension. Files of unknown kind are
/// skipped and the first file of each kind wins.
///
/// # Errors
///
/// Returns the first `ParseError` raised by any selected file.
pub fn extract_metrics(paths: &[PathBuf]) -> Result<PicardMetrics, ParseError> {
    let mut metrics = PicardMetrics::default();

    for path in paths {
        let Some(kind) = MetricsKind::from_path(path) else {
            debug!(path = %path.display(), "not a picard metrics file");
            continue;
        };
        if metrics.has(kind) {
            debug!(path = %path.display(), kind = kind.extension(), "duplicate picard metrics file ignored");
            continue;
        }

        let content = std::fs::read_to_string(path)?;
        match kind {
            MetricsKind::Alignment => {
                metrics.align_metrics = Some(parse_align_metrics_text(&content)?);
            }
            MetricsKind::Duplication => {
                metrics.dup_metrics = Some(parse_dup_metrics_text(&content)?);
            }
            MetricsKind::InsertSize => {
                metrics.insert_metrics = Some(parse_insert_metrics_text(&content)?);
            }
            MetricsKind::HybridSelection => {
                metrics.hs_metrics = Some(parse_hs_metrics_text(&content)?);
            }
        }
    }

    Ok(metrics)
}

/// Parse `CollectAlignmentSummaryMetrics` output
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` if the command line or metrics header
/// is missing, or a category row is shorter than the header.
pub fn parse_align_metrics_text(text: &str) -> Result<AlignmentMetrics, ParseError> {
    let mut reader = MetricsReader::new(text);
    let command = reader.read_command()?;
    let header = reader.read_header()?;

    let mut categories = IndexMap::new();
    while let Some(row) = reader.read_row(&header)? {
        let category = row.values().next().cloned().unwrap_or_default();
        categories.insert(category, row);
    }

    Ok(AlignmentMetrics {
        command,
        categories,
    })
}

/// Parse `MarkDuplicates` metrics (single row plus histogram)
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` if the command line or header is
/// missing, or the data row is shorter than the header.
pub fn parse_dup_metrics_text(text: &str) -> Result<TableMetrics, ParseError> {
    parse_table(text, true)
}

/// Parse `CollectInsertSizeMetrics` output (first row plus histogram)
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` if the command line or header is
/// missing, or the data row is shorter than the header.
pub fn parse_insert_metrics_text(text: &str) -> Result<TableMetrics, ParseError> {
    parse_table(text, true)
}

/// Parse `CalculateHsMetrics` output (single row, no histogram)
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` if the command line or header is
/// missing, or the data row is shorter than the header.
pub fn parse_hs_metrics_text(text: &str) -> Result<TableMetrics, ParseError> {
    parse_table(text, false)
}

fn parse_table(text: &str, with_histogram: bool) -> Result<TableMetrics, ParseError> {
    let mut reader = MetricsReader::new(text);
    let command = reader.read_command()?;
    let header = reader.read_header()?;
    // Truncated after the header: keep what was read
    let metrics = reader.read_row(&header)?.unwrap_or_default();
    let hist = if with_histogram {
        reader.read_histogram()
    } else {
        None
    };

    Ok(TableMetrics {
        command,
        metrics,
        hist,
    })
}

/// Sequential reader over the sections of a metrics file
struct MetricsReader<'a> {
    lines: Lines<'a>,
}

impl<'a> MetricsReader<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines(),
        }
    }

    fn read_command(&mut self) -> Result<String, ParseError> {
        self.lines
            .by_ref()
            .find(|line| COMMAND_PREFIXES.iter().any(|p| line.starts_with(p)))
            .map(|line| line.trim_end_matches('\r').to_string())
            .ok_or_else(|| ParseError::InvalidFormat("Command line not found".to_string()))
    }

    fn read_header(&mut self) -> Result<Vec<String>, ParseError> {
        self.lines
            .by_ref()
            .find(|line| line.starts_with(METRICS_MARKER))
            .ok_or_else(|| ParseError::InvalidFormat(format!("'{METRICS_MARKER}' marker not found")))?;
        let header = self
            .lines
            .next()
            .ok_or_else(|| ParseError::InvalidFormat("Metrics header line missing".to_string()))?;
        Ok(tab_fields(header).into_iter().map(str::to_string).collect())
    }

    /// Next data row projected onto the header. `None` at a blank line or
    /// end of input.
    fn read_row(&mut self, header: &[String]) -> Result<Option<MetricsRow>, ParseError> {
        let Some(line) = self.lines.next() else {
            return Ok(None);
        };
        let fields = tab_fields(line);
        if fields.len() <= 1 {
            return Ok(None);
        }
        if fields.len() < header.len() {
            return Err(ParseError::InvalidFormat(format!(
                "Metrics row has {} fields, header has {}",
                fields.len(),
                header.len()
            )));
        }

        Ok(Some(
            header
                .iter()
                .zip(fields)
                .map(|(name, value)| (name.clone(), value.to_string()))
                .collect(),
        ))
    }

    /// Histogram columns, or `None` if the file has no histogram section.
    /// Reading stops at the first short or blank row.
    fn read_histogram(&mut self) -> Option<Histogram> {
        self.lines
            .by_ref()
            .find(|line| line.starts_with(HISTOGRAM_MARKER))?;
        let labels: Vec<String> = tab_fields(self.lines.next()?)
            .into_iter()
            .map(str::to_string)
            .collect();

        let mut hist: Histogram = labels.iter().map(|l| (l.clone(), Vec::new())).collect();
        for line in self.lines.by_ref() {
            let fields = tab_fields(line);
            if line.trim().is_empty() || fields.len() < labels.len() {
                break;
            }
            for (label, value) in labels.iter().zip(fields) {
                if let Some(column) = hist.get_mut(label) {
                    column.push(value.to_string());
                }
            }
        }

        Some(hist)
    }
}
