//! Parsers for the files a sequencing run leaves behind.
//!
//! This module provides parsers for:
//!
//! - **Barcode counts** (`*.bc_metrics`): two-column barcode id / read count pairs
//! - **Filter metrics** (`*.filter_metrics`): total, aligned and failed read counts
//! - **FastQ Screen** (`*_fastq_screen.txt`): per-library contamination fractions
//! - **Picard metrics** (`*.align_metrics`, `*.dup_metrics`, `*.insert_metrics`,
//!   `*.hs_metrics`): header-driven tables with an optional histogram
//! - **FastQC** (`fastqc_data.txt`): named modules shaped into columns
//! - **RunInfo.xml**: run and flowcell identity plus read layout
//! - **RTA XML** (charts, summaries, cluster counts): per-lane and per-tile values
//! - **Demultiplex_Stats.htm**: the CASAVA demultiplexing report tables
//! - **Sample sheets and run configuration**: raw CSV rows and YAML documents
//!
//! Every parser is a plain function from text (or a path) to a typed result.
//! Parsers never log and swallow; the records in [`crate::core`] decide how a
//! failure is reported.
//!
//! ## Example
//!
//! ```rust
//! use seqrun_qc::parsing::filter_metrics::parse_filter_metrics_text;
//!
//! let text = "Reads: 1000000\nReads Aligned: 950000 (95.0%)\nReads Fail Align: 50000 (5.0%)\n";
//! let metrics = parse_filter_metrics_text(text).unwrap();
//! assert_eq!(metrics.reads_aligned, Some(950_000));
//! ```

use thiserror::Error;

pub mod bc_metrics;
pub mod demultiplex_stats;
pub mod fastq_screen;
pub mod fastqc;
pub mod filter_metrics;
pub mod illumina;
pub mod picard;
pub mod run_info;
pub mod run_info_yaml;
pub mod samplesheet;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl From<quick_xml::Error> for ParseError {
    fn from(err: quick_xml::Error) -> Self {
        Self::Xml(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for ParseError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Self::Xml(err.to_string())
    }
}
