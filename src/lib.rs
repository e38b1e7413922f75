//! # seqrun-qc
//!
//! A library for collecting quality-control metrics from the output
//! directories of Illumina sequencing runs.
//!
//! A processed run directory holds dozens of small reports written by
//! different tools: Picard metrics, FastQC and FastQ Screen summaries, read
//! filter and barcode counts, the RTA XML reports and the CASAVA
//! demultiplexing statistics. `seqrun-qc` finds these files, parses each into
//! a typed value and gathers them into one record per sample and one per
//! flowcell, ready to be serialized as JSON.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use seqrun_qc::{FlowcellRunMetrics, Logger, RunRecord, SampleIdentity, SampleRunMetrics};
//!
//! seqrun_qc::init_logging(false);
//! let run = Path::new("/data/120829_SN0001_0123_AC0UUUACXX");
//!
//! let mut flowcell =
//!     FlowcellRunMetrics::new(run, "120829", "AC0UUUACXX").with_logger(Logger::ambient());
//! flowcell.parse_filter_metrics();
//! flowcell.parse_bc_metrics();
//! flowcell.parse_demultiplex_stats_htm();
//!
//! let identity = SampleIdentity::new("AC0UUUACXX", "120829", "1", "P1_101", "2", "J_Doe_12_01");
//! let mut sample = SampleRunMetrics::new(run, identity);
//! sample.read_picard_metrics();
//! sample.parse_bc_metrics();
//!
//! println!("{}", flowcell.to_json().unwrap());
//! println!("{}", sample.to_json().unwrap());
//! ```
//!
//! ## Modules
//!
//! - [`parsing`]: Parsers for the individual report formats
//! - [`discovery`]: Directory walking and filename patterns
//! - [`core`]: Sample and flowcell records
//! - [`config`]: Record configuration
//! - [`utils`]: Logger handles and text helpers

pub mod config;
pub mod core;
pub mod discovery;
pub mod parsing;
pub mod utils;

// Re-export commonly used types for convenience
pub use config::QcConfig;
pub use core::flowcell::{FlowcellRunMetrics, LaneOutcomes};
pub use core::run_metrics::{RunMetrics, RunRecord};
pub use core::sample::{SampleIdentity, SampleRunMetrics};
pub use core::types::*;
pub use utils::logging::{init_logging, Logger};
