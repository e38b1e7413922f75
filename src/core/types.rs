use serde::{Deserialize, Serialize};

use crate::parsing::bc_metrics::BarcodeCounts;
use crate::parsing::filter_metrics::FilterMetrics;
use crate::parsing::ParseError;

/// Lanes of a flowcell
pub const LANES: [u8; 8] = [1, 2, 3, 4, 5, 6, 7, 8];

/// Sequence recorded for samples without an index read
pub const NO_INDEX: &str = "NoIndex";

/// Kind of run record, as stored under `entity_type`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    SampleRunMetrics,
    FlowcellRunMetrics,
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SampleRunMetrics => write!(f, "sample_run_metrics"),
            Self::FlowcellRunMetrics => write!(f, "flowcell_run_metrics"),
        }
    }
}

/// Result of one metrics-gathering operation on a record.
///
/// Operations never fail outright: a missing or unreadable input leaves the
/// record's field at its empty value and is reported here.
#[derive(Debug)]
pub enum MetricsOutcome {
    /// Input found and stored on the record
    Parsed,
    /// Operation not applicable to this record
    Skipped(String),
    /// No discovered file matched
    Missing { pattern: String },
    /// An input was found but could not be parsed
    Failed(ParseError),
}

impl From<ParseError> for MetricsOutcome {
    fn from(err: ParseError) -> Self {
        Self::Failed(err)
    }
}

impl MetricsOutcome {
    #[must_use]
    pub fn is_parsed(&self) -> bool {
        matches!(self, Self::Parsed)
    }

    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing { .. })
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Barcode data of one lane.
///
/// Until barcode counts are read, a lane holds the null read-count shape so
/// every lane serializes with the same keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LaneBarcodeMetrics {
    Counts(BarcodeCounts),
    Unset(FilterMetrics),
}

impl Default for LaneBarcodeMetrics {
    fn default() -> Self {
        Self::Unset(FilterMetrics::default())
    }
}

impl LaneBarcodeMetrics {
    /// Count for `barcode`, if counts have been read
    #[must_use]
    pub fn count(&self, barcode: &str) -> Option<u64> {
        match self {
            Self::Counts(counts) => counts.get(barcode).copied(),
            Self::Unset(_) => None,
        }
    }
}

/// Per-lane metrics of a flowcell
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneMetrics {
    pub lane: String,
    pub filter_metrics: FilterMetrics,
    pub bc_metrics: LaneBarcodeMetrics,
}

impl LaneMetrics {
    #[must_use]
    pub fn new(lane: u8) -> Self {
        Self {
            lane: lane.to_string(),
            ..Self::default()
        }
    }
}
