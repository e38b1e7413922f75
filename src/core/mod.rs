//! Run records assembled from the parsers.
//!
//! - [`RunMetrics`]: identity, timestamps and discovered files shared by all records
//! - [`SampleRunMetrics`]: one sample on one lane of a flowcell
//! - [`FlowcellRunMetrics`]: one flowcell across lanes `"1"` to `"8"`
//!
//! Records are created from a run directory and filled by their `parse_*`
//! and `read_*` operations. An operation never fails: when its input is
//! missing or unreadable the field keeps its empty value and the returned
//! [`MetricsOutcome`] says why.
//!
//! | Record | Name |
//! |--------|------|
//! | sample | `{lane}_{date}_{flowcell}_{sequence}` |
//! | flowcell | `{date}_{flowcell}` |

pub mod flowcell;
pub mod run_metrics;
pub mod sample;
pub mod types;

pub use flowcell::FlowcellRunMetrics;
pub use run_metrics::{RunMetrics, RunRecord};
pub use sample::{SampleIdentity, SampleRunMetrics};
pub use types::MetricsOutcome;
