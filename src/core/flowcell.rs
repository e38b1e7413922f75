//! Metrics of one flowcell across its eight lanes.
//!
//! A flowcell record reads the run descriptor when it is created and
//! discovers the files of the run directory once. The remaining inputs are
//! read on demand by the `parse_*` operations:
//!
//! | Operation | Input | Field |
//! |-----------|-------|-------|
//! | `parse_filter_metrics` | `{lane}_{date}_{fc}.filter_metrics` | `lanes[*].filter_metrics` |
//! | `parse_bc_metrics` | `{lane}_{date}_{fc}.bc_metrics` | `lanes[*].bc_metrics` |
//! | `parse_illumina_metrics` | RTA XML reports | `illumina` |
//! | `parse_demultiplex_stats_htm` | `Unaligned/Basecall_Stats_*/Demultiplex_Stats.htm` | `illumina.Demultiplex_Stats` |
//! | `parse_samplesheet_csv` | `{flowcell}.csv` | `samplesheet_csv` |
//! | `parse_run_info_yaml` | `run_info.yaml` | `run_info_yaml` |

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::config::QcConfig;
use crate::core::run_metrics::{RunMetrics, RunRecord};
use crate::core::types::{EntityType, LaneBarcodeMetrics, LaneMetrics, MetricsOutcome, LANES};
use crate::discovery::patterns::{BC_METRICS, FLOWCELL_FILTER_METRICS};
use crate::discovery::{self, FnMatcher};
use crate::parsing::bc_metrics::parse_bc_metrics_file;
use crate::parsing::demultiplex_stats::parse_demultiplex_stats_file;
use crate::parsing::filter_metrics::{parse_filter_metrics_file, FilterMetrics};
use crate::parsing::illumina::{parse_illumina_xml, IlluminaMetrics};
use crate::parsing::run_info::{parse_run_info_file, RunInfo};
use crate::parsing::run_info_yaml::parse_run_info_yaml_file;
use crate::parsing::samplesheet::{parse_samplesheet_file, SampleSheetRows};
use crate::parsing::ParseError;
use crate::utils::logging::Logger;

/// Outcome of a per-lane operation, keyed by lane
pub type LaneOutcomes = BTreeMap<String, MetricsOutcome>;

/// QC metrics of one flowcell
#[derive(Debug, Clone, Serialize)]
pub struct FlowcellRunMetrics {
    #[serde(flatten)]
    base: RunMetrics,

    #[serde(skip)]
    fc_name: String,

    #[serde(skip)]
    config: QcConfig,

    #[serde(rename = "RunInfo")]
    pub run_info: RunInfo,

    pub run_info_yaml: serde_json::Value,

    pub samplesheet_csv: SampleSheetRows,

    pub lanes: BTreeMap<String, LaneMetrics>,

    pub illumina: IlluminaMetrics,
}

impl FlowcellRunMetrics {
    /// Create a record for flowcell `fc_name` run on `fc_date`, rooted at `path`.
    ///
    /// The run descriptor is read before any logger can be attached; use
    /// [`FlowcellRunMetrics::with_options`] to see its diagnostics.
    #[must_use]
    pub fn new(path: &Path, fc_date: &str, fc_name: &str) -> Self {
        Self::with_options(path, fc_date, fc_name, &QcConfig::default(), Logger::default())
    }

    #[must_use]
    pub fn with_options(
        path: &Path,
        fc_date: &str,
        fc_name: &str,
        config: &QcConfig,
        logger: Logger,
    ) -> Self {
        let name = format!("{fc_date}_{fc_name}");
        let run_info = RunInfo::placeholder(&name, fc_name, fc_date);
        let base = RunMetrics::new(EntityType::FlowcellRunMetrics, name, path, config, logger);
        let lanes = LANES
            .iter()
            .map(|&lane| (lane.to_string(), LaneMetrics::new(lane)))
            .collect();

        let mut record = Self {
            base,
            fc_name: fc_name.to_string(),
            config: config.clone(),
            run_info,
            run_info_yaml: serde_json::Value::Object(serde_json::Map::new()),
            samplesheet_csv: SampleSheetRows::new(),
            lanes,
            illumina: IlluminaMetrics::default(),
        };
        record.parse_run_info();
        record
    }

    /// Route this record's diagnostics to `logger`
    #[must_use]
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.base.set_logger(logger);
        self
    }

    #[must_use]
    pub fn fc_name(&self) -> &str {
        &self.fc_name
    }

    /// Replace the placeholder identity with the run descriptor, if present
    pub fn parse_run_info(&mut self) -> MetricsOutcome {
        let infile = self.base.path().join(&self.config.run_info_file);
        let base = &self.base;
        let run_info = &mut self.run_info;
        base.run_operation("parse_run_info", false, || {
            let infile = existing(infile)?;
            *run_info = parse_run_info_file(&infile)?;
            Ok(())
        })
    }

    /// Read the read filter metrics of every lane
    pub fn parse_filter_metrics(&mut self) -> LaneOutcomes {
        let base = &self.base;
        let mut outcomes = LaneOutcomes::new();
        for (lane, metrics) in &mut self.lanes {
            metrics.filter_metrics = FilterMetrics::default();
            let operation = format!("parse_filter_metrics lane {lane}");
            let outcome = base.run_operation(&operation, false, || {
                let files = base.select(&FLOWCELL_FILTER_METRICS, lane, "")?;
                metrics.filter_metrics = parse_filter_metrics_file(&files[0])?;
                Ok(())
            });
            outcomes.insert(lane.clone(), outcome);
        }
        outcomes
    }

    /// Read the barcode counts of every lane
    pub fn parse_bc_metrics(&mut self) -> LaneOutcomes {
        let base = &self.base;
        let mut outcomes = LaneOutcomes::new();
        for (lane, metrics) in &mut self.lanes {
            metrics.bc_metrics = LaneBarcodeMetrics::default();
            let operation = format!("parse_bc_metrics lane {lane}");
            let outcome = base.run_operation(&operation, false, || {
                let files = base.select(&BC_METRICS, lane, "")?;
                metrics.bc_metrics = LaneBarcodeMetrics::Counts(parse_bc_metrics_file(&files[0])?);
                Ok(())
            });
            outcomes.insert(lane.clone(), outcome);
        }
        outcomes
    }

    /// Read the RTA XML reports found anywhere under the run directory and
    /// merge them into `illumina`.
    ///
    /// The walk does not apply the ignore patterns. Per-tile chart families
    /// are only read when `full_rta` is set. Families that parse are merged
    /// even when others fail; the outcome is `Failed` naming the failed ones.
    pub fn parse_illumina_metrics(&mut self, full_rta: bool) -> MetricsOutcome {
        let base = &self.base;
        let illumina = &mut self.illumina;
        base.run_operation("parse_illumina_metrics", false, || {
            let files = discovery::collect_files(base.path(), &[]).map_err(ParseError::from)?;
            let is_xml = FnMatcher(|p: &Path| p.extension().is_some_and(|e| e == "xml"));
            let xml_files = discovery::filter_files(&files, &is_xml);
            debug!(count = xml_files.len(), full_rta, "found RTA files");
            let (metrics, errors) = parse_illumina_xml(&xml_files, full_rta);
            illumina.merge(metrics);
            if errors.is_empty() {
                return Ok(());
            }
            let failed: Vec<String> = errors.iter().map(ToString::to_string).collect();
            Err(ParseError::InvalidFormat(failed.join("; ")).into())
        })
    }

    /// Read the CASAVA demultiplexing report into `illumina`
    pub fn parse_demultiplex_stats_htm(&mut self) -> MetricsOutcome {
        let htm_file = self
            .base
            .path()
            .join("Unaligned")
            .join(format!("Basecall_Stats_{}", without_first_char(&self.fc_name)))
            .join("Demultiplex_Stats.htm");
        let base = &self.base;
        let illumina = &mut self.illumina;
        base.run_operation("parse_demultiplex_stats_htm", false, || {
            let htm_file = existing(htm_file)?;
            illumina.demultiplex_stats = Some(parse_demultiplex_stats_file(&htm_file)?);
            Ok(())
        })
    }

    /// Transcribe the sample sheet named after the flowcell
    pub fn parse_samplesheet_csv(&mut self) -> MetricsOutcome {
        let flowcell = self.run_info.flowcell.clone();
        let root = self.base.path().to_path_buf();
        let base = &self.base;
        let samplesheet_csv = &mut self.samplesheet_csv;
        base.run_operation("parse_samplesheet_csv", false, || {
            let flowcell = flowcell.ok_or_else(|| {
                MetricsOutcome::Skipped("run descriptor has no flowcell".to_string())
            })?;
            let infile = existing(root.join(format!("{}.csv", without_first_char(&flowcell))))?;
            *samplesheet_csv = parse_samplesheet_file(&infile)?;
            Ok(())
        })
    }

    /// Transcribe the run configuration YAML
    pub fn parse_run_info_yaml(&mut self) -> MetricsOutcome {
        let infile = self.base.path().join(&self.config.run_info_yaml_file);
        let base = &self.base;
        let run_info_yaml = &mut self.run_info_yaml;
        base.run_operation("parse_run_info_yaml", false, || {
            let infile = existing(infile)?;
            *run_info_yaml = parse_run_info_yaml_file(&infile)?;
            Ok(())
        })
    }

    /// Flowcell id with its position prefix, taken from the run id
    #[must_use]
    pub fn get_full_flowcell(&self) -> Option<&str> {
        self.run_info.id.as_deref().and_then(|id| id.rsplit('_').next())
    }

    #[must_use]
    pub fn get_flowcell(&self) -> Option<&str> {
        self.run_info.flowcell.as_deref()
    }

    #[must_use]
    pub fn get_date(&self) -> Option<&str> {
        self.run_info.date.as_deref()
    }

    /// `{date}_{full flowcell}`
    #[must_use]
    pub fn get_run_name(&self) -> Option<String> {
        Some(format!("{}_{}", self.get_date()?, self.get_full_flowcell()?))
    }
}

impl RunRecord for FlowcellRunMetrics {
    fn run_metrics(&self) -> &RunMetrics {
        &self.base
    }

    fn run_metrics_mut(&mut self) -> &mut RunMetrics {
        &mut self.base
    }
}

impl fmt::Display for FlowcellRunMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<flowcell_metrics {}>", self.base.name())
    }
}

fn existing(path: PathBuf) -> Result<PathBuf, MetricsOutcome> {
    debug!(path = %path.display(), "reading");
    if path.is_file() {
        Ok(path)
    } else {
        Err(MetricsOutcome::Missing {
            pattern: path.display().to_string(),
        })
    }
}

/// Flowcell ids carry a leading position letter that file names omit
fn without_first_char(s: &str) -> &str {
    let mut chars = s.chars();
    chars.next();
    chars.as_str()
}
