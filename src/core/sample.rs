//! Metrics of one sample on one lane of a flowcell.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::QcConfig;
use crate::core::run_metrics::{RunMetrics, RunRecord};
use crate::core::types::{EntityType, MetricsOutcome, NO_INDEX};
use crate::discovery::patterns::{
    BC_METRICS, FASTQC, FASTQ_SCREEN, PICARD_METRICS, SAMPLE_FILTER_METRICS,
};
use crate::parsing::bc_metrics::parse_bc_metrics_file;
use crate::parsing::fastq_screen::{parse_fastq_screen_file, ScreenMetrics};
use crate::parsing::fastqc::{parse_fastqc_dir, FastqcMetrics, FASTQC_DATA_FILE};
use crate::parsing::filter_metrics::{parse_filter_metrics_file, FilterMetrics};
use crate::parsing::picard::{extract_metrics, PicardMetrics};
use crate::utils::logging::Logger;

/// Barcode name used by the demultiplexer for reads without a known barcode
const UNMATCHED_BARCODE: &str = "unmatched";

/// Who a sample record describes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleIdentity {
    pub flowcell: String,
    pub date: String,
    pub lane: String,
    pub barcode_name: String,
    pub barcode_id: String,
    pub sample_prj: String,
    pub sequence: String,
    pub barcode_type: Option<String>,
    pub genomes_filter_out: Option<String>,
}

impl SampleIdentity {
    /// Identity of an unindexed sample; use the `with_` methods for the rest
    pub fn new(
        flowcell: impl Into<String>,
        date: impl Into<String>,
        lane: impl Into<String>,
        barcode_name: impl Into<String>,
        barcode_id: impl Into<String>,
        sample_prj: impl Into<String>,
    ) -> Self {
        Self {
            flowcell: flowcell.into(),
            date: date.into(),
            lane: lane.into(),
            barcode_name: barcode_name.into(),
            barcode_id: barcode_id.into(),
            sample_prj: sample_prj.into(),
            sequence: NO_INDEX.to_string(),
            barcode_type: None,
            genomes_filter_out: None,
        }
    }

    #[must_use]
    pub fn with_sequence(mut self, sequence: impl Into<String>) -> Self {
        self.sequence = sequence.into();
        self
    }

    #[must_use]
    pub fn with_barcode_type(mut self, barcode_type: impl Into<String>) -> Self {
        self.barcode_type = Some(barcode_type.into());
        self
    }

    #[must_use]
    pub fn with_genomes_filter_out(mut self, genomes: impl Into<String>) -> Self {
        self.genomes_filter_out = Some(genomes.into());
        self
    }

    /// Record name: `{lane}_{date}_{flowcell}_{sequence}`
    #[must_use]
    pub fn record_name(&self) -> String {
        format!(
            "{}_{}_{}_{}",
            self.lane, self.date, self.flowcell, self.sequence
        )
    }
}

/// QC metrics of one sample on one lane
#[derive(Debug, Clone, Serialize)]
pub struct SampleRunMetrics {
    #[serde(flatten)]
    base: RunMetrics,

    #[serde(flatten)]
    identity: SampleIdentity,

    pub fastqc: FastqcMetrics,
    pub fastq_scr: ScreenMetrics,
    pub picard_metrics: PicardMetrics,
    pub filter_metrics: FilterMetrics,
    pub bc_count: Option<u64>,
}

impl SampleRunMetrics {
    /// Create a record for `identity` with its files discovered under `path`.
    ///
    /// Diagnostics are discarded until a logger is attached with
    /// [`SampleRunMetrics::with_logger`].
    #[must_use]
    pub fn new(path: &Path, identity: SampleIdentity) -> Self {
        Self::with_options(path, identity, &QcConfig::default(), Logger::default())
    }

    #[must_use]
    pub fn with_options(
        path: &Path,
        identity: SampleIdentity,
        config: &QcConfig,
        logger: Logger,
    ) -> Self {
        let base = RunMetrics::new(
            EntityType::SampleRunMetrics,
            identity.record_name(),
            path,
            config,
            logger,
        );
        Self {
            base,
            identity,
            fastqc: FastqcMetrics::default(),
            fastq_scr: ScreenMetrics::new(),
            picard_metrics: PicardMetrics::default(),
            filter_metrics: FilterMetrics::default(),
            bc_count: None,
        }
    }

    /// Route this record's diagnostics to `logger`
    #[must_use]
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.base.set_logger(logger);
        self
    }

    #[must_use]
    pub fn identity(&self) -> &SampleIdentity {
        &self.identity
    }

    /// Read the Picard metrics files of this sample.
    ///
    /// Like every sample operation, this clears its container first, so a
    /// failed read leaves the empty shape rather than earlier results.
    pub fn read_picard_metrics(&mut self) -> MetricsOutcome {
        let (lane, barcode_id) = (&self.identity.lane, &self.identity.barcode_id);
        let base = &self.base;
        let picard_metrics = &mut self.picard_metrics;
        *picard_metrics = PicardMetrics::default();
        base.run_operation("read_picard_metrics", false, || {
            let files = base.select(&PICARD_METRICS, lane, barcode_id)?;
            *picard_metrics = extract_metrics(&files)?;
            Ok(())
        })
    }

    /// Read the FastQ Screen summary of the first read
    pub fn parse_fastq_screen(&mut self) -> MetricsOutcome {
        let (lane, barcode_id) = (&self.identity.lane, &self.identity.barcode_id);
        let base = &self.base;
        let fastq_scr = &mut self.fastq_scr;
        *fastq_scr = ScreenMetrics::new();
        base.run_operation("parse_fastq_screen", false, || {
            let files = base.select(&FASTQ_SCREEN, lane, barcode_id)?;
            *fastq_scr = parse_fastq_screen_file(&files[0])?;
            Ok(())
        })
    }

    /// Read the FastQC report of this sample; unmatched reads have none
    pub fn read_fastqc_metrics(&mut self) -> MetricsOutcome {
        let identity = &self.identity;
        let base = &self.base;
        let fastqc = &mut self.fastqc;
        *fastqc = FastqcMetrics::default();
        base.run_operation("read_fastqc_metrics", false, || {
            if identity.barcode_name == UNMATCHED_BARCODE {
                return Err(MetricsOutcome::Skipped(
                    "no FastQC report for unmatched reads".to_string(),
                ));
            }
            let report_dir = base
                .select(&FASTQC, &identity.lane, &identity.barcode_id)?
                .into_iter()
                .find(|f| f.file_name().is_some_and(|n| n == FASTQC_DATA_FILE))
                .and_then(|f| f.parent().map(Path::to_path_buf))
                .ok_or_else(|| MetricsOutcome::Missing {
                    pattern: FASTQC_DATA_FILE.to_string(),
                })?;
            fastqc.stats = Some(parse_fastqc_dir(&report_dir)?);
            Ok(())
        })
    }

    /// Read this sample's read filter metrics
    pub fn parse_filter_metrics(&mut self) -> MetricsOutcome {
        let (lane, barcode_id) = (&self.identity.lane, &self.identity.barcode_id);
        let base = &self.base;
        let filter_metrics = &mut self.filter_metrics;
        *filter_metrics = FilterMetrics::default();
        base.run_operation("parse_filter_metrics", false, || {
            let files = base.select(&SAMPLE_FILTER_METRICS, lane, barcode_id)?;
            *filter_metrics = parse_filter_metrics_file(&files[0])?;
            Ok(())
        })
    }

    /// Look up this sample's count in the lane's barcode counts.
    ///
    /// Lanes without barcode counts are common, so their absence is only
    /// logged at debug level.
    pub fn parse_bc_metrics(&mut self) -> MetricsOutcome {
        let (lane, barcode_id) = (&self.identity.lane, &self.identity.barcode_id);
        let base = &self.base;
        let bc_count = &mut self.bc_count;
        *bc_count = None;
        base.run_operation("parse_bc_metrics", true, || {
            let files = base.select(&BC_METRICS, lane, "")?;
            let counts = parse_bc_metrics_file(&files[0])?;
            *bc_count = counts.get(barcode_id.as_str()).copied();
            if bc_count.is_none() {
                return Err(MetricsOutcome::Skipped(format!(
                    "barcode {barcode_id} not counted"
                )));
            }
            Ok(())
        })
    }
}

impl RunRecord for SampleRunMetrics {
    fn run_metrics(&self) -> &RunMetrics {
        &self.base
    }

    fn run_metrics_mut(&mut self) -> &mut RunMetrics {
        &mut self.base
    }
}

impl fmt::Display for SampleRunMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} {}>", EntityType::SampleRunMetrics, self.base.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> SampleIdentity {
        SampleIdentity::new("AC0UUUACXX", "120829", "1", "P1_101", "2", "J_Doe_12_01")
    }

    #[test]
    fn test_record_name() {
        let identity = identity();
        assert_eq!(identity.record_name(), "1_120829_AC0UUUACXX_NoIndex");
        assert_eq!(
            identity.with_sequence("ACAGTG").record_name(),
            "1_120829_AC0UUUACXX_ACAGTG"
        );
    }

    #[test]
    fn test_display() {
        let dir = tempfile::tempdir().unwrap();
        let record = SampleRunMetrics::new(dir.path(), identity()).with_logger(Logger::sink());
        assert_eq!(
            record.to_string(),
            "<sample_run_metrics 1_120829_AC0UUUACXX_NoIndex>"
        );
    }

    #[test]
    fn test_unmatched_has_no_fastqc() {
        let dir = tempfile::tempdir().unwrap();
        let identity = SampleIdentity::new("AC0UUUACXX", "120829", "1", "unmatched", "999", "J_Doe_12_01");
        let mut record = SampleRunMetrics::with_options(
            dir.path(),
            identity,
            &QcConfig::default(),
            Logger::sink(),
        );
        assert!(matches!(record.read_fastqc_metrics(), MetricsOutcome::Skipped(_)));
        assert_eq!(record.fastqc, FastqcMetrics::default());
    }

    #[test]
    fn test_empty_record_serializes_all_containers() {
        let dir = tempfile::tempdir().unwrap();
        let record = SampleRunMetrics::with_options(
            dir.path(),
            identity(),
            &QcConfig::default(),
            Logger::sink(),
        );
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["entity_type"], "sample_run_metrics");
        assert_eq!(value["barcode_id"], "2");
        assert_eq!(value["sequence"], "NoIndex");
        assert!(value["barcode_type"].is_null());
        assert!(value["bc_count"].is_null());
        assert_eq!(value["fastqc"], serde_json::json!({}));
        assert_eq!(value["fastq_scr"], serde_json::json!({}));
        assert_eq!(value["picard_metrics"], serde_json::json!({}));
        assert!(value["filter_metrics"]["reads"].is_null());
    }
}
