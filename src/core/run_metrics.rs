//! State shared by every run record.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::QcConfig;
use crate::core::types::{EntityType, MetricsOutcome};
use crate::discovery::patterns::PatternSet;
use crate::discovery::{self, DiscoveryError, FileMatcher};
use crate::parsing::ParseError;
use crate::utils::logging::Logger;

/// Identity, timestamps and discovered files of a run record.
///
/// Only the identity and timestamps are serialized; the run directory, the
/// file list and the logger stay with the in-memory record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetrics {
    #[serde(rename = "_id")]
    id: String,

    entity_type: EntityType,

    name: String,

    pub creation_time: Option<DateTime<Utc>>,

    pub modification_time: Option<DateTime<Utc>>,

    #[serde(skip)]
    path: PathBuf,

    #[serde(skip)]
    files: Vec<PathBuf>,

    #[serde(skip)]
    ignore_patterns: Vec<String>,

    #[serde(skip)]
    logger: Logger,
}

impl RunMetrics {
    /// Create a record rooted at `path` and discover its files.
    ///
    /// A run directory that does not exist yields an empty file list;
    /// [`RunMetrics::collect_files`] reports it as an error instead.
    #[must_use]
    pub fn new(
        entity_type: EntityType,
        name: String,
        path: &Path,
        config: &QcConfig,
        logger: Logger,
    ) -> Self {
        let mut record = Self {
            id: Uuid::new_v4().simple().to_string(),
            entity_type,
            name,
            creation_time: None,
            modification_time: None,
            path: path.to_path_buf(),
            files: Vec::new(),
            ignore_patterns: config.ignore_patterns.clone(),
            logger,
        };

        if record.path.exists() {
            let logger = record.logger.clone();
            if let Err(err) = logger.scope(|| record.collect_files()) {
                logger.scope(|| warn!(record = %record.name, error = %err, "file discovery failed"));
            }
        } else {
            record.logger.scope(|| {
                debug!(record = %record.name, path = %record.path.display(), "run directory not found");
            });
        }
        record
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    #[must_use]
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn set_logger(&mut self, logger: Logger) {
        self.logger = logger;
    }

    /// Replace the file list with a fresh walk of the run directory
    ///
    /// # Errors
    ///
    /// Returns `DiscoveryError::RootNotFound` if the run directory does not
    /// exist; the previous file list is kept in that case.
    pub fn collect_files(&mut self) -> Result<(), DiscoveryError> {
        let files = discovery::collect_files(&self.path, &self.ignore_patterns)?;
        debug!(record = %self.name, count = files.len(), "collected files");
        self.files = files;
        Ok(())
    }

    /// Discovered files accepted by `matcher`
    #[must_use]
    pub fn filter_files(&self, matcher: &impl FileMatcher) -> Vec<PathBuf> {
        discovery::filter_files(&self.files, matcher)
    }

    /// Discovered files matching `set`, or the `Missing` outcome if none do
    pub(crate) fn select(
        &self,
        set: &PatternSet,
        lane: &str,
        barcode_id: &str,
    ) -> Result<Vec<PathBuf>, MetricsOutcome> {
        let regex = set.render(lane, barcode_id).map_err(|e| {
            ParseError::InvalidFormat(format!("Invalid {} pattern: {e}", set.name()))
        })?;
        let files = self.filter_files(&regex);
        debug!(
            record = %self.name,
            pattern = set.name(),
            lane,
            count = files.len(),
            files = ?files,
            "selected files"
        );
        if files.is_empty() {
            return Err(MetricsOutcome::Missing {
                pattern: regex.as_str().to_string(),
            });
        }
        Ok(files)
    }

    /// Run one metrics operation under this record's logger and report its outcome
    pub(crate) fn run_operation(
        &self,
        operation: &str,
        quiet_missing: bool,
        f: impl FnOnce() -> Result<(), MetricsOutcome>,
    ) -> MetricsOutcome {
        self.logger.clone().scope(|| {
            let outcome = match f() {
                Ok(()) => MetricsOutcome::Parsed,
                Err(outcome) => outcome,
            };
            self.log_outcome(operation, &outcome, quiet_missing);
            outcome
        })
    }

    fn log_outcome(&self, operation: &str, outcome: &MetricsOutcome, quiet_missing: bool) {
        let record = self.name.as_str();
        match outcome {
            MetricsOutcome::Parsed => debug!(record, operation, "metrics parsed"),
            MetricsOutcome::Skipped(reason) => debug!(record, operation, %reason, "skipped"),
            MetricsOutcome::Missing { pattern } if quiet_missing => {
                debug!(record, operation, %pattern, "no input file");
            }
            MetricsOutcome::Missing { pattern } => {
                warn!(record, operation, %pattern, "no input file");
            }
            MetricsOutcome::Failed(err) => {
                warn!(record, operation, error = %err, "metrics parsing failed");
            }
        }
    }
}

/// Common surface of sample and flowcell records
pub trait RunRecord: Serialize {
    fn run_metrics(&self) -> &RunMetrics;

    fn run_metrics_mut(&mut self) -> &mut RunMetrics;

    /// Opaque unique identifier of the record
    fn id(&self) -> &str {
        self.run_metrics().id()
    }

    /// Identifier under which the record is stored
    fn get_db_id(&self) -> &str {
        self.id()
    }

    fn name(&self) -> &str {
        self.run_metrics().name()
    }

    fn entity_type(&self) -> EntityType {
        self.run_metrics().entity_type()
    }

    fn files(&self) -> &[PathBuf] {
        self.run_metrics().files()
    }

    fn filter_files(&self, matcher: &impl FileMatcher) -> Vec<PathBuf>
    where
        Self: Sized,
    {
        self.run_metrics().filter_files(matcher)
    }

    /// Rediscover the record's files
    ///
    /// # Errors
    ///
    /// Returns `DiscoveryError::RootNotFound` if the run directory is gone.
    fn collect_files(&mut self) -> Result<(), DiscoveryError> {
        let logger = self.run_metrics().logger().clone();
        logger.scope(|| self.run_metrics_mut().collect_files())
    }

    /// Serialize the record to pretty JSON
    ///
    /// # Errors
    ///
    /// Returns an error if a field cannot be represented as JSON.
    fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
