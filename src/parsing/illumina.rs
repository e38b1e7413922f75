//! Parsers for the XML reports written by Illumina's real-time analysis (RTA).
//!
//! Two shapes are handled:
//!
//! - **Per-tile charts** (`ErrorRate/`, `FWHM/`, `Intensity/`, `NumGT30/` and
//!   `*_Chart.xml`): one file per cycle, each holding one value per tile.
//!   They are folded into a `lane_tile -> cycle -> value` table.
//! - **Per-lane summaries** (`Summary/*.xml`, `NumClusters By *.xml`): one
//!   entry per file with nested per-lane attribute maps.
//!
//! ```xml
//! <FlowCellData Name="ErrorRate">
//!   <Layout NumLanes="8" RowsPerLane="60" ColsPerLane="2" />
//!   <TL Key="1_1" Val="0.41" />
//!   <TL Key="1_2" Val="NaN" />
//! </FlowCellData>
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::parsing::demultiplex_stats::DemultiplexStats;
use crate::parsing::ParseError;
use crate::utils::xml::{attribute_map, tag_name};

/// Chart files carry a `Chart_` prefix before the cycle number
const CHART_PREFIX: &str = "Chart_";
const NOT_A_NUMBER: &str = "NaN";
/// Upper bound on the tiles a chart layout may declare across all lanes
const MAX_LAYOUT_TILES: u32 = 100_000;

/// Per-tile values by cycle; `None` where RTA reported `NaN`.
pub type CycleValues = BTreeMap<String, Option<f64>>;

/// One key of a chart table: either a layout attribute or a tile's cycles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChartEntry {
    Attribute(String),
    Tile(CycleValues),
}

/// Chart table for one metric family, keyed by layout attribute name or
/// `lane_tile`.
pub type ChartData = BTreeMap<String, ChartEntry>;

/// One key of a lane summary: a root attribute or one lane's attributes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SummaryEntry {
    Attribute(String),
    Lane(BTreeMap<String, String>),
}

/// Lane summaries keyed by file stem
pub type LaneSummaries = BTreeMap<String, BTreeMap<String, SummaryEntry>>;

/// Everything collected from the RTA and demultiplexing reports of a flowcell
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IlluminaMetrics {
    #[serde(rename = "ErrorRate", default, skip_serializing_if = "Option::is_none")]
    pub error_rate: Option<ChartData>,

    #[serde(rename = "FWHM", default, skip_serializing_if = "Option::is_none")]
    pub fwhm: Option<ChartData>,

    #[serde(rename = "Intensity", default, skip_serializing_if = "Option::is_none")]
    pub intensity: Option<ChartData>,

    #[serde(rename = "NumGT30", default, skip_serializing_if = "Option::is_none")]
    pub num_gt30: Option<ChartData>,

    #[serde(rename = "Charts", default, skip_serializing_if = "Option::is_none")]
    pub charts: Option<ChartData>,

    #[serde(rename = "Summary", default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<LaneSummaries>,

    #[serde(rename = "NumClusters", default, skip_serializing_if = "Option::is_none")]
    pub num_clusters: Option<LaneSummaries>,

    #[serde(
        rename = "Demultiplex_Stats",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub demultiplex_stats: Option<DemultiplexStats>,

    /// Keys written by other collaborators, carried through untouched
    #[serde(flatten)]
    pub other: BTreeMap<String, serde_json::Value>,
}

impl IlluminaMetrics {
    /// Overwrite every section that `update` carries, keep the rest
    pub fn merge(&mut self, update: IlluminaMetrics) {
        fn take<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }

        take(&mut self.error_rate, update.error_rate);
        take(&mut self.fwhm, update.fwhm);
        take(&mut self.intensity, update.intensity);
        take(&mut self.num_gt30, update.num_gt30);
        take(&mut self.charts, update.charts);
        take(&mut self.summary, update.summary);
        take(&mut self.num_clusters, update.num_clusters);
        take(&mut self.demultiplex_stats, update.demultiplex_stats);
        self.other.extend(update.other);
    }

    /// True when no section has been collected
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A metric family whose files could not be parsed
#[derive(Debug)]
pub struct FamilyError {
    pub family: &'static str,
    pub error: ParseError,
}

impl std::fmt::Display for FamilyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.family, self.error)
    }
}

/// Parse the RTA XML files of a run.
///
/// Lane summaries and cluster counts are always parsed. The per-tile chart
/// families are only parsed when `full_rta` is set; a family without files
/// yields an empty table. Each family is parsed on its own: a family that
/// fails is left unset and reported in the returned errors, the others are
/// kept.
#[must_use]
pub fn parse_illumina_xml(files: &[PathBuf], full_rta: bool) -> (IlluminaMetrics, Vec<FamilyError>) {
    let mut metrics = IlluminaMetrics::default();
    let mut errors = Vec::new();

    if full_rta {
        let charts = |dir: &str| parse_charts(&in_directory(files, dir));
        metrics.error_rate = keep_family("ErrorRate", charts("ErrorRate"), &mut errors);
        metrics.fwhm = keep_family("FWHM", charts("FWHM"), &mut errors);
        metrics.intensity = keep_family("Intensity", charts("Intensity"), &mut errors);
        metrics.num_gt30 = keep_family("NumGT30", charts("NumGT30"), &mut errors);
        let chart_files: Vec<&Path> = files
            .iter()
            .map(PathBuf::as_path)
            .filter(|f| file_name(f).ends_with("_Chart.xml"))
            .collect();
        metrics.charts = keep_family("Charts", parse_charts(&chart_files), &mut errors);
    }

    let summary = parse_lane_summaries(&in_directory(files, "Summary"), "Summary");
    metrics.summary = keep_family("Summary", summary, &mut errors);
    let cluster_files: Vec<&Path> = files
        .iter()
        .map(PathBuf::as_path)
        .filter(|f| file_name(f).starts_with("NumClusters By"))
        .collect();
    let num_clusters = parse_lane_summaries(&cluster_files, "Data");
    metrics.num_clusters = keep_family("NumClusters", num_clusters, &mut errors);

    (metrics, errors)
}

fn keep_family<T>(
    family: &'static str,
    result: Result<T, ParseError>,
    errors: &mut Vec<FamilyError>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(error) => {
            debug!(family, %error, "RTA family not parsed");
            errors.push(FamilyError { family, error });
            None
        }
    }
}

/// Fold per-cycle chart files into one table
///
/// # Errors
///
/// Returns `ParseError::Io` if a file cannot be read, `ParseError::Xml` if
/// it is not well formed, or `ParseError::InvalidFormat` for non-numeric
/// layout or tile values.
pub fn parse_charts(files: &[&Path]) -> Result<ChartData, ParseError> {
    debug!(count = files.len(), "parsing chart files");
    let mut builder = ChartBuilder::default();
    for file in files {
        let content = std::fs::read_to_string(file)?;
        builder.add_document(&chart_index(file), &content)?;
    }
    Ok(builder.table)
}

/// Collect per-lane summaries whose attributes sit on `root` and `Lane` tags
///
/// # Errors
///
/// Returns `ParseError::Io` if a file cannot be read or `ParseError::Xml` if
/// it is not well formed.
pub fn parse_lane_summaries(files: &[&Path], root: &str) -> Result<LaneSummaries, ParseError> {
    debug!(count = files.len(), root, "parsing lane summary files");
    let mut summaries = LaneSummaries::new();
    for file in files {
        let content = std::fs::read_to_string(file)?;
        let stem = file_name(file).trim_end_matches(".xml").to_string();
        add_lane_summary(&mut summaries, &stem, &content, root)?;
    }
    Ok(summaries)
}

fn add_lane_summary(
    summaries: &mut LaneSummaries,
    index: &str,
    text: &str,
    root: &str,
) -> Result<(), ParseError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event()? {
            Event::Start(tag) | Event::Empty(tag) => {
                let name = tag_name(&tag);
                if name == root {
                    let entry = attribute_map(&tag)?
                        .into_iter()
                        .map(|(k, v)| (k, SummaryEntry::Attribute(v)))
                        .collect();
                    summaries.insert(index.to_string(), entry);
                } else if name == "Lane" {
                    let attrs = attribute_map(&tag)?;
                    let key = attrs.get("key").cloned().ok_or_else(|| {
                        ParseError::InvalidFormat(format!("Lane without key in '{index}'"))
                    })?;
                    summaries
                        .entry(index.to_string())
                        .or_default()
                        .insert(key, SummaryEntry::Lane(attrs));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(())
}

/// Accumulates chart documents for one metric family
#[derive(Default)]
struct ChartBuilder {
    table: ChartData,
    header: BTreeMap<String, String>,
    sized: bool,
}

impl ChartBuilder {
    fn add_document(&mut self, index: &str, text: &str) -> Result<(), ParseError> {
        let mut reader = Reader::from_str(text);
        reader.config_mut().trim_text(true);

        loop {
            match reader.read_event()? {
                Event::Start(tag) | Event::Empty(tag) => match tag_name(&tag).as_str() {
                    "FlowCellData" => self.header = attribute_map(&tag)?,
                    "Layout" => self.size_from_layout(&tag)?,
                    "TL" => self.add_tile(index, &tag)?,
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(())
    }

    /// The first layout seen decides the table's keys
    fn size_from_layout(&mut self, tag: &BytesStart<'_>) -> Result<(), ParseError> {
        if self.sized {
            return Ok(());
        }
        let layout = attribute_map(tag)?;
        let num_lanes = layout_value(&layout, "NumLanes")?;
        let tiles_per_lane = layout_value(&layout, "RowsPerLane")?
            .checked_mul(layout_value(&layout, "ColsPerLane")?)
            .filter(|tiles| {
                tiles
                    .checked_mul(num_lanes)
                    .is_some_and(|total| total <= MAX_LAYOUT_TILES)
            })
            .ok_or_else(|| {
                ParseError::InvalidFormat(format!(
                    "Layout exceeds {MAX_LAYOUT_TILES} tiles"
                ))
            })?;

        for (key, value) in std::mem::take(&mut self.header).into_iter().chain(layout) {
            self.table.insert(key, ChartEntry::Attribute(value));
        }
        for lane in 1..=num_lanes {
            for tile in 1..=tiles_per_lane {
                self.table
                    .insert(format!("{lane}_{tile}"), ChartEntry::Tile(CycleValues::new()));
            }
        }
        self.sized = true;
        Ok(())
    }

    fn add_tile(&mut self, index: &str, tag: &BytesStart<'_>) -> Result<(), ParseError> {
        let mut key = None;
        let mut value = None;
        for attr in tag.attributes() {
            let attr = attr?;
            let raw = attr.unescape_value()?;
            if attr.key.as_ref() == b"Key" {
                key = Some(raw.into_owned());
            } else {
                value = Some(raw.into_owned());
            }
        }

        let key = key.ok_or_else(|| ParseError::InvalidFormat("TL without Key".to_string()))?;
        let value = match value.as_deref() {
            None | Some(NOT_A_NUMBER) => None,
            Some(v) => Some(v.parse::<f64>().map_err(|_| {
                ParseError::InvalidFormat(format!("Invalid value for tile {key}: '{v}'"))
            })?),
        };

        match self.table.get_mut(&key) {
            Some(ChartEntry::Tile(cycles)) => {
                cycles.insert(index.to_string(), value);
            }
            _ => {
                let cycles = CycleValues::from([(index.to_string(), value)]);
                self.table.insert(key, ChartEntry::Tile(cycles));
            }
        }
        Ok(())
    }
}

fn layout_value(layout: &BTreeMap<String, String>, name: &str) -> Result<u32, ParseError> {
    layout
        .get(name)
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| ParseError::InvalidFormat(format!("Layout attribute '{name}' missing or invalid")))
}

fn file_name(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or_default()
}

/// Cycle index from a chart file name: `Chart_12.xml` -> `12`
fn chart_index(path: &Path) -> String {
    let name = file_name(path).trim_end_matches(".xml");
    name.strip_prefix(CHART_PREFIX).unwrap_or(name).to_string()
}

/// Files whose parent directory name ends with `suffix`
fn in_directory<'a>(files: &'a [PathBuf], suffix: &str) -> Vec<&'a Path> {
    files
        .iter()
        .map(PathBuf::as_path)
        .filter(|f| {
            f.parent()
                .and_then(Path::file_name)
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(suffix))
        })
        .collect()
}
