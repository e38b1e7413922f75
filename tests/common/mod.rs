//! Shared fixtures for the record integration tests.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use seqrun_qc::Logger;
use tempfile::TempDir;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

pub const FC_DATE: &str = "120829";
pub const FC_NAME: &str = "AC0UUUACXX";

pub const FILTER_METRICS: &str = "Reads: 1000000\n\
Reads Aligned: 950000 (95.0%)\n\
Reads Fail Align: 50000 (5.0%)\n";

pub const BC_METRICS: &str = "1\t500\n2\t300\nunmatched\t25\n";

pub const ALIGN_METRICS: &str = "## net.sf.picard.metrics.StringHeader
# net.sf.picard.analysis.CollectAlignmentSummaryMetrics INPUT=1_120829_AC0UUUACXX_1-sort.bam
## net.sf.picard.metrics.StringHeader
# Started on: Wed Aug 29 10:00:00 CEST 2012

## METRICS CLASS\tnet.sf.picard.analysis.AlignmentSummaryMetrics
CATEGORY\tTOTAL_READS\tPF_READS
FIRST_OF_PAIR\t1000\t990
SECOND_OF_PAIR\t1000\t985
PAIR\t2000\t1975

";

pub const DUP_METRICS: &str = "# net.sf.picard.sam.MarkDuplicates INPUT=[x.bam]
## METRICS CLASS\tnet.sf.picard.sam.DuplicationMetrics
LIBRARY\tREAD_PAIRS_EXAMINED\tPERCENT_DUPLICATION
lib1\t1000\t0.05

## HISTOGRAM\tjava.lang.Double
BIN\tVALUE
1.0\t1.0
2.0\t1.9

";

pub const FASTQ_SCREEN: &str = "Library\tUnmapped\tMapped_One_Library\tMapped_Multiple_Libraries
Human\t5.2\t90.1\t4.7
PhiX\t99.9\t0.1\t0.0
";

pub const FASTQC_DATA: &str = "##FastQC\t0.10.1
>>Basic Statistics\tpass
#Measure\tValue
Filename\t1_120829_AC0UUUACXX_1_1.fastq
Total Sequences\t1000000
>>END_MODULE
";

pub const RUN_INFO: &str = r#"<?xml version="1.0"?>
<RunInfo Version="2">
  <Run Id="120829_SN0001_0123_AC0UUUACXX" Number="123">
    <Flowcell>C0UUUACXX</Flowcell>
    <Instrument>SN0001</Instrument>
    <Date>120829</Date>
    <Reads>
      <Read Number="1" NumCycles="101" IsIndexedRead="N" />
    </Reads>
    <FlowcellLayout LaneCount="8" SurfaceCount="2" SwathCount="3" TileCount="16" />
  </Run>
</RunInfo>
"#;

pub const BARCODE_HEADER: [&str; 15] = [
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
    "% of &gt;= Q30 Bases (PF)",
    "Mean Quality Score (PF)",
];

/// A `Demultiplex_Stats.htm` document with the given barcode header
pub fn demultiplex_report(bc_header: &[&str]) -> String {
    let th: String = bc_header.iter().map(|h| format!("<th>{h}</th>")).collect();
    format!(
        r#"<html><body>
<h2>Barcode lane statistics</h2>
<div><table><tr>{th}</tr></table></div>
<div><table>
<tr><td>1</td><td>P1_101</td><td>hg19</td><td>ACAGTG</td><td></td><td>N</td><td>J_Doe_12_01</td><td>1500</td><td>90.5</td><td>15,000,000</td><td>25.1</td><td>98.1</td><td>1.9</td><td>89.0</td><td>36.2</td></tr>
</table></div>
<h2>Sample information</h2>
<div><table><tr><th>Sample<p></p>ID</th><th>Recipe</th><th>Operator</th><th>Directory</th></tr></table></div>
<div><table>
<tr><td>P1_101</td><td>R1</td><td>JD</td><td>/proj/J_Doe_12_01/Sample_P1_101</td></tr>
</table></div>
</body></html>"#
    )
}

/// A per-tile chart document for a two-lane, two-tile layout
pub fn chart(value: &str) -> String {
    format!(
        r#"<FlowCellData Name="Intensity" Type="Tile">
  <Layout NumLanes="2" RowsPerLane="1" ColsPerLane="2" />
  <TL Key="1_1" Val="{value}" />
</FlowCellData>"#
    )
}

/// A throwaway run directory
pub struct RunDir {
    dir: TempDir,
}

impl RunDir {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `content` to `relative`, creating parent directories
    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
        path
    }
}

/// Counts `WARN` events seen by the subscriber it is attached to
#[derive(Clone, Default)]
pub struct WarnCounter {
    count: Arc<AtomicUsize>,
}

impl WarnCounter {
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// A logger handle whose events are counted here
    pub fn logger(&self) -> Logger {
        let subscriber = tracing_subscriber::registry().with(self.clone());
        Logger::from_dispatch(tracing::Dispatch::new(subscriber))
    }
}

impl<S: Subscriber> Layer<S> for WarnCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::WARN {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Records the fields of every event as `name=value` text, at any level
#[derive(Clone, Default)]
pub struct EventRecorder {
    events: Arc<Mutex<Vec<String>>>,
}

impl EventRecorder {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    /// True if one event's text contains every one of `parts`
    pub fn any_event_with(&self, parts: &[&str]) -> bool {
        self.events()
            .iter()
            .any(|event| parts.iter().all(|part| event.contains(part)))
    }

    pub fn logger(&self) -> Logger {
        let subscriber = tracing_subscriber::registry().with(self.clone());
        Logger::from_dispatch(tracing::Dispatch::new(subscriber))
    }
}

struct FieldText(String);

impl Visit for FieldText {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.0.push_str(&format!("{}={:?} ", field.name(), value));
    }
}

impl<S: Subscriber> Layer<S> for EventRecorder {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut text = FieldText(String::new());
        event.record(&mut text);
        self.events.lock().unwrap().push(text.0);
    }
}
