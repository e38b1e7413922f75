//! Flowcell records built from synthetic run directories.

mod common;

use std::path::Path;

use common::{
    chart, demultiplex_report, EventRecorder, RunDir, WarnCounter, BARCODE_HEADER, BC_METRICS,
    FC_DATE, FC_NAME, FILTER_METRICS, RUN_INFO,
};
use seqrun_qc::discovery::DiscoveryError;
use seqrun_qc::parsing::illumina::ChartData;
use seqrun_qc::{
    FlowcellRunMetrics, LaneBarcodeMetrics, Logger, MetricsOutcome, QcConfig, RunRecord,
};

fn flowcell(path: &Path) -> FlowcellRunMetrics {
    FlowcellRunMetrics::with_options(path, FC_DATE, FC_NAME, &QcConfig::default(), Logger::sink())
}

#[test]
fn test_lanes_complete_with_two_lanes_on_disk() {
    let run = RunDir::new();
    run.write("1_120829_AC0UUUACXX.filter_metrics", FILTER_METRICS);
    run.write("nophix/2_120829_AC0UUUACXX_nophix.filter_metrics", FILTER_METRICS);

    let mut fc = flowcell(run.path());
    let outcomes = fc.parse_filter_metrics();

    assert_eq!(fc.lanes.len(), 8);
    assert_eq!(outcomes.len(), 8);
    assert!(outcomes["1"].is_parsed());
    assert!(outcomes["2"].is_parsed());
    assert!(outcomes["3"].is_missing());

    assert_eq!(fc.lanes["1"].filter_metrics.reads, Some(1_000_000));
    assert_eq!(fc.lanes["2"].filter_metrics.reads_aligned, Some(950_000));
    let empty = &fc.lanes["8"].filter_metrics;
    assert_eq!(empty.reads, None);
    assert_eq!(empty.reads_fail_align, None);

    let value: serde_json::Value = serde_json::from_str(&fc.to_json().unwrap()).unwrap();
    for lane in ["1", "2", "3", "4", "5", "6", "7", "8"] {
        assert_eq!(value["lanes"][lane]["lane"], lane);
        assert!(value["lanes"][lane]["filter_metrics"]
            .as_object()
            .unwrap()
            .contains_key("reads_aligned"));
    }
}

#[test]
fn test_bc_metrics_per_lane() {
    let run = RunDir::new();
    run.write("1_120829_AC0UUUACXX.bc_metrics", BC_METRICS);

    let mut fc = flowcell(run.path());
    let outcomes = fc.parse_bc_metrics();

    assert!(outcomes["1"].is_parsed());
    assert_eq!(fc.lanes["1"].bc_metrics.count("1"), Some(500));
    assert_eq!(fc.lanes["1"].bc_metrics.count("2"), Some(300));
    assert_eq!(fc.lanes["2"].bc_metrics, LaneBarcodeMetrics::default());
}

#[test]
fn test_ignored_directories_are_not_searched() {
    let run = RunDir::new();
    run.write("tmp/1_120829_AC0UUUACXX.filter_metrics", FILTER_METRICS);
    run.write("align/tx/1_120829_AC0UUUACXX.bc_metrics", BC_METRICS);

    let mut fc = flowcell(run.path());
    assert!(fc.files().is_empty());
    assert!(fc.parse_filter_metrics()["1"].is_missing());
    assert!(fc.parse_bc_metrics()["1"].is_missing());
}

#[test]
fn test_discovery_is_idempotent() {
    let run = RunDir::new();
    run.write("1_120829_AC0UUUACXX.filter_metrics", FILTER_METRICS);
    run.write("Data/Intensities/BaseCalls/config.xml", "<BaseCallAnalysis/>");

    let mut fc = flowcell(run.path());
    let first = fc.files().to_vec();
    fc.collect_files().unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(fc.files(), first.as_slice());
}

#[test]
fn test_filter_files_without_matches() {
    let run = RunDir::new();
    run.write("1_120829_AC0UUUACXX.filter_metrics", FILTER_METRICS);

    let fc = flowcell(run.path());
    let pattern = regex::Regex::new(r"\.hs_metrics$").unwrap();
    assert!(fc.filter_files(&pattern).is_empty());
}

#[test]
fn test_missing_run_directory() {
    let mut fc = flowcell(Path::new("/nonexistent/120829_AC0UUUACXX"));
    assert!(fc.files().is_empty());
    assert!(matches!(
        fc.collect_files(),
        Err(DiscoveryError::RootNotFound(_))
    ));
    assert!(fc.parse_filter_metrics().values().all(|o| o.is_missing()));
}

#[test]
fn test_run_info_read_at_construction() {
    let run = RunDir::new();
    run.write("RunInfo.xml", RUN_INFO);

    let fc = flowcell(run.path());
    assert_eq!(fc.run_info.instrument.as_deref(), Some("SN0001"));
    assert_eq!(fc.get_flowcell(), Some("C0UUUACXX"));
    assert_eq!(fc.get_full_flowcell(), Some("AC0UUUACXX"));
    assert_eq!(fc.get_date(), Some("120829"));
    assert_eq!(fc.get_run_name().as_deref(), Some("120829_AC0UUUACXX"));
    assert_eq!(fc.name(), "120829_AC0UUUACXX");
}

#[test]
fn test_samplesheet_and_run_info_yaml() {
    let run = RunDir::new();
    run.write("RunInfo.xml", RUN_INFO);
    run.write(
        "0UUUACXX.csv",
        "FCID,Lane,SampleID\nC0UUUACXX,1,P1_101\n",
    );
    run.write(
        "run_info.yaml",
        "- lane: 1\n  description: J_Doe_12_01\n  multiplex:\n    - barcode_id: 1\n      sequence: ACAGTG\n",
    );

    let mut fc = flowcell(run.path());
    assert!(fc.parse_samplesheet_csv().is_parsed());
    assert_eq!(fc.samplesheet_csv.len(), 2);
    assert_eq!(fc.samplesheet_csv[1], vec!["C0UUUACXX", "1", "P1_101"]);

    assert!(fc.parse_run_info_yaml().is_parsed());
    assert_eq!(fc.run_info_yaml[0]["multiplex"][0]["sequence"], "ACAGTG");
}

#[test]
fn test_demultiplex_stats_known_layout_is_quiet() {
    let run = RunDir::new();
    run.write(
        "Unaligned/Basecall_Stats_C0UUUACXX/Demultiplex_Stats.htm",
        &demultiplex_report(&BARCODE_HEADER),
    );

    let warnings = WarnCounter::default();
    let mut fc = flowcell(run.path()).with_logger(warnings.logger());
    assert!(fc.parse_demultiplex_stats_htm().is_parsed());
    assert_eq!(warnings.count(), 0);

    let stats = fc.illumina.demultiplex_stats.as_ref().unwrap();
    assert_eq!(stats.barcode_lane_statistics[0]["Index"], "ACAGTG");
    assert_eq!(stats.sample_information[0]["Sample ID"], "P1_101");
}

#[test]
fn test_demultiplex_stats_drift_warns_once() {
    let run = RunDir::new();
    let mut header = BARCODE_HEADER;
    header[7] = "Yield (Gbases)";
    run.write(
        "Unaligned/Basecall_Stats_C0UUUACXX/Demultiplex_Stats.htm",
        &demultiplex_report(&header),
    );

    let warnings = WarnCounter::default();
    let mut fc = flowcell(run.path()).with_logger(warnings.logger());
    assert!(fc.parse_demultiplex_stats_htm().is_parsed());
    assert_eq!(warnings.count(), 1);

    let stats = fc.illumina.demultiplex_stats.as_ref().unwrap();
    assert_eq!(stats.barcode_lane_statistics[0]["Yield (Gbases)"], "1500");
}

#[test]
fn test_demultiplex_stats_short_row_is_logged() {
    let run = RunDir::new();
    let report = demultiplex_report(&BARCODE_HEADER).replace("<td>36.2</td>", "");
    run.write("Unaligned/Basecall_Stats_C0UUUACXX/Demultiplex_Stats.htm", &report);

    let recorder = EventRecorder::default();
    let mut fc = flowcell(run.path()).with_logger(recorder.logger());
    assert!(fc.parse_demultiplex_stats_htm().is_parsed());
    assert!(recorder.any_event_with(&["data row width differs", "cells=14", "columns=15"]));

    let row = &fc.illumina.demultiplex_stats.as_ref().unwrap().barcode_lane_statistics[0];
    assert_eq!(row.len(), 14);
    assert_eq!(row["Index"], "ACAGTG");
    assert!(!row.contains_key("Mean Quality Score (PF)"));
}

#[test]
fn test_missing_input_warns() {
    let run = RunDir::new();
    let warnings = WarnCounter::default();
    let mut fc = flowcell(run.path()).with_logger(warnings.logger());

    assert!(fc.parse_demultiplex_stats_htm().is_missing());
    assert!(fc.illumina.demultiplex_stats.is_none());
    assert_eq!(warnings.count(), 1);
}

#[test]
fn test_illumina_metrics() {
    let run = RunDir::new();
    run.write("Data/reports/Intensity/Chart_1.xml", &chart("310.5"));
    run.write("Data/reports/Intensity/Chart_2.xml", &chart("NaN"));
    run.write(
        "Data/reports/Summary/read1.xml",
        r#"<Summary Read="1"><Lane key="1" ClustersRaw="250000" /></Summary>"#,
    );
    // RTA output is read even below directories the ignore set prunes
    run.write("Data/log/NumClusters By Lane.xml", r#"<Data><Lane key="1" Count="1" /></Data>"#);

    let mut fc = flowcell(run.path());
    assert!(fc.parse_illumina_metrics(true).is_parsed());

    let illumina = &fc.illumina;
    assert_eq!(illumina.error_rate, Some(ChartData::new()));
    assert_eq!(illumina.fwhm, Some(ChartData::new()));
    let intensity = illumina.intensity.as_ref().unwrap();
    // Five header attributes plus two lanes of two tiles
    assert_eq!(intensity.len(), 5 + 2 * 2);
    assert!(illumina.summary.as_ref().unwrap().contains_key("read1"));
    assert!(illumina.num_clusters.as_ref().unwrap().contains_key("NumClusters By Lane"));

    let value = serde_json::to_value(illumina).unwrap();
    assert!(value["Intensity"]["1_1"]["2"].is_null());
    assert_eq!(value["Intensity"]["1_1"]["1"], 310.5);
}

#[test]
fn test_illumina_bad_family_keeps_the_rest() {
    let run = RunDir::new();
    run.write(
        "Data/reports/Summary/read1.xml",
        r#"<Summary Read="1"><Lane ClustersRaw="250000" /></Summary>"#,
    );
    run.write("Data/reports/NumClusters By Lane.xml", r#"<Data><Lane key="1" Count="1" /></Data>"#);
    run.write("Data/reports/Intensity/Chart_1.xml", &chart("310.5"));
    run.write(
        "Data/reports/FWHM/Chart_1.xml",
        r#"<FlowCellData><Layout NumLanes="8" RowsPerLane="70000" ColsPerLane="70000" /></FlowCellData>"#,
    );

    let warnings = WarnCounter::default();
    let mut fc = flowcell(run.path()).with_logger(warnings.logger());
    match fc.parse_illumina_metrics(true) {
        MetricsOutcome::Failed(err) => {
            let message = err.to_string();
            assert!(message.contains("Summary"));
            assert!(message.contains("FWHM"));
            assert!(!message.contains("Intensity"));
        }
        other => panic!("expected a failure, got {other:?}"),
    }
    assert_eq!(warnings.count(), 1);

    let illumina = &fc.illumina;
    assert!(illumina.summary.is_none());
    assert!(illumina.fwhm.is_none());
    assert!(illumina.num_clusters.as_ref().unwrap().contains_key("NumClusters By Lane"));
    assert_eq!(illumina.intensity.as_ref().unwrap().len(), 5 + 2 * 2);
    assert_eq!(illumina.error_rate, Some(ChartData::new()));
}

#[test]
fn test_illumina_metrics_without_full_rta() {
    let run = RunDir::new();
    run.write("Data/reports/Intensity/Chart_1.xml", &chart("310.5"));

    let mut fc = flowcell(run.path());
    assert!(fc.parse_illumina_metrics(false).is_parsed());
    assert!(fc.illumina.intensity.is_none());
    assert!(fc.illumina.summary.as_ref().unwrap().is_empty());
}

#[test]
fn test_serialized_record() {
    let run = RunDir::new();
    let fc = flowcell(run.path());
    let value: serde_json::Value = serde_json::from_str(&fc.to_json().unwrap()).unwrap();

    assert_eq!(value["_id"], fc.get_db_id());
    assert_eq!(value["entity_type"], "flowcell_run_metrics");
    assert_eq!(value["name"], "120829_AC0UUUACXX");
    assert_eq!(value["RunInfo"]["Flowcell"], FC_NAME);
    assert_eq!(value["RunInfo"]["Instrument"], "NA");
    assert_eq!(value["illumina"], serde_json::json!({}));
    assert!(value["lanes"]["5"]["bc_metrics"]["reads"].is_null());
}
