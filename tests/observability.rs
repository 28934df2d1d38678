use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use tabular_docs::pipeline::{
    convert_path, CompositeObserver, ConversionContext, ConversionObserver, ConversionPipeline, ConversionSeverity,
    ConversionStats, ConvertOptions, FileObserver, PipelineOptions, RunPhase,
};
use tabular_docs::sink::{FnSink, VecSink};
use tabular_docs::source::GridSource;
use tabular_docs::types::Document;
use tabular_docs::ConversionError;

#[derive(Default)]
struct RecordingObserver {
    phases: Mutex<Vec<RunPhase>>,
    successes: Mutex<Vec<usize>>,
    failures: Mutex<Vec<ConversionSeverity>>,
    alerts: Mutex<Vec<ConversionSeverity>>,
    labels: Mutex<Vec<String>>,
}

impl ConversionObserver for RecordingObserver {
    fn on_phase(&self, ctx: &ConversionContext, phase: RunPhase) {
        self.labels.lock().unwrap().push(ctx.label.clone());
        self.phases.lock().unwrap().push(phase);
    }

    fn on_success(&self, _ctx: &ConversionContext, stats: ConversionStats) {
        self.successes.lock().unwrap().push(stats.documents);
    }

    fn on_failure(&self, _ctx: &ConversionContext, severity: ConversionSeverity, _error: &ConversionError) {
        self.failures.lock().unwrap().push(severity);
    }

    fn on_alert(&self, _ctx: &ConversionContext, severity: ConversionSeverity, _error: &ConversionError) {
        self.alerts.lock().unwrap().push(severity);
    }
}

fn pipeline_with(obs: Arc<RecordingObserver>, alert_at_or_above: ConversionSeverity) -> ConversionPipeline {
    ConversionPipeline::new(PipelineOptions {
        label: Some("people".to_string()),
        observer: Some(obs),
        alert_at_or_above,
        ..Default::default()
    })
}

fn tmp_file(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("tabular-docs-{name}-{nanos}.log"))
}

#[test]
fn successful_run_reports_phases_in_order() {
    let obs = Arc::new(RecordingObserver::default());
    let src = GridSource::from_rows(["a"], [["1"], ["2"]]);
    let mut sink = VecSink::new();

    pipeline_with(obs.clone(), ConversionSeverity::Critical)
        .run(&src, &mut sink)
        .unwrap();

    assert_eq!(
        *obs.phases.lock().unwrap(),
        vec![RunPhase::InferringTypes, RunPhase::ConvertingRows, RunPhase::Completed]
    );
    assert_eq!(*obs.successes.lock().unwrap(), vec![2]);
    assert!(obs.failures.lock().unwrap().is_empty());
    assert!(obs.labels.lock().unwrap().iter().all(|l| l == "people"));
}

#[test]
fn parse_failure_is_error_severity_without_alert() {
    let obs = Arc::new(RecordingObserver::default());
    let src = GridSource::from_rows(["a"], [[""]]);
    let mut sink = VecSink::new();

    let _ = pipeline_with(obs.clone(), ConversionSeverity::Critical)
        .run(&src, &mut sink)
        .unwrap_err();

    assert_eq!(
        *obs.phases.lock().unwrap(),
        vec![RunPhase::InferringTypes, RunPhase::ConvertingRows, RunPhase::Failed]
    );
    assert_eq!(*obs.failures.lock().unwrap(), vec![ConversionSeverity::Error]);
    assert!(obs.alerts.lock().unwrap().is_empty());
}

#[test]
fn sink_failure_is_critical_and_alerts() {
    let obs = Arc::new(RecordingObserver::default());
    let src = GridSource::from_rows(["a"], [["1"]]);
    let mut sink = FnSink::new(|_doc: Document| Err(io::Error::other("connection reset")));

    let _ = pipeline_with(obs.clone(), ConversionSeverity::Critical)
        .run(&src, &mut sink)
        .unwrap_err();

    assert_eq!(*obs.failures.lock().unwrap(), vec![ConversionSeverity::Critical]);
    assert_eq!(*obs.alerts.lock().unwrap(), vec![ConversionSeverity::Critical]);
}

#[test]
fn lower_alert_threshold_alerts_on_parse_errors() {
    let obs = Arc::new(RecordingObserver::default());
    let src = GridSource::from_rows(["a"], [[""]]);
    let mut sink = VecSink::new();

    let _ = pipeline_with(obs.clone(), ConversionSeverity::Error)
        .run(&src, &mut sink)
        .unwrap_err();

    assert_eq!(*obs.alerts.lock().unwrap(), vec![ConversionSeverity::Error]);
}

#[test]
fn open_failures_are_reported_with_the_path_label() {
    let obs = Arc::new(RecordingObserver::default());
    let opts = ConvertOptions {
        pipeline: PipelineOptions {
            observer: Some(obs.clone()),
            ..Default::default()
        },
        ..Default::default()
    };
    let mut sink = VecSink::new();

    // Missing file -> csv io error -> Critical
    let _ = convert_path("tests/fixtures/does_not_exist.csv", &mut sink, &opts).unwrap_err();

    assert!(obs.phases.lock().unwrap().is_empty());
    assert_eq!(*obs.failures.lock().unwrap(), vec![ConversionSeverity::Critical]);
    assert_eq!(*obs.alerts.lock().unwrap(), vec![ConversionSeverity::Critical]);
}

#[test]
fn file_observer_appends_outcome_lines() {
    let log = tmp_file("observer");
    let src = GridSource::from_rows(["a"], [["1"]]);
    let mut sink = VecSink::new();

    ConversionPipeline::new(PipelineOptions {
        label: Some("grid".to_string()),
        observer: Some(Arc::new(FileObserver::new(&log))),
        ..Default::default()
    })
    .run(&src, &mut sink)
    .unwrap();

    let text = std::fs::read_to_string(&log).unwrap();
    assert!(text.contains("phase=InferringTypes source=grid"));
    assert!(text.contains("ok source=grid rows=2 columns=1 documents=1"));
    let _ = std::fs::remove_file(&log);
}

#[test]
fn composite_observer_fans_out_to_every_observer() {
    let first = Arc::new(RecordingObserver::default());
    let second = Arc::new(RecordingObserver::default());
    let composite = CompositeObserver::new().with(first.clone()).with(second.clone());
    assert_eq!(composite.len(), 2);

    let src = GridSource::from_rows(["a"], [["1"], ["2"]]);
    let mut sink = FnSink::new(|doc: Document| match doc.id() {
        Some(2) => Err(io::Error::other("quota exceeded")),
        _ => Ok(()),
    });
    let _ = ConversionPipeline::new(PipelineOptions {
        label: Some("fanout".to_string()),
        observer: Some(Arc::new(composite)),
        ..Default::default()
    })
    .run(&src, &mut sink)
    .unwrap_err();

    for obs in [&first, &second] {
        assert_eq!(
            *obs.phases.lock().unwrap(),
            vec![RunPhase::InferringTypes, RunPhase::ConvertingRows, RunPhase::Failed]
        );
        assert_eq!(*obs.failures.lock().unwrap(), vec![ConversionSeverity::Critical]);
        assert_eq!(*obs.alerts.lock().unwrap(), vec![ConversionSeverity::Critical]);
        assert!(obs.labels.lock().unwrap().iter().all(|l| l == "fanout"));
    }
}

#[test]
fn file_observer_logs_the_failing_cell() {
    let log = tmp_file("failure");
    let src = GridSource::from_rows(["Name", "Zip"], [["Ann", "02139"], ["Bo", ""]]);
    let mut sink = VecSink::new();

    let _ = ConversionPipeline::new(PipelineOptions {
        label: Some("zips".to_string()),
        observer: Some(Arc::new(FileObserver::new(&log))),
        alert_at_or_above: ConversionSeverity::Error,
        ..Default::default()
    })
    .run(&src, &mut sink)
    .unwrap_err();

    let text = std::fs::read_to_string(&log).unwrap();
    assert!(text.contains("phase=Failed source=zips"));
    assert!(text.contains("failed severity=Error source=zips row=3 column=2 header='Zip'"));
    assert!(text.contains("ALERT severity=Error source=zips row=3 column=2 header='Zip'"));
    let _ = std::fs::remove_file(&log);
}
