//! End-to-end acquisition and classification runs against temp directories

use std::sync::Arc;

use gripwatch::analysis::{BatchCleaner, CleanedRecord, FeatureEngine};
use gripwatch::config::{ChannelConfig, Config};
use gripwatch::core::{AcquisitionLoop, AcquisitionState, RunContext, ShutdownSignal, StopReason};
use gripwatch::detection::{ClassificationAggregator, Classifier, LinearClassifier};
use gripwatch::sensors::{Batch, ReaderSource, Reading, ScriptedSource, SensorSimulator};
use gripwatch::streaming::read_sink;
use gripwatch::Result;

fn config_in(dir: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.data_dir = dir.to_path_buf();
    config
}

fn sink_of(config: &Config, id: u32) -> Vec<CleanedRecord> {
    let channel = config.channels.iter().find(|c| c.id == id).unwrap();
    read_sink(id, &config.resolve(&channel.data_file)).unwrap()
}

#[test]
fn test_duplicate_timestamp_dropped_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let source = ScriptedSource::from_lines(["1,10.0,100.0", "1,10.0,999.0", "1,11.0,101.0"]);

    let report = AcquisitionLoop::new(RunContext::from_config(&config))
        .run(|| Ok(source))
        .unwrap();

    assert_eq!(report.counters.accepted, 3);
    assert_eq!(
        sink_of(&config, 1),
        vec![CleanedRecord::new(10, 100), CleanedRecord::new(11, 101)]
    );
    for id in 2..=5 {
        assert!(sink_of(&config, id).is_empty());
    }
}

#[test]
fn test_replay_of_captured_log() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let log = dir.path().join("capture.log");
    std::fs::write(&log, "2,1.0,300.4\r\nnoise\n2,2.0,301.9\n7,3.0,1.0\n").unwrap();

    let report = AcquisitionLoop::new(RunContext::from_config(&config))
        .run(|| {
            let file = std::fs::File::open(&log)?;
            Ok(ReaderSource::new("capture", std::io::BufReader::new(file)))
        })
        .unwrap();

    assert!(matches!(report.stop_reason, StopReason::ConnectionLost(_)));
    assert_eq!((report.counters.malformed, report.counters.unknown_channel), (1, 1));
    assert_eq!(
        sink_of(&config, 2),
        vec![CleanedRecord::new(1, 300), CleanedRecord::new(2, 301)]
    );
}

#[test]
fn test_outlier_excluded_from_batch() {
    let mut readings: Vec<Reading> = (0..19)
        .map(|i| Reading::new(4, i as f64, 100.0 + (i % 3) as f64))
        .collect();
    readings.push(Reading::new(4, 19.0, 1000.0));

    let cleaned = BatchCleaner::default().clean(Batch::new(4, readings));

    assert_eq!(cleaned.len(), 19);
    assert!(cleaned.iter().all(|r| r.resistance < 1000));
}

#[test]
fn test_missing_sink_counts_zero() {
    let dir = tempfile::tempdir().unwrap();
    let config = Arc::new(config_in(dir.path()));
    let always_grip = |_: &ChannelConfig| -> Result<Box<dyn Classifier>> {
        Ok(Box::new(LinearClassifier::new([0.0; 5], 1.0)))
    };

    let report = ClassificationAggregator::new(config).run(&always_grip);

    assert_eq!(report.total_grips(), 0);
    assert!(report.summaries.values().all(|s| s.grip_count == 0));
    let distribution = report.distribution();
    assert!(distribution.shares.values().all(|s| s.percentage == 0.0));
}

#[test]
fn test_stop_signal_present_before_start() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let ctx = RunContext::from_config(&config);
    ctx.shutdown_signal().request().unwrap();
    assert!(config.shutdown_signal_path().exists());

    let report = AcquisitionLoop::new(ctx)
        .run(|| Ok(ScriptedSource::from_lines(["1,1.0,1.0"])))
        .unwrap();

    assert_eq!(report.stop_reason, StopReason::ShutdownSignal);
    assert_eq!(
        report.transitions,
        vec![
            AcquisitionState::Idle,
            AcquisitionState::Running,
            AcquisitionState::Draining,
            AcquisitionState::Closed
        ]
    );
    assert_eq!(report.total_written(), 0);
    assert!(!config.shutdown_signal_path().exists());
}

#[test]
fn test_feature_sequence() {
    let records = [
        CleanedRecord::new(0, 100),
        CleanedRecord::new(1, 102),
        CleanedRecord::new(2, 101),
    ];
    let features = FeatureEngine::compute(5, &records);

    let diffs: Vec<f64> = features.iter().map(|f| f.resistance_diff).collect();
    let energy: Vec<f64> = features.iter().map(|f| f.energy).collect();
    assert_eq!(diffs, vec![0.0, 2.0, -1.0]);
    assert_eq!(energy, vec![0.0, 4.0, 5.0]);
}

#[test]
fn test_simulated_session_then_classify() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let source = SensorSimulator::seeded(&config.channel_ids(), 7)
        .with_limit(2_000)
        .with_glitch_probability(0.02);

    let report = AcquisitionLoop::new(RunContext::from_config(&config))
        .run(|| Ok(source))
        .unwrap();
    assert!(matches!(report.stop_reason, StopReason::ConnectionLost(_)));
    assert!(report.total_written() > 0);
    assert_eq!(report.counters.accepted + report.counters.dropped(), report.counters.lines);

    // Every channel got a model; a second run reuses the same sinks
    for channel in &config.channels {
        LinearClassifier::new([-1.0, 0.0, 0.0, 0.0, 0.0], 0.0)
            .save(&config.resolve(&channel.model_file))
            .unwrap();
    }
    let config = Arc::new(config);
    let provider = gripwatch::detection::JsonModelProvider::new(Arc::clone(&config));
    let summary = ClassificationAggregator::new(Arc::clone(&config))
        .with_export(false)
        .run(&provider);

    for s in summary.summaries.values() {
        assert!(s.skipped.is_none(), "channel {} skipped: {:?}", s.sensor_id, s.skipped);
        assert_eq!(s.grip_count, 0);
        assert_eq!(s.records, sink_of(&config, s.sensor_id).len());
    }
}
