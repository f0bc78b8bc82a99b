//! Export of prediction results and training recordings

use std::path::Path;

use tracing::{info, warn};

use crate::analysis::LabeledRow;
use crate::detection::ClassificationResult;
use crate::error::{PipelineError, Result};

/// Header of a per-channel prediction file
pub const PREDICTION_HEADER: [&str; 3] = ["Timestamp", "Resistance", "PredictionLabel"];

/// Default header of a training recording
pub const TRAINING_HEADER: [&str; 3] = ["Timestamp", "Resistance", "ButtonState"];

/// Write one channel's classification results, replacing any previous file
pub fn write_predictions(path: &Path, results: &[ClassificationResult]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(PREDICTION_HEADER)?;
    for result in results {
        writer.write_record(&[
            result.timestamp.to_string(),
            result.resistance.to_string(),
            result.label.as_str().to_string(),
        ])?;
    }
    writer.flush()?;

    info!("Wrote {} predictions to {:?}", results.len(), path);
    Ok(())
}

/// A training recording: its header line and the labelled rows
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingRecording {
    pub headers: Vec<String>,
    pub rows: Vec<LabeledRow>,
}

/// Read `Timestamp,Resistance,ButtonState` rows. Empty lines are ignored;
/// a row that does not parse is an error, as the recording is unusable.
pub fn read_training_rows(path: &Path) -> Result<TrainingRecording> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = reader.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        let field = |i: usize| -> Result<f64> {
            let raw = record.get(i).unwrap_or("").trim();
            raw.parse::<f64>().map_err(|e| PipelineError::MalformedLine {
                line: record.iter().collect::<Vec<_>>().join(","),
                reason: format!("row {} column {}: {}", index + 1, i, e),
            })
        };
        let state = field(2)?;
        rows.push(LabeledRow::new(field(0)?, field(1)?, state.trunc() as u8));
    }

    if rows.is_empty() {
        warn!("Training recording {:?} has no rows", path);
    }
    Ok(TrainingRecording { headers, rows })
}

/// Write a training recording with its original header
pub fn write_training_rows(path: &Path, recording: &TrainingRecording) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    if recording.headers.is_empty() {
        writer.write_record(TRAINING_HEADER)?;
    } else {
        writer.write_record(&recording.headers)?;
    }
    for row in &recording.rows {
        writer.write_record(&[
            row.timestamp.to_string(),
            row.resistance.to_string(),
            row.state.to_string(),
        ])?;
    }
    writer.flush()?;
    info!("Wrote {} training rows to {:?}", recording.rows.len(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::GripLabel;

    #[test]
    fn test_prediction_file_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.csv");
        write_predictions(
            &path,
            &[
                ClassificationResult::new(1, 500, GripLabel::None),
                ClassificationResult::new(2, 300, GripLabel::Grip),
            ],
        )
        .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "Timestamp,Resistance,PredictionLabel\n1,500,null\n2,300,Saisie\n"
        );
    }

    #[test]
    fn test_training_rows_roundtrip_header() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.csv");
        std::fs::write(&input, "Time,R,State\n1.5,200.25,1\n\n2.0,201,0.0\n").unwrap();

        let recording = read_training_rows(&input).unwrap();
        assert_eq!(recording.headers, vec!["Time", "R", "State"]);
        assert_eq!(
            recording.rows,
            vec![LabeledRow::new(1.5, 200.25, 1), LabeledRow::new(2.0, 201.0, 0)]
        );

        let output = dir.path().join("out.csv");
        write_training_rows(&output, &recording).unwrap();
        let content = std::fs::read_to_string(&output).unwrap();
        assert!(content.starts_with("Time,R,State\n1.5,200.25,1\n"));
    }

    #[test]
    fn test_training_rows_reject_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.csv");
        std::fs::write(&input, "Timestamp,Resistance,ButtonState\n1,abc,0\n").unwrap();
        assert!(matches!(
            read_training_rows(&input),
            Err(PipelineError::MalformedLine { .. })
        ));
    }
}
