// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/gripwatch

//! Grip classification - classifier seam, label types, and the linear
//! model artifact loaded per channel

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::{FeatureVector, FEATURE_COUNT};
use crate::config::{ChannelConfig, Config};
use crate::error::{PipelineError, Result};

/// Label attached to each cleaned record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GripLabel {
    Grip,
    None,
}

impl GripLabel {
    /// Classifier output 1 is a grip, anything else is not
    pub fn from_prediction(value: u8) -> Self {
        if value == 1 {
            GripLabel::Grip
        } else {
            GripLabel::None
        }
    }

    /// Spelling used in prediction files
    pub fn as_str(&self) -> &'static str {
        match self {
            GripLabel::Grip => "Saisie",
            GripLabel::None => "null",
        }
    }
}

/// Outcome for one cleaned record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub timestamp: i64,
    pub resistance: i64,
    pub label: GripLabel,
}

impl ClassificationResult {
    pub fn new(timestamp: i64, resistance: i64, label: GripLabel) -> Self {
        Self {
            timestamp,
            resistance,
            label,
        }
    }
}

/// Opaque trained model: one `{0,1}` label per feature row
pub trait Classifier: Send + Sync {
    fn predict_one(&self, features: &FeatureVector) -> u8;

    fn predict(&self, matrix: &[FeatureVector]) -> Vec<u8> {
        matrix.iter().map(|f| self.predict_one(f)).collect()
    }
}

impl<F> Classifier for F
where
    F: Fn(&FeatureVector) -> u8 + Send + Sync,
{
    fn predict_one(&self, features: &FeatureVector) -> u8 {
        self(features)
    }
}

/// Supplies the classifier for a channel, once per aggregation run
pub trait ModelProvider: Send + Sync {
    fn load(&self, channel: &ChannelConfig) -> Result<Box<dyn Classifier>>;
}

impl<F> ModelProvider for F
where
    F: Fn(&ChannelConfig) -> Result<Box<dyn Classifier>> + Send + Sync,
{
    fn load(&self, channel: &ChannelConfig) -> Result<Box<dyn Classifier>> {
        self(channel)
    }
}

/// Linear decision function over the feature vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearClassifier {
    pub weights: [f64; FEATURE_COUNT],
    pub bias: f64,
}

impl LinearClassifier {
    pub fn new(weights: [f64; FEATURE_COUNT], bias: f64) -> Self {
        Self { weights, bias }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn score(&self, features: &FeatureVector) -> f64 {
        self.weights
            .iter()
            .zip(features.as_array())
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.bias
    }
}

impl Classifier for LinearClassifier {
    fn predict_one(&self, features: &FeatureVector) -> u8 {
        u8::from(self.score(features) > 0.0)
    }
}

/// Loads each channel's `model_file` as a JSON [`LinearClassifier`]
pub struct JsonModelProvider {
    config: Arc<Config>,
}

impl JsonModelProvider {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

impl ModelProvider for JsonModelProvider {
    fn load(&self, channel: &ChannelConfig) -> Result<Box<dyn Classifier>> {
        let path = self.config.resolve(&channel.model_file);
        let model = LinearClassifier::load(&path).map_err(|e| PipelineError::MissingSinkOrModel {
            channel: channel.id,
            reason: format!("model {:?}: {}", path, e),
        })?;
        debug!("Channel {}: loaded model from {:?}", channel.id, path);
        Ok(Box::new(model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_mapping() {
        assert_eq!(GripLabel::from_prediction(1), GripLabel::Grip);
        assert_eq!(GripLabel::from_prediction(0), GripLabel::None);
        assert_eq!(GripLabel::from_prediction(2), GripLabel::None);
        assert_eq!(GripLabel::Grip.as_str(), "Saisie");
    }

    #[test]
    fn test_linear_classifier_decision() {
        // Grip when resistance drops under 400
        let model = LinearClassifier::new([-1.0, 0.0, 0.0, 0.0, 0.0], 400.0);
        let low = FeatureVector {
            resistance: 300.0,
            ..Default::default()
        };
        let high = FeatureVector {
            resistance: 500.0,
            ..Default::default()
        };
        assert_eq!(model.predict(&[low, high]), vec![1, 0]);
    }

    #[test]
    fn test_json_provider_reports_missing_model() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.data_dir = dir.path().to_path_buf();
        let provider = JsonModelProvider::new(Arc::new(config.clone()));

        let err = provider.load(&config.channels[0]).err().unwrap();
        assert!(matches!(err, PipelineError::MissingSinkOrModel { channel: 1, .. }));

        LinearClassifier::new([0.0, 0.0, 0.0, 1.0, 0.0], 0.0)
            .save(&dir.path().join("sensor_model_s1.json"))
            .unwrap();
        assert!(provider.load(&config.channels[0]).is_ok());
    }

    #[test]
    fn test_closure_classifier() {
        let rising = |f: &FeatureVector| u8::from(f.resistance_diff > 0.0);
        let up = FeatureVector {
            resistance_diff: 2.0,
            ..Default::default()
        };
        assert_eq!(rising.predict(&[up, FeatureVector::default()]), vec![1, 0]);
    }
}
