// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/gripwatch

//! Detection module - per-channel grip classification and aggregation

mod classification;
mod distribution;

pub use classification::*;
pub use distribution::*;

use std::collections::BTreeMap;
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::analysis::{CleanedRecord, FeatureEngine};
use crate::config::{ChannelConfig, Config};
use crate::error::{PipelineError, Result};
use crate::sensors::ChannelId;
use crate::streaming::{read_sink, write_predictions};

/// Grip count for one channel over a completed sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSummary {
    pub sensor_id: ChannelId,
    pub label: String,
    pub grip_count: usize,
    pub records: usize,
    /// Why the channel contributed nothing, if it did not
    pub skipped: Option<String>,
}

impl ChannelSummary {
    pub fn zero(sensor_id: ChannelId, label: &str, skipped: Option<String>) -> Self {
        Self {
            sensor_id,
            label: label.to_string(),
            grip_count: 0,
            records: 0,
            skipped,
        }
    }
}

/// Summaries of every configured channel, ordered by channel id
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregationReport {
    pub summaries: BTreeMap<ChannelId, ChannelSummary>,
}

impl AggregationReport {
    pub fn total_grips(&self) -> usize {
        self.summaries.values().map(|s| s.grip_count).sum()
    }

    pub fn distribution(&self) -> GripDistribution {
        GripDistribution::from_summaries(self.summaries.values())
    }
}

/// Features, labels, and results for one channel stream
pub fn classify_records(
    records: &[CleanedRecord],
    window: usize,
    classifier: &dyn Classifier,
) -> Result<Vec<ClassificationResult>> {
    let features = FeatureEngine::compute(window, records);
    let labels = classifier.predict(&features);
    if labels.len() != records.len() {
        return Err(PipelineError::Config(format!(
            "classifier returned {} labels for {} records",
            labels.len(),
            records.len()
        )));
    }

    Ok(records
        .iter()
        .zip(labels)
        .map(|(r, label)| {
            ClassificationResult::new(r.timestamp, r.resistance, GripLabel::from_prediction(label))
        })
        .collect())
}

/// Runs the classifier over every channel's sink and counts grips.
///
/// Channels are independent and evaluated in parallel. A channel whose
/// sink or model is missing reports a zero count; the others are
/// unaffected.
pub struct ClassificationAggregator {
    config: Arc<Config>,
    export_predictions: bool,
}

impl ClassificationAggregator {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            export_predictions: true,
        }
    }

    /// Also write each channel's labelled records to its prediction file
    pub fn with_export(mut self, enabled: bool) -> Self {
        self.export_predictions = enabled;
        self
    }

    pub fn run(&self, models: &dyn ModelProvider) -> AggregationReport {
        let summaries = self
            .config
            .channels
            .par_iter()
            .map(|channel| (channel.id, self.summarize_channel(channel, models)))
            .collect::<BTreeMap<_, _>>();

        let report = AggregationReport { summaries };
        info!(
            "Classification finished: {} grips across {} channels",
            report.total_grips(),
            report.summaries.len()
        );
        report
    }

    fn summarize_channel(&self, channel: &ChannelConfig, models: &dyn ModelProvider) -> ChannelSummary {
        match self.classify_channel(channel, models) {
            Ok(summary) => summary,
            Err(e) => {
                warn!("Channel {} ({}) skipped: {}", channel.id, channel.label, e);
                ChannelSummary::zero(channel.id, &channel.label, Some(e.to_string()))
            }
        }
    }

    fn classify_channel(&self, channel: &ChannelConfig, models: &dyn ModelProvider) -> Result<ChannelSummary> {
        let sink_path = self.config.resolve(&channel.data_file);
        let records = read_sink(channel.id, &sink_path)?;
        if records.is_empty() {
            return Err(PipelineError::MissingSinkOrModel {
                channel: channel.id,
                reason: format!("sink {:?} has no records", sink_path),
            });
        }

        let classifier = models.load(channel)?;
        let results = classify_records(&records, self.config.features.rolling_window, classifier.as_ref())?;
        let grip_count = results.iter().filter(|r| r.label == GripLabel::Grip).count();

        if self.export_predictions {
            let path = self.config.resolve(&channel.prediction_file);
            if let Err(e) = write_predictions(&path, &results) {
                warn!("Channel {}: could not write predictions to {:?}: {}", channel.id, path, e);
            }
        }

        info!(
            "Channel {} ({}): {} grips in {} records",
            channel.id,
            channel.label,
            grip_count,
            records.len()
        );

        Ok(ChannelSummary {
            sensor_id: channel.id,
            label: channel.label.clone(),
            grip_count,
            records: records.len(),
            skipped: None,
        })
    }
}
