// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/gripwatch

//! Preparation of state-labelled recordings for offline model fitting

use tracing::info;

use super::{dedup_by_timestamp, filter_by_sigma, reconcile_transitions, LabeledRow};
use crate::config::CleaningConfig;

/// How raw training rows are normalised before cleaning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingPrep {
    /// Subtracted from every timestamp (epoch of the recording)
    pub time_offset: f64,
    pub sigma_limit: f64,
    pub transition_tolerance: f64,
}

impl TrainingPrep {
    pub fn new(cleaning: &CleaningConfig, time_offset: f64) -> Self {
        Self {
            time_offset,
            sigma_limit: cleaning.sigma_limit,
            transition_tolerance: cleaning.transition_tolerance,
        }
    }

    /// Offset and round to one decimal, dedup, sigma filter, then
    /// reconcile noisy transitions against the pre-filter mean
    pub fn run(&self, rows: Vec<LabeledRow>) -> Vec<LabeledRow> {
        let received = rows.len();
        let normalised: Vec<LabeledRow> = rows
            .into_iter()
            .map(|row| {
                LabeledRow::new(
                    round_tenth(row.timestamp - self.time_offset),
                    round_tenth(row.resistance),
                    row.state,
                )
            })
            .collect();

        let unique = dedup_by_timestamp(normalised, |r| r.timestamp);
        let deduped = unique.len();
        let (filtered, stats) = filter_by_sigma(unique, |r| r.resistance, self.sigma_limit);
        let kept = filtered.len();
        let cleaned = reconcile_transitions(&filtered, &stats, self.transition_tolerance);

        info!(
            "Training rows: {} received, {} unique, {} within {} sigma, {} after transition reconciliation",
            received,
            deduped,
            kept,
            self.sigma_limit,
            cleaned.len()
        );

        cleaned
    }
}

// Decimal rounding of the exact binary value, ties to even
fn round_tenth(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{:.1}", value).parse().unwrap_or(value)
}
