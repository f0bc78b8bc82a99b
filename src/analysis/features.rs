// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/gripwatch

//! Time-domain features over a cleaned channel stream

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::{CleanedRecord, StatisticalSummary};

/// Number of features handed to a classifier
pub const FEATURE_COUNT: usize = 5;

/// Features derived for one cleaned record
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub resistance: f64,
    pub rolling_mean: f64,
    pub rolling_std: f64,
    pub resistance_diff: f64,
    pub energy: f64,
}

impl FeatureVector {
    /// Values in classifier column order
    pub fn as_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.resistance,
            self.rolling_mean,
            self.rolling_std,
            self.resistance_diff,
            self.energy,
        ]
    }
}

/// Single-pass, order-dependent feature derivation.
///
/// Energy is a running sum from the first record the engine saw, so a
/// stream must be fed left to right. To continue a stream in a later run
/// without replaying it, use [`FeatureEngine::resume`] with the tail of
/// the stream and the last energy value.
#[derive(Debug, Clone)]
pub struct FeatureEngine {
    window: usize,
    recent: VecDeque<f64>,
    previous: Option<CleanedRecord>,
    energy: f64,
}

impl FeatureEngine {
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            window,
            recent: VecDeque::with_capacity(window),
            previous: None,
            energy: 0.0,
        }
    }

    /// Continue after `tail` (the latest records of the stream, oldest
    /// first) with the energy accumulated up to its last record
    pub fn resume(window: usize, tail: &[CleanedRecord], energy: f64) -> Self {
        let mut engine = Self::new(window);
        let skip = tail.len().saturating_sub(engine.window);
        engine
            .recent
            .extend(tail[skip..].iter().map(|r| r.resistance as f64));
        engine.previous = tail.last().copied();
        engine.energy = energy;
        engine
    }

    /// Energy accumulated so far
    pub fn energy(&self) -> f64 {
        self.energy
    }

    /// Derive the features of the next record in the stream
    pub fn push(&mut self, record: &CleanedRecord) -> FeatureVector {
        let resistance = record.resistance as f64;

        let resistance_diff = match self.previous {
            Some(prev) => {
                // Sink timestamps may sit at the i64 extremes
                let dt = record.timestamp as f64 - prev.timestamp as f64;
                if dt == 0.0 {
                    0.0
                } else {
                    (resistance - prev.resistance as f64) / dt
                }
            }
            None => 0.0,
        };
        self.energy += resistance_diff * resistance_diff;

        if self.recent.len() == self.window {
            self.recent.pop_front();
        }
        self.recent.push_back(resistance);
        let window: Vec<f64> = self.recent.iter().copied().collect();
        let stats = StatisticalSummary::of(&window);

        self.previous = Some(*record);

        FeatureVector {
            resistance,
            rolling_mean: stats.mean,
            rolling_std: stats.std_dev,
            resistance_diff,
            energy: self.energy,
        }
    }

    /// Features for a whole channel stream, from its start
    pub fn compute(window: usize, records: &[CleanedRecord]) -> Vec<FeatureVector> {
        let mut engine = Self::new(window);
        records.iter().map(|r| engine.push(r)).collect()
    }
}
