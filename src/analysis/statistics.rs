//! Descriptive statistics shared by cleaning and feature derivation

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Mean and population spread of a sample
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatisticalSummary {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
}

impl StatisticalSummary {
    /// Population statistics (divide by `n`); an empty sample yields zeros
    pub fn of(data: &[f64]) -> Self {
        if data.is_empty() {
            return Self::default();
        }

        let mean = data.iter().mean();
        let std_dev = if data.len() > 1 {
            data.iter().population_std_dev()
        } else {
            0.0
        };

        Self {
            count: data.len(),
            mean,
            std_dev,
        }
    }

    /// Whether `value` lies within `sigmas` standard deviations of the mean, bounds included
    pub fn within(&self, value: f64, sigmas: f64) -> bool {
        (value - self.mean).abs() <= sigmas * self.std_dev
    }

    /// Absolute distance from the mean
    pub fn deviation(&self, value: f64) -> f64 {
        (value - self.mean).abs()
    }
}
