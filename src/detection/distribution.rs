//! Grip share per channel, as shown to the operator

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ChannelSummary;
use crate::sensors::ChannelId;

/// One channel's grips and their share of the total
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelShare {
    pub grip_count: usize,
    pub percentage: f64,
}

/// Distribution of grips across channels
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GripDistribution {
    pub total: usize,
    pub shares: BTreeMap<ChannelId, ChannelShare>,
}

impl GripDistribution {
    /// Percentages of the total; with no grips at all every channel
    /// reports 0% instead of dividing by zero
    pub fn from_summaries<'a>(summaries: impl IntoIterator<Item = &'a ChannelSummary>) -> Self {
        let counts: Vec<(ChannelId, usize)> = summaries
            .into_iter()
            .map(|s| (s.sensor_id, s.grip_count))
            .collect();
        let total: usize = counts.iter().map(|(_, c)| c).sum();

        let shares = counts
            .into_iter()
            .map(|(id, grip_count)| {
                let percentage = if total == 0 {
                    0.0
                } else {
                    grip_count as f64 / total as f64 * 100.0
                };
                (id, ChannelShare { grip_count, percentage })
            })
            .collect();

        Self { total, shares }
    }

    pub fn percentage(&self, channel: ChannelId) -> f64 {
        self.shares.get(&channel).map(|s| s.percentage).unwrap_or(0.0)
    }
}
