// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/gripwatch

//! Sensor simulator for demo/testing

use rand::prelude::*;
use rand_distr::StandardNormal;
use std::time::Duration;

use super::{ChannelId, LineSource, LinkStatus};
use crate::error::{PipelineError, Result};

/// Standard deviation of the reading noise, in ohms
const NOISE_STD: f64 = 2.0;

/// Per-channel simulation state
struct SimChannel {
    id: ChannelId,
    baseline: f64,
    gripping: bool,
}

/// Emits protocol lines the way the jacket firmware does, with the
/// occasional glitch so the drop paths get exercised.
pub struct SensorSimulator {
    channels: Vec<SimChannel>,
    rng: StdRng,
    noise_std: f64,
    next: usize,
    time: f64,
    pace: Duration,
    glitch_probability: f64,
    grip_toggle_probability: f64,
    remaining: Option<usize>,
    status: LinkStatus,
}

impl SensorSimulator {
    pub fn new(channels: &[ChannelId], pace: Duration) -> Self {
        Self::with_rng(channels, pace, StdRng::from_entropy())
    }

    /// Deterministic simulator for reproducible runs
    pub fn seeded(channels: &[ChannelId], seed: u64) -> Self {
        Self::with_rng(channels, Duration::ZERO, StdRng::seed_from_u64(seed))
    }

    fn with_rng(channels: &[ChannelId], pace: Duration, mut rng: StdRng) -> Self {
        let channels = channels
            .iter()
            .map(|&id| SimChannel {
                id,
                baseline: rng.gen_range(400.0..600.0),
                gripping: false,
            })
            .collect();

        Self {
            channels,
            rng,
            noise_std: NOISE_STD,
            next: 0,
            time: 0.0,
            pace,
            glitch_probability: 0.01,
            grip_toggle_probability: 0.02,
            remaining: None,
            status: LinkStatus::Connected,
        }
    }

    /// Stop after `lines` lines, reporting a lost link afterwards
    pub fn with_limit(mut self, lines: usize) -> Self {
        self.remaining = Some(lines);
        self
    }

    pub fn with_glitch_probability(mut self, p: f64) -> Self {
        self.glitch_probability = p.clamp(0.0, 1.0);
        self
    }

    fn generate_line(&mut self) -> String {
        if self.channels.is_empty() {
            return String::new();
        }
        let idx = self.next % self.channels.len();
        self.next += 1;
        if idx == 0 {
            self.time += 1.0;
        }

        if self.rng.gen::<f64>() < self.glitch_probability {
            return match self.rng.gen_range(0..3) {
                0 => format!("{},{:.1},inf", self.channels[idx].id, self.time),
                1 => "ERR,,".to_string(),
                _ => format!("{},{:.1}", self.channels[idx].id, self.time),
            };
        }

        if self.rng.gen::<f64>() < self.grip_toggle_probability {
            self.channels[idx].gripping = !self.channels[idx].gripping;
        }

        let noise = self.rng.sample::<f64, _>(StandardNormal) * self.noise_std;
        let channel = &self.channels[idx];
        // Pressure on the fabric lowers its resistance
        let level = if channel.gripping {
            channel.baseline * 0.6
        } else {
            channel.baseline
        };

        format!("{},{:.1},{:.2}", channel.id, self.time, level + noise)
    }
}

impl LineSource for SensorSimulator {
    fn name(&self) -> &str {
        "simulator"
    }

    fn status(&self) -> LinkStatus {
        self.status
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        if self.status != LinkStatus::Connected {
            return Err(PipelineError::ConnectionLost("simulator stopped".to_string()));
        }
        if let Some(remaining) = self.remaining.as_mut() {
            if *remaining == 0 {
                self.status = LinkStatus::Lost;
                return Err(PipelineError::ConnectionLost("simulated unplug".to_string()));
            }
            *remaining -= 1;
        }
        if !self.pace.is_zero() {
            std::thread::sleep(self.pace);
        }
        Ok(Some(self.generate_line()))
    }

    fn close(&mut self) -> Result<()> {
        self.status = LinkStatus::Disconnected;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::LineParser;

    #[test]
    fn test_simulator_round_robins_channels() {
        let mut sim = SensorSimulator::seeded(&[1, 2, 3], 7).with_glitch_probability(0.0);
        let parser = LineParser::new(',', [1, 2, 3]);

        let ids: Vec<_> = (0..6)
            .map(|_| parser.parse(&sim.read_line().unwrap().unwrap()).unwrap().sensor_id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3, 1, 2, 3]);
    }

    #[test]
    fn test_simulator_limit_reports_loss() {
        let mut sim = SensorSimulator::seeded(&[1], 1).with_limit(2);
        assert!(sim.read_line().is_ok());
        assert!(sim.read_line().is_ok());
        assert!(matches!(sim.read_line(), Err(PipelineError::ConnectionLost(_))));
        assert_eq!(sim.status(), LinkStatus::Lost);
    }

    #[test]
    fn test_simulated_readings_stay_near_baseline() {
        let mut sim = SensorSimulator::seeded(&[1, 2], 11).with_glitch_probability(0.0);
        let parser = LineParser::new(',', [1, 2]);

        for _ in 0..500 {
            let reading = parser.parse(&sim.read_line().unwrap().unwrap()).unwrap();
            // Gripped level is 0.6 of a 400..600 baseline, plus small noise
            assert!(reading.resistance > 200.0 && reading.resistance < 650.0);
        }
    }
}
