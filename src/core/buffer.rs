//! Per-channel accumulator of pending readings

use crate::sensors::{Batch, ChannelId, Reading};

/// Pending readings for one channel, drained as a batch once full
#[derive(Debug, Clone)]
pub struct ChannelBuffer {
    channel: ChannelId,
    threshold: usize,
    pending: Vec<Reading>,
}

impl ChannelBuffer {
    pub fn new(channel: ChannelId, threshold: usize) -> Self {
        let threshold = threshold.max(1);
        Self {
            channel,
            threshold,
            pending: Vec::with_capacity(threshold),
        }
    }

    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    pub fn append(&mut self, reading: Reading) {
        self.pending.push(reading);
    }

    pub fn should_flush(&self) -> bool {
        self.pending.len() >= self.threshold
    }

    /// Hand over everything pending and start empty
    pub fn drain(&mut self) -> Batch {
        let readings = std::mem::replace(&mut self.pending, Vec::with_capacity(self.threshold));
        Batch::new(self.channel, readings)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
