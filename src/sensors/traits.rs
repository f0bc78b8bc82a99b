// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/gripwatch

//! Sensor traits and common types

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Identifier of one physical sensor channel
pub type ChannelId = u32;

/// A single decoded resistance reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub sensor_id: ChannelId,
    pub timestamp: f64,
    pub resistance: f64,
}

impl Reading {
    pub fn new(sensor_id: ChannelId, timestamp: f64, resistance: f64) -> Self {
        Self {
            sensor_id,
            timestamp,
            resistance,
        }
    }
}

/// Readings accumulated for one channel, in arrival order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    pub channel: ChannelId,
    pub readings: Vec<Reading>,
}

impl Batch {
    pub fn new(channel: ChannelId, readings: Vec<Reading>) -> Self {
        Self { channel, readings }
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

/// Link operational status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkStatus {
    Disconnected,
    Connected,
    Lost,
}

/// Anything that yields newline-terminated protocol lines.
///
/// `read_line` blocks for at most the source's configured timeout.
/// `Ok(None)` means the wait elapsed without a complete line and the
/// caller should poll again. A broken link is reported as
/// [`PipelineError::ConnectionLost`](crate::error::PipelineError::ConnectionLost).
pub trait LineSource: Send {
    /// Human readable name for logs
    fn name(&self) -> &str;

    /// Current link status
    fn status(&self) -> LinkStatus;

    /// Read one line without its terminator
    fn read_line(&mut self) -> Result<Option<String>>;

    /// Release the underlying handle
    fn close(&mut self) -> Result<()>;
}
