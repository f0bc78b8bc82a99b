// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/gripwatch

//! Acquisition loop - line source to cleaned channel sinks

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, trace, warn};

use super::{RunContext, StopRequest};
use crate::error::{PipelineError, Result};
use crate::sensors::{ChannelId, LineSource};

/// Lifecycle of one acquisition run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AcquisitionState {
    Idle,
    Running,
    Draining,
    Closed,
}

/// What ended the run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    ShutdownSignal,
    Interrupted,
    ConnectionLost(String),
    SinkFailed(String),
}

/// Per-line outcome counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineCounters {
    pub lines: u64,
    pub accepted: u64,
    pub blank: u64,
    pub malformed: u64,
    pub non_finite: u64,
    pub unknown_channel: u64,
    pub timeouts: u64,
}

impl LineCounters {
    pub fn dropped(&self) -> u64 {
        self.malformed + self.non_finite + self.unknown_channel
    }
}

/// Summary of a finished run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub stop_reason: StopReason,
    pub counters: LineCounters,
    pub records_written: BTreeMap<ChannelId, usize>,
    pub transitions: Vec<AcquisitionState>,
}

impl RunReport {
    pub fn total_written(&self) -> usize {
        self.records_written.values().sum()
    }
}

/// Single-threaded polling loop.
///
/// Each iteration checks for a stop request, waits a bounded time for
/// one line, buffers it, and flushes any full channel. Whatever ends the
/// loop, every non-empty buffer is flushed before resources are released.
pub struct AcquisitionLoop {
    ctx: RunContext,
    state: AcquisitionState,
    transitions: Vec<AcquisitionState>,
    counters: LineCounters,
}

impl AcquisitionLoop {
    pub fn new(ctx: RunContext) -> Self {
        Self {
            ctx,
            state: AcquisitionState::Idle,
            transitions: vec![AcquisitionState::Idle],
            counters: LineCounters::default(),
        }
    }

    pub fn state(&self) -> AcquisitionState {
        self.state
    }

    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    /// Run to completion. `open_source` is called once, after the sinks
    /// are opened fresh; failing to open it is handled like a lost link.
    ///
    /// Returns an error only if a sink could not be opened, written or
    /// closed.
    pub fn run<S, F>(mut self, open_source: F) -> Result<RunReport>
    where
        S: LineSource,
        F: FnOnce() -> Result<S>,
    {
        let started_at = Utc::now();
        if self.state != AcquisitionState::Idle {
            return Err(PipelineError::Config("acquisition loop already ran".to_string()));
        }

        if let Err(e) = self.ctx.open_sinks() {
            error!("Could not open channel sinks: {}", e);
            self.transition(AcquisitionState::Closed);
            if let Err(close_err) = self.ctx.close() {
                warn!("Cleanup after failed sink open: {}", close_err);
            }
            return Err(e);
        }
        let mut source = match open_source() {
            Ok(source) => {
                info!("Line source {} opened", source.name());
                Some(source)
            }
            Err(e) => {
                error!("Could not open line source: {}", e);
                None
            }
        };

        self.transition(AcquisitionState::Running);
        let mut failure = None;
        let stop_reason = match source.as_mut() {
            Some(source) => self.poll(source, &mut failure),
            None => StopReason::ConnectionLost("line source unavailable".to_string()),
        };
        info!("Stopping acquisition: {:?}", stop_reason);

        self.transition(AcquisitionState::Draining);
        match self.ctx.flush(true) {
            Ok(n) => info!("Final flush wrote {} records", n),
            Err(e) => {
                error!("Final flush failed: {}", e);
                failure.get_or_insert(e);
            }
        }

        self.transition(AcquisitionState::Closed);
        if let Some(source) = source.as_mut() {
            if let Err(e) = source.close() {
                warn!("Error closing line source {}: {}", source.name(), e);
            }
        }
        if let Err(e) = self.ctx.close() {
            failure.get_or_insert(e);
        }

        if let Some(e) = failure {
            return Err(e);
        }

        let report = RunReport {
            started_at,
            finished_at: Utc::now(),
            stop_reason,
            counters: self.counters,
            records_written: self.ctx.written(),
            transitions: self.transitions,
        };
        info!(
            "Acquisition closed: {} lines, {} accepted, {} dropped, {} records written",
            report.counters.lines,
            report.counters.accepted,
            report.counters.dropped(),
            report.total_written()
        );
        Ok(report)
    }

    fn poll<S: LineSource>(&mut self, source: &mut S, failure: &mut Option<PipelineError>) -> StopReason {
        loop {
            match self.ctx.stop_requested() {
                Some(StopRequest::Interrupt) => return StopReason::Interrupted,
                Some(StopRequest::Signal) => {
                    info!("Stop signal detected ({})", self.ctx.shutdown_signal().describe());
                    return StopReason::ShutdownSignal;
                }
                None => {}
            }

            match source.read_line() {
                Ok(None) => self.counters.timeouts += 1,
                Ok(Some(line)) => self.ingest(&line),
                Err(PipelineError::ConnectionLost(reason)) => {
                    error!("Connection lost: {}", reason);
                    return StopReason::ConnectionLost(reason);
                }
                Err(e) => {
                    error!("Line source failed: {}", e);
                    return StopReason::ConnectionLost(e.to_string());
                }
            }

            if let Err(e) = self.ctx.flush(false) {
                let reason = StopReason::SinkFailed(e.to_string());
                *failure = Some(e);
                return reason;
            }
        }
    }

    fn ingest(&mut self, line: &str) {
        if line.trim().is_empty() {
            self.counters.blank += 1;
            return;
        }
        self.counters.lines += 1;
        trace!("{}", line);

        match self.ctx.ingest(line) {
            Ok(_) => self.counters.accepted += 1,
            Err(PipelineError::MalformedLine { line, reason }) => {
                self.counters.malformed += 1;
                warn!("Malformed line dropped ({}): {:?}", reason, line);
            }
            Err(PipelineError::NonFiniteValue { line }) => {
                self.counters.non_finite += 1;
                warn!("Non-finite resistance dropped: {:?}", line);
            }
            Err(PipelineError::UnknownChannel(id)) => {
                self.counters.unknown_channel += 1;
                debug!("Ignoring reading for unconfigured channel {}", id);
            }
            Err(e) => {
                self.counters.malformed += 1;
                warn!("Line dropped: {}", e);
            }
        }
    }

    fn transition(&mut self, next: AcquisitionState) {
        info!("Acquisition {:?} -> {:?}", self.state, next);
        self.state = next;
        self.transitions.push(next);
    }
}
