// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/gripwatch

//! Per-run state: channel buffers, sinks, and stop signals

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tracing::{debug, warn};

use super::{ChannelBuffer, FileSignal, FlagSignal, ShutdownSignal};
use crate::analysis::BatchCleaner;
use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::sensors::{ChannelId, LineParser};
use crate::streaming::{CsvSink, SinkMode};

/// Why a stop was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopRequest {
    Signal,
    Interrupt,
}

/// Everything one acquisition run owns. Nothing here is shared with
/// other runs; the loop receives it explicitly.
pub struct RunContext {
    parser: LineParser,
    cleaner: BatchCleaner,
    buffers: BTreeMap<ChannelId, ChannelBuffer>,
    sink_paths: BTreeMap<ChannelId, PathBuf>,
    sinks: BTreeMap<ChannelId, CsvSink>,
    shutdown: Box<dyn ShutdownSignal>,
    interrupt: FlagSignal,
}

impl RunContext {
    pub fn new(
        channels: impl IntoIterator<Item = (ChannelId, PathBuf)>,
        flush_threshold: usize,
        delimiter: char,
        cleaner: BatchCleaner,
        shutdown: Box<dyn ShutdownSignal>,
    ) -> Self {
        let sink_paths: BTreeMap<ChannelId, PathBuf> = channels.into_iter().collect();
        let buffers = sink_paths
            .keys()
            .map(|&id| (id, ChannelBuffer::new(id, flush_threshold)))
            .collect();

        Self {
            parser: LineParser::new(delimiter, sink_paths.keys().copied()),
            cleaner,
            buffers,
            sink_paths,
            sinks: BTreeMap::new(),
            shutdown,
            interrupt: FlagSignal::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config
                .channels
                .iter()
                .map(|c| (c.id, config.resolve(&c.data_file))),
            config.acquisition.flush_threshold,
            config.acquisition.delimiter,
            BatchCleaner::new(&config.cleaning),
            Box::new(FileSignal::new(config.shutdown_signal_path())),
        )
    }

    /// Handle for an interrupt handler; storing `true` stops the run
    pub fn interrupt_handle(&self) -> Arc<AtomicBool> {
        self.interrupt.handle()
    }

    pub fn shutdown_signal(&self) -> &dyn ShutdownSignal {
        self.shutdown.as_ref()
    }

    /// Records appended per channel since the sinks were opened
    pub fn written(&self) -> BTreeMap<ChannelId, usize> {
        self.sink_paths
            .keys()
            .map(|id| (*id, self.sinks.get(id).map(CsvSink::written).unwrap_or(0)))
            .collect()
    }

    pub(crate) fn open_sinks(&mut self) -> Result<()> {
        for (&id, path) in &self.sink_paths {
            let sink = CsvSink::open(id, path, SinkMode::Fresh)?;
            self.sinks.insert(id, sink);
        }
        Ok(())
    }

    pub(crate) fn stop_requested(&self) -> Option<StopRequest> {
        if self.interrupt.is_requested() {
            Some(StopRequest::Interrupt)
        } else if self.shutdown.is_requested() {
            Some(StopRequest::Signal)
        } else {
            None
        }
    }

    /// Parse a line and buffer the reading
    pub(crate) fn ingest(&mut self, line: &str) -> Result<ChannelId> {
        let reading = self.parser.parse(line)?;
        let buffer = self
            .buffers
            .get_mut(&reading.sensor_id)
            .ok_or(PipelineError::UnknownChannel(i64::from(reading.sensor_id)))?;
        buffer.append(reading);
        Ok(reading.sensor_id)
    }

    /// Clean and persist buffered batches. Without `force` only full
    /// buffers are flushed; with it every non-empty one is. A failing
    /// sink does not stop the other channels; the first error is returned.
    pub(crate) fn flush(&mut self, force: bool) -> Result<usize> {
        let mut appended = 0;
        let mut first_error = None;

        for (id, buffer) in self.buffers.iter_mut() {
            let due = if force {
                !buffer.is_empty()
            } else {
                buffer.should_flush()
            };
            if !due {
                continue;
            }

            let batch = buffer.drain();
            let received = batch.len();
            let records = self.cleaner.clean(batch);
            match self.sinks.get_mut(id) {
                Some(sink) => match sink.append(&records) {
                    Ok(()) => {
                        debug!("Channel {}: flushed {} of {} readings", id, records.len(), received);
                        appended += records.len();
                    }
                    Err(e) => {
                        warn!("Channel {}: sink append failed: {}", id, e);
                        first_error.get_or_insert(e);
                    }
                },
                None => warn!("Channel {}: no open sink, {} records lost", id, records.len()),
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(appended),
        }
    }

    /// Close every sink and remove the stop artifact
    pub(crate) fn close(&mut self) -> Result<()> {
        let mut first_error = None;
        for sink in self.sinks.values_mut() {
            if let Err(e) = sink.close() {
                first_error.get_or_insert(e);
            }
        }
        if let Err(e) = self.shutdown.clear() {
            warn!("Could not clear stop signal ({}): {}", self.shutdown.describe(), e);
            first_error.get_or_insert(e);
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
