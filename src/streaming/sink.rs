// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/gripwatch

//! Per-channel append-only CSV sink

use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::analysis::CleanedRecord;
use crate::error::{PipelineError, Result};
use crate::sensors::ChannelId;

/// Header written once at stream creation
pub const SINK_HEADER: [&str; 2] = ["Timestamp", "Resistance"];

/// How an existing sink file is treated on open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkMode {
    /// Truncate and start a new stream
    Fresh,
    /// Keep existing rows and append after them
    Append,
}

/// Durable stream of cleaned records for one channel
pub struct CsvSink {
    channel: ChannelId,
    path: PathBuf,
    writer: Option<csv::Writer<File>>,
    written: usize,
}

impl CsvSink {
    pub fn open(channel: ChannelId, path: &Path, mode: SinkMode) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let (file, needs_header) = match mode {
            SinkMode::Fresh => (File::create(path)?, true),
            SinkMode::Append => {
                let file = OpenOptions::new().create(true).append(true).open(path)?;
                let empty = file.metadata()?.len() == 0;
                (file, empty)
            }
        };

        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        if needs_header {
            writer.write_record(SINK_HEADER)?;
            writer.flush()?;
        }

        info!("Channel {} sink opened at {:?} ({:?})", channel, path, mode);
        Ok(Self {
            channel,
            path: path.to_path_buf(),
            writer: Some(writer),
            written: 0,
        })
    }

    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records appended since open
    pub fn written(&self) -> usize {
        self.written
    }

    /// Append records in order and flush them to the file
    pub fn append(&mut self, records: &[CleanedRecord]) -> Result<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Err(PipelineError::Io(std::io::Error::new(
                ErrorKind::NotConnected,
                format!("sink for channel {} is closed", self.channel),
            )));
        };

        for record in records {
            writer.write_record(&[record.timestamp.to_string(), record.resistance.to_string()])?;
        }
        writer.flush()?;
        self.written += records.len();
        debug!("Channel {}: appended {} records", self.channel, records.len());
        Ok(())
    }

    pub fn close(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
            info!(
                "Channel {} sink closed with {} records written",
                self.channel, self.written
            );
        }
        Ok(())
    }
}

impl Drop for CsvSink {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("Channel {} sink failed to flush on drop: {}", self.channel, e);
        }
    }
}

/// Read a channel's sink back.
///
/// A missing file, an empty file, or a file without the expected columns
/// is reported as [`PipelineError::MissingSinkOrModel`]. Rows whose
/// fields do not parse as numbers are skipped.
pub fn read_sink(channel: ChannelId, path: &Path) -> Result<Vec<CleanedRecord>> {
    let mut reader = match csv::ReaderBuilder::new().flexible(true).from_path(path) {
        Ok(reader) => reader,
        Err(e) => {
            return Err(PipelineError::MissingSinkOrModel {
                channel,
                reason: format!("cannot open sink {:?}: {}", path, e),
            })
        }
    };

    let headers = reader.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h.trim() == name);
    let (Some(ts_col), Some(r_col)) = (column(SINK_HEADER[0]), column(SINK_HEADER[1])) else {
        return Err(PipelineError::MissingSinkOrModel {
            channel,
            reason: format!("sink {:?} lacks Timestamp/Resistance columns", path),
        });
    };

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for row in reader.records() {
        let row = row?;
        let parsed = (
            row.get(ts_col).and_then(parse_integer),
            row.get(r_col).and_then(parse_integer),
        );
        match parsed {
            (Some(timestamp), Some(resistance)) => {
                records.push(CleanedRecord::new(timestamp, resistance))
            }
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!("Channel {}: skipped {} non-numeric sink rows", channel, skipped);
    }
    Ok(records)
}

fn parse_integer(field: &str) -> Option<i64> {
    let field = field.trim();
    field.parse::<i64>().ok().or_else(|| {
        field
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(|v| v.trunc() as i64)
    })
}
