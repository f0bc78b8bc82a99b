// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/gripwatch

//! Serial port line source

use tracing::info;

use super::{LineSource, LinkStatus};
use crate::config::AcquisitionConfig;
use crate::error::{PipelineError, Result};

#[cfg(feature = "serial")]
use std::io::{BufRead, BufReader, ErrorKind};
#[cfg(feature = "serial")]
use std::time::Duration;

/// Microcontroller attached over a serial port
pub struct SerialSource {
    name: String,
    status: LinkStatus,
    #[cfg(feature = "serial")]
    reader: Option<BufReader<Box<dyn serialport::SerialPort>>>,
    // Bytes of a line whose terminator has not arrived yet
    pending: Vec<u8>,
}

impl SerialSource {
    /// Open the port and wait for the board to settle
    #[cfg(feature = "serial")]
    pub fn open(config: &AcquisitionConfig) -> Result<Self> {
        let port = serialport::new(&config.serial_port, config.baud_rate)
            .timeout(Duration::from_millis(config.read_timeout_ms))
            .open()
            .map_err(|e| {
                PipelineError::ConnectionLost(format!("cannot open {}: {}", config.serial_port, e))
            })?;

        std::thread::sleep(Duration::from_millis(config.settle_ms));
        info!("Opened serial port {} at {} baud", config.serial_port, config.baud_rate);

        Ok(Self {
            name: config.serial_port.clone(),
            status: LinkStatus::Connected,
            reader: Some(BufReader::new(port)),
            pending: Vec::new(),
        })
    }

    #[cfg(not(feature = "serial"))]
    pub fn open(config: &AcquisitionConfig) -> Result<Self> {
        Err(PipelineError::Config(format!(
            "cannot open {}: serial support not enabled, rebuild with --features serial",
            config.serial_port
        )))
    }

    #[cfg(feature = "serial")]
    fn take_line(&mut self) -> String {
        let raw = std::mem::take(&mut self.pending);
        String::from_utf8_lossy(&raw)
            .trim_end_matches(['\r', '\n'])
            .to_string()
    }
}

impl LineSource for SerialSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn status(&self) -> LinkStatus {
        self.status
    }

    #[cfg(feature = "serial")]
    fn read_line(&mut self) -> Result<Option<String>> {
        let Some(reader) = self.reader.as_mut() else {
            return Err(PipelineError::ConnectionLost(format!("{} is closed", self.name)));
        };

        match reader.read_until(b'\n', &mut self.pending) {
            Ok(0) => {
                self.status = LinkStatus::Lost;
                Err(PipelineError::ConnectionLost(format!("{} reached end of stream", self.name)))
            }
            Ok(_) if self.pending.ends_with(b"\n") => Ok(Some(self.take_line())),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == ErrorKind::TimedOut || e.kind() == ErrorKind::WouldBlock => {
                Ok(None)
            }
            Err(e) => {
                self.status = LinkStatus::Lost;
                Err(PipelineError::ConnectionLost(format!("{}: {}", self.name, e)))
            }
        }
    }

    #[cfg(not(feature = "serial"))]
    fn read_line(&mut self) -> Result<Option<String>> {
        Err(PipelineError::ConnectionLost(format!("{} is not available", self.name)))
    }

    fn close(&mut self) -> Result<()> {
        #[cfg(feature = "serial")]
        {
            self.reader = None;
        }
        self.pending.clear();
        self.status = LinkStatus::Disconnected;
        info!("Closed serial port {}", self.name);
        Ok(())
    }
}
