// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/gripwatch

//! Configuration module

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::sensors::ChannelId;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory that relative data, model and signal paths resolve against
    pub data_dir: PathBuf,

    /// Read from the simulated line source instead of the serial port
    pub demo_mode: bool,

    /// Serial acquisition settings
    pub acquisition: AcquisitionConfig,

    /// Batch cleaning settings
    pub cleaning: CleaningConfig,

    /// Feature derivation settings
    pub features: FeatureConfig,

    /// Configured sensor channels
    pub channels: Vec<ChannelConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            demo_mode: false,
            acquisition: AcquisitionConfig::default(),
            cleaning: CleaningConfig::default(),
            features: FeatureConfig::default(),
            channels: ChannelConfig::defaults(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Load or create default configuration
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            let config = Self::default();

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            config.save(path)?;
            Ok(config)
        }
    }

    /// Get configuration directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("gripwatch"))
            .unwrap_or_else(|| PathBuf::from("./config"))
    }

    /// Get default configuration path
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.channels.is_empty() {
            bail!("at least one channel must be configured");
        }
        let mut seen = HashSet::new();
        for channel in &self.channels {
            if !seen.insert(channel.id) {
                bail!("channel {} is configured more than once", channel.id);
            }
        }
        if self.acquisition.flush_threshold == 0 {
            bail!("acquisition.flush_threshold must be at least 1");
        }
        if self.features.rolling_window == 0 {
            bail!("features.rolling_window must be at least 1");
        }
        if !(self.cleaning.sigma_limit >= 0.0) || !(self.cleaning.transition_tolerance >= 0.0) {
            bail!("cleaning limits must be non-negative numbers");
        }
        Ok(())
    }

    /// Configured channel ids in declaration order
    pub fn channel_ids(&self) -> Vec<ChannelId> {
        self.channels.iter().map(|c| c.id).collect()
    }

    /// Resolve a possibly relative path against `data_dir`
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.data_dir.join(path)
        }
    }

    /// Location of the out-of-band stop artifact
    pub fn shutdown_signal_path(&self) -> PathBuf {
        self.resolve(&self.acquisition.shutdown_signal)
    }
}

/// Serial acquisition configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquisitionConfig {
    /// Serial port the microcontroller is attached to
    pub serial_port: String,

    /// Baud rate
    pub baud_rate: u32,

    /// Bounded wait for one line, in milliseconds
    pub read_timeout_ms: u64,

    /// Delay after opening the port before the first read
    pub settle_ms: u64,

    /// Pending readings per channel that trigger a batch clean
    pub flush_threshold: usize,

    /// File whose presence requests a graceful stop
    pub shutdown_signal: PathBuf,

    /// Field delimiter of the line protocol
    pub delimiter: char,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            serial_port: "COM5".to_string(),
            baud_rate: 9600,
            read_timeout_ms: 1000,
            settle_ms: 2000,
            flush_threshold: 100,
            shutdown_signal: PathBuf::from("stop_signal.txt"),
            delimiter: ',',
        }
    }
}

/// Batch cleaning configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleaningConfig {
    /// Records further than this many standard deviations from the mean are dropped
    pub sigma_limit: f64,

    /// Largest resistance gap at which a state change is treated as noise
    pub transition_tolerance: f64,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            sigma_limit: 3.0,
            transition_tolerance: 3.0,
        }
    }
}

/// Feature derivation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Trailing window length for rolling mean/std
    pub rolling_window: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self { rolling_window: 5 }
    }
}

/// One physical sensor and its files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub id: ChannelId,
    pub label: String,
    pub data_file: PathBuf,
    pub model_file: PathBuf,
    pub prediction_file: PathBuf,
}

impl ChannelConfig {
    pub fn new(id: ChannelId, label: &str) -> Self {
        Self {
            id,
            label: label.to_string(),
            data_file: PathBuf::from(format!("data_capteur{}_filtered.csv", id)),
            model_file: PathBuf::from(format!("sensor_model_s{}.json", id)),
            prediction_file: PathBuf::from(format!("data_capteur{}_predictions.csv", id)),
        }
    }

    /// The five jacket sensors
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new(1, "Right arm"),
            Self::new(2, "Right lapel"),
            Self::new(3, "Neck"),
            Self::new(4, "Left lapel"),
            Self::new(5, "Left arm"),
        ]
    }
}
