// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/gripwatch

//! GripWatch - Grip Sensor Acquisition and Classification
//!
//! Records resistance readings from a jacket of grip sensors over a
//! serial line and decides where the jacket was gripped:
//! - Line protocol parsing with per-line fault isolation
//! - Per-channel buffering and batch cleaning (dedup, 3σ filter)
//! - Append-only CSV sink per channel
//! - File-based stop signal shared with a controlling process
//! - Rolling-window feature derivation and per-channel classification
//! - Grip distribution across channels
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Acquisition Loop                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────┐  ┌──────────┐  ┌───────────┐  ┌────────────┐  │
//! │  │  Line   │→ │  Line    │→ │  Channel  │→ │   Batch    │  │
//! │  │ Source  │  │  Parser  │  │  Buffers  │  │  Cleaner   │  │
//! │  └─────────┘  └──────────┘  └───────────┘  └────────────┘  │
//! │       ↑                                          ↓          │
//! │  ┌─────────┐                               ┌────────────┐  │
//! │  │  Stop   │                               │  CSV Sinks │  │
//! │  │ Signal  │                               └────────────┘  │
//! │  └─────────┘                                     ↓          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌──────────┐  ┌────────────┐  ┌─────────────────────────┐  │
//! │  │ Feature  │→ │ Classifier │→ │ Aggregator/Distribution │  │
//! │  │ Engine   │  │ per channel│  │                         │  │
//! │  └──────────┘  └────────────┘  └─────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod analysis;
pub mod config;
pub mod core;
pub mod detection;
pub mod error;
pub mod sensors;
pub mod streaming;

// Re-exports for convenience
pub use crate::core::{AcquisitionLoop, RunContext, RunReport};
pub use analysis::{BatchCleaner, CleanedRecord, FeatureEngine, FeatureVector};
pub use config::Config;
pub use detection::{AggregationReport, ClassificationAggregator, GripDistribution};
pub use error::{PipelineError, Result};
pub use sensors::{LineParser, LineSource, Reading};

/// GripWatch version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// GripWatch name
pub const NAME: &str = "GripWatch";

/// Build info
pub fn build_info() -> BuildInfo {
    BuildInfo {
        version: VERSION.to_string(),
        target: std::env::consts::ARCH.to_string(),
        os: std::env::consts::OS.to_string(),
        features: enabled_features(),
    }
}

/// Build information
#[derive(Debug, Clone)]
pub struct BuildInfo {
    /// Version string
    pub version: String,
    /// Target architecture
    pub target: String,
    /// Operating system
    pub os: String,
    /// Enabled features
    pub features: Vec<String>,
}

fn enabled_features() -> Vec<String> {
    let mut features = vec![];

    #[cfg(feature = "serial")]
    features.push("serial".to_string());

    features
}
