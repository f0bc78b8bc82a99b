// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/gripwatch

//! Pipeline error taxonomy
//!
//! Only `ConnectionLost` ends an acquisition run, and even then the loop
//! drains and closes before returning. Every other variant is handled
//! locally: dropped and logged (`MalformedLine`, `NonFiniteValue`),
//! ignored (`UnknownChannel`) or isolated to one channel
//! (`MissingSinkOrModel`).

use thiserror::Error;

/// Result alias used across the library
pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// Wrong field count or a field that does not parse
    #[error("malformed line {line:?}: {reason}")]
    MalformedLine { line: String, reason: String },

    /// Resistance decoded as NaN or infinite
    #[error("non-finite resistance in line {line:?}")]
    NonFiniteValue { line: String },

    /// Channel id outside the configured set
    #[error("unknown channel {0}")]
    UnknownChannel(i64),

    /// Serial link failed while reading
    #[error("connection lost: {0}")]
    ConnectionLost(String),

    /// Sink or model file absent or unreadable for one channel
    #[error("channel {channel}: {reason}")]
    MissingSinkOrModel { channel: u32, reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("model format error: {0}")]
    Model(#[from] serde_json::Error),
}
