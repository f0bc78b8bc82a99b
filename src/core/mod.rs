//! Core module - acquisition loop, per-run context, and stop signals

mod buffer;
mod context;
mod engine;
mod shutdown;

pub use buffer::ChannelBuffer;
pub use context::{RunContext, StopRequest};
pub use engine::{AcquisitionLoop, AcquisitionState, LineCounters, RunReport, StopReason};
pub use shutdown::{FileSignal, FlagSignal, ShutdownSignal};
