//! Sensor module - reading types, line protocol and line sources

mod parser;
mod replay;
mod serial;
mod simulator;
mod traits;

pub use parser::LineParser;
pub use replay::{ReaderSource, ScriptStep, ScriptedSource};
pub use serial::SerialSource;
pub use simulator::SensorSimulator;
pub use traits::{Batch, ChannelId, LineSource, LinkStatus, Reading};
