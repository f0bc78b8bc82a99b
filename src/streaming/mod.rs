//! Streaming module - channel sinks and result export

mod export;
mod sink;

pub use export::*;
pub use sink::*;
