//! Analysis module - batch cleaning, statistics, and feature derivation

mod cleaning;
mod features;
mod statistics;
mod training;

pub use cleaning::*;
pub use features::*;
pub use statistics::*;
pub use training::*;
