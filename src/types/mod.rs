//! Core types for eyecalc

mod dimension;
mod error;
mod fossil;
mod output;
mod prediction;
mod preferences;

pub use dimension::Dimension;
pub use error::ConfigError;
pub use fossil::Fossil;
pub use output::{ResultSnapshot, ThrowSummary};
pub use prediction::{yaw_between, BlindPosition, BlindResult, ChunkPrediction, DivineResult};
pub use preferences::Preferences;
