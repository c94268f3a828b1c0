pub mod indicators;
pub mod signal;
pub mod sizing;

pub use indicators::{IndicatorEngine, TaIndicatorEngine};
pub use signal::SignalEngine;
pub use sizing::{PipValueModel, size_position};
