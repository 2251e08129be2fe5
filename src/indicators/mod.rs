//! Indicator calculations over closing prices.

pub mod momentum;
pub mod snapshot;
pub mod trend;

pub use snapshot::{IndicatorEngine, IndicatorParams, IndicatorSnapshot, LastTwo};
