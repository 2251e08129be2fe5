//! Shared data models spanning the engine layers.

pub mod market;
pub mod signal;

pub use market::{Candle, Instrument, PriceSeries};
pub use signal::{ConsensusSignal, ScanResult, SignalStrength, Vote};
