//! Signal evaluation interfaces.

pub mod consensus;
pub mod engine;
pub mod votes;

pub use consensus::*;
pub use engine::{Classification, SignalClassifier};
pub use votes::*;
