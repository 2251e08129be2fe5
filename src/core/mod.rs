//! Core application primitives (orchestrator, scheduler, state)

pub mod alerts;
pub mod http;
pub mod orchestrator;
pub mod scheduler;
pub mod state;

pub use orchestrator::ScanOrchestrator;
pub use scheduler::{FailureCounter, RoundOutcome, RoundScheduler};
pub use state::{NonePolicy, StateStore};
