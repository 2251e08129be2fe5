//! Last emitted signal per instrument, used to alert only on change.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::error::StateError;
use crate::models::{ConsensusSignal, Instrument, ScanResult};

/// What a NONE classification does to a stored BUY/SELL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NonePolicy {
    /// Store NONE, so the same signal alerts again after a quiet round.
    Reset,
    /// Keep the stored signal until a different non-NONE signal appears.
    Keep,
}

/// On-disk shape: symbol → "BUY" | "SELL" | null.
type Snapshot = BTreeMap<String, Option<ConsensusSignal>>;

pub struct StateStore {
    entries: HashMap<Instrument, ConsensusSignal>,
    policy: NonePolicy,
    path: Option<PathBuf>,
}

impl StateStore {
    /// In-memory store.
    pub fn new(policy: NonePolicy) -> Self {
        Self {
            entries: HashMap::new(),
            policy,
            path: None,
        }
    }

    /// Store backed by a snapshot file. A missing or unreadable file starts empty.
    pub fn with_snapshot(path: impl Into<PathBuf>, policy: NonePolicy) -> Self {
        let path = path.into();
        let entries = match Self::load(&path) {
            Ok(entries) => {
                debug!(path = %path.display(), count = entries.len(), "StateStore: loaded snapshot");
                entries
            }
            Err(StateError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "StateStore: ignoring unreadable snapshot");
                HashMap::new()
            }
        };
        Self {
            entries,
            policy,
            path: Some(path),
        }
    }

    pub fn load(path: &Path) -> Result<HashMap<Instrument, ConsensusSignal>, StateError> {
        let raw = fs::read_to_string(path)?;
        let snapshot: Snapshot = serde_json::from_str(&raw)?;
        Ok(snapshot
            .into_iter()
            .map(|(symbol, signal)| {
                (
                    Instrument::new(symbol),
                    signal.unwrap_or(ConsensusSignal::None),
                )
            })
            .collect())
    }

    pub fn policy(&self) -> NonePolicy {
        self.policy
    }

    pub fn get(&self, instrument: &Instrument) -> Option<ConsensusSignal> {
        self.entries.get(instrument).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record a round's results and return those that are new signals.
    pub fn diff(&mut self, results: &[ScanResult]) -> Vec<ScanResult> {
        let mut fresh = Vec::new();
        for result in results {
            if result.signal.is_actionable() {
                if self.entries.get(&result.instrument) != Some(&result.signal) {
                    self.entries.insert(result.instrument.clone(), result.signal);
                    fresh.push(result.clone());
                }
                continue;
            }

            match self.policy {
                NonePolicy::Reset => {
                    self.entries
                        .insert(result.instrument.clone(), ConsensusSignal::None);
                }
                NonePolicy::Keep => {
                    self.entries
                        .entry(result.instrument.clone())
                        .or_insert(ConsensusSignal::None);
                }
            }
        }
        fresh
    }

    /// Overwrite the snapshot file wholesale.
    pub fn save(&self) -> Result<(), StateError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let snapshot: Snapshot = self
            .entries
            .iter()
            .map(|(instrument, signal)| {
                let value = signal.is_actionable().then_some(*signal);
                (instrument.to_string(), value)
            })
            .collect();
        let json = serde_json::to_string_pretty(&snapshot)?;

        let tmp = path.with_extension("tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Best-effort save: failures are logged, never propagated.
    pub fn persist(&self) {
        if let Err(e) = self.save() {
            error!(error = %e, "StateStore: failed to write snapshot");
        }
    }
}
