//! Signal classifier: snapshot → votes → consensus.

use crate::indicators::{IndicatorEngine, IndicatorSnapshot};
use crate::models::{ConsensusSignal, PriceSeries, SignalStrength};
use crate::signals::consensus::consensus;
use crate::signals::votes::{RsiThresholds, VoteSet};

/// Classification of one series, with the inputs kept for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub signal: ConsensusSignal,
    pub strength: SignalStrength,
    pub votes: VoteSet,
    /// `None` when the series was too short to evaluate.
    pub snapshot: Option<IndicatorSnapshot>,
}

impl Classification {
    fn indeterminate() -> Self {
        Self {
            signal: ConsensusSignal::None,
            strength: SignalStrength::None,
            votes: VoteSet::default(),
            snapshot: None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SignalClassifier {
    engine: IndicatorEngine,
    thresholds: RsiThresholds,
}

impl SignalClassifier {
    pub fn new(engine: IndicatorEngine, thresholds: RsiThresholds) -> Self {
        Self { engine, thresholds }
    }

    pub fn classify(&self, snapshot: &IndicatorSnapshot) -> (ConsensusSignal, SignalStrength) {
        consensus(&VoteSet::from_snapshot(snapshot, &self.thresholds))
    }

    /// Compute indicators and classify. Short series classify as NONE, never fail.
    pub fn evaluate(&self, series: &PriceSeries) -> Classification {
        let Some(snapshot) = self.engine.compute(series) else {
            return Classification::indeterminate();
        };
        let votes = VoteSet::from_snapshot(&snapshot, &self.thresholds);
        let (signal, strength) = consensus(&votes);
        Classification {
            signal,
            strength,
            votes,
            snapshot: Some(snapshot),
        }
    }
}

impl Default for SignalClassifier {
    fn default() -> Self {
        Self::new(IndicatorEngine::default(), RsiThresholds::default())
    }
}
