use serde::{Deserialize, Serialize};
use std::fmt;

use super::market::Instrument;

/// Directional vote cast by a single indicator family. Absence is `Option::None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Vote {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConsensusSignal {
    Buy,
    Sell,
    None,
}

impl ConsensusSignal {
    pub fn is_actionable(&self) -> bool {
        !matches!(self, ConsensusSignal::None)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConsensusSignal::Buy => "BUY",
            ConsensusSignal::Sell => "SELL",
            ConsensusSignal::None => "NONE",
        }
    }
}

impl fmt::Display for ConsensusSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Annotation on top of the 2-of-3 rule: unanimous votes are strong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalStrength {
    Strong,
    Weak,
    None,
}

impl SignalStrength {
    pub fn label(&self) -> &'static str {
        match self {
            SignalStrength::Strong => "strong",
            SignalStrength::Weak => "weak",
            SignalStrength::None => "none",
        }
    }
}

/// Outcome for one instrument in one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub instrument: Instrument,
    pub signal: ConsensusSignal,
    pub strength: SignalStrength,
}

impl ScanResult {
    pub fn new(instrument: Instrument, signal: ConsensusSignal, strength: SignalStrength) -> Self {
        Self {
            instrument,
            signal,
            strength,
        }
    }
}
