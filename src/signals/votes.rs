//! One directional vote per indicator family.

use serde::{Deserialize, Serialize};

use crate::indicators::{IndicatorSnapshot, LastTwo};
use crate::models::Vote;

/// RSI band outside which the RSI family votes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RsiThresholds {
    pub oversold: f64,
    pub overbought: f64,
}

impl Default for RsiThresholds {
    fn default() -> Self {
        Self {
            oversold: 30.0,
            overbought: 70.0,
        }
    }
}

/// Votes of the three families for one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VoteSet {
    pub ema: Option<Vote>,
    pub macd: Option<Vote>,
    pub rsi: Option<Vote>,
}

impl VoteSet {
    pub fn from_snapshot(snapshot: &IndicatorSnapshot, thresholds: &RsiThresholds) -> Self {
        Self {
            ema: ema_vote(&snapshot.ema_fast, &snapshot.ema_slow),
            macd: macd_vote(&snapshot.macd_line, &snapshot.macd_signal),
            rsi: rsi_vote(snapshot.rsi, thresholds),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Vote> + '_ {
        [self.ema, self.macd, self.rsi].into_iter().flatten()
    }

    pub fn count(&self, vote: Vote) -> usize {
        self.iter().filter(|v| *v == vote).count()
    }
}

/// Sign change of `a - b` between n-2 and n-1. Touching zero is not a cross.
fn cross(a: &LastTwo, b: &LastTwo) -> Option<Vote> {
    let prev = a.prev - b.prev;
    let last = a.last - b.last;
    if prev < 0.0 && last > 0.0 {
        Some(Vote::Buy)
    } else if prev > 0.0 && last < 0.0 {
        Some(Vote::Sell)
    } else {
        None
    }
}

/// Fast EMA crossing the slow EMA.
pub fn ema_vote(fast: &LastTwo, slow: &LastTwo) -> Option<Vote> {
    cross(fast, slow)
}

/// MACD line crossing its signal line.
pub fn macd_vote(line: &LastTwo, signal: &LastTwo) -> Option<Vote> {
    cross(line, signal)
}

pub fn rsi_vote(rsi: f64, thresholds: &RsiThresholds) -> Option<Vote> {
    if rsi < thresholds.oversold {
        Some(Vote::Buy)
    } else if rsi > thresholds.overbought {
        Some(Vote::Sell)
    } else {
        None
    }
}
