use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque instrument identifier (exchange symbol).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Instrument(String);

impl Instrument {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Instrument {
    fn from(symbol: &str) -> Self {
        Self::new(symbol)
    }
}

/// The only candle fields the scanner consumes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: DateTime<Utc>,
    pub close: f64,
}

impl Candle {
    pub fn new(open_time: DateTime<Utc>, close: f64) -> Self {
        Self { open_time, close }
    }
}

/// Chronologically ordered closing prices for one instrument. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    closes: Vec<f64>,
}

impl PriceSeries {
    /// Returns `None` for an empty input.
    pub fn new(closes: Vec<f64>) -> Option<Self> {
        if closes.is_empty() {
            None
        } else {
            Some(Self { closes })
        }
    }

    pub fn from_candles(candles: &[Candle]) -> Option<Self> {
        Self::new(candles.iter().map(|c| c.close).collect())
    }

    pub fn closes(&self) -> &[f64] {
        &self.closes
    }

    pub fn len(&self) -> usize {
        self.closes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    pub fn last_price(&self) -> f64 {
        self.closes[self.closes.len() - 1]
    }
}
