//! Per-series indicator snapshot: the two trailing values every crossover
//! check needs, plus the latest RSI.

use serde::{Deserialize, Serialize};

use crate::indicators::momentum::{calculate_macd, calculate_rsi};
use crate::indicators::trend::ema_series;
use crate::models::PriceSeries;

/// Indicator periods. Validated by the configuration layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorParams {
    pub ema_fast: usize,
    pub ema_slow: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub rsi_period: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            ema_fast: 9,
            ema_slow: 21,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            rsi_period: 14,
        }
    }
}

impl IndicatorParams {
    /// Shortest series that yields a snapshot.
    pub fn min_series_len(&self) -> usize {
        self.ema_slow.max(self.rsi_period).max(self.macd_slow) + 1
    }
}

/// Values at index n-2 (`prev`) and n-1 (`last`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LastTwo {
    pub prev: f64,
    pub last: f64,
}

impl LastTwo {
    fn tail(series: &[f64]) -> Option<Self> {
        match series {
            [.., prev, last] => Some(Self {
                prev: *prev,
                last: *last,
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub price: f64,
    pub ema_fast: LastTwo,
    pub ema_slow: LastTwo,
    pub macd_line: LastTwo,
    pub macd_signal: LastTwo,
    pub macd_histogram: f64,
    pub rsi: f64,
}

/// Stateless indicator computation. Every call recomputes from scratch.
#[derive(Debug, Clone, Copy)]
pub struct IndicatorEngine {
    params: IndicatorParams,
}

impl IndicatorEngine {
    pub fn new(params: IndicatorParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &IndicatorParams {
        &self.params
    }

    /// Compute the snapshot, or `None` if the series is too short (indeterminate).
    pub fn compute(&self, series: &PriceSeries) -> Option<IndicatorSnapshot> {
        let closes = series.closes();
        if closes.len() < self.params.min_series_len() {
            return None;
        }

        let ema_fast = LastTwo::tail(&ema_series(closes, self.params.ema_fast))?;
        let ema_slow = LastTwo::tail(&ema_series(closes, self.params.ema_slow))?;
        let macd = calculate_macd(
            closes,
            self.params.macd_fast,
            self.params.macd_slow,
            self.params.macd_signal,
        )?;
        let macd_line = LastTwo::tail(&macd.line)?;
        let macd_signal = LastTwo::tail(&macd.signal)?;
        let macd_histogram = macd.histogram.last().copied()?;
        let rsi = calculate_rsi(closes, self.params.rsi_period)?;

        Some(IndicatorSnapshot {
            price: series.last_price(),
            ema_fast,
            ema_slow,
            macd_line,
            macd_signal,
            macd_histogram,
            rsi,
        })
    }
}

impl Default for IndicatorEngine {
    fn default() -> Self {
        Self::new(IndicatorParams::default())
    }
}
