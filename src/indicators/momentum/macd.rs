//! MACD (Moving Average Convergence Divergence) indicator

use crate::indicators::trend::ema_series;

/// Full MACD series aligned with the input closes.
#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub line: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

/// Calculate MACD
///
/// MACD = EMA(fast) - EMA(slow)
/// Signal = EMA(signal) of MACD
/// Histogram = MACD - Signal
pub fn calculate_macd(
    closes: &[f64],
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
) -> Option<MacdSeries> {
    if closes.len() < slow_period || fast_period == 0 || signal_period == 0 {
        return None;
    }

    let fast = ema_series(closes, fast_period);
    let slow = ema_series(closes, slow_period);
    let line: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
    let signal = ema_series(&line, signal_period);
    let histogram = line.iter().zip(&signal).map(|(m, s)| m - s).collect();

    Some(MacdSeries {
        line,
        signal,
        histogram,
    })
}

/// Calculate MACD with default periods (12, 26, 9)
pub fn calculate_macd_default(closes: &[f64]) -> Option<MacdSeries> {
    calculate_macd(closes, 12, 26, 9)
}
