//! RSI (Relative Strength Index) indicator

/// Calculate RSI with Wilder smoothing (`α = 1/period`).
///
/// Average gain and loss are seeded from the first price change and then
/// smoothed recursively. RSI = 100 - (100 / (1 + avgGain/avgLoss)).
/// A zero average loss saturates at 100; a series with no movement at all
/// reads 50.
pub fn calculate_rsi(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period + 1 {
        return None;
    }

    let alpha = 1.0 / period as f64;
    let mut deltas = closes.windows(2).map(|w| w[1] - w[0]);
    let first = deltas.next()?;
    let mut avg_gain = first.max(0.0);
    let mut avg_loss = (-first).max(0.0);

    for change in deltas {
        avg_gain += alpha * (change.max(0.0) - avg_gain);
        avg_loss += alpha * ((-change).max(0.0) - avg_loss);
    }

    Some(rsi_from_averages(avg_gain, avg_loss))
}

/// Calculate RSI with default period (14)
pub fn calculate_rsi_default(closes: &[f64]) -> Option<f64> {
    calculate_rsi(closes, 14)
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain == 0.0 {
            return 50.0;
        }
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}
