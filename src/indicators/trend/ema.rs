//! EMA (Exponential Moving Average) indicator

/// Smoothing factor for a span: `2 / (span + 1)`.
pub fn ema_alpha(span: usize) -> f64 {
    2.0 / (span as f64 + 1.0)
}

/// Recursive EMA seeded from the first sample.
///
/// `ema[0] = x[0]`, `ema[i] = ema[i-1] + α·(x[i] - ema[i-1])`, which is
/// `α·x[i] + (1-α)·ema[i-1]` rearranged so a constant input stays exact. The output has the same
/// length as the input; an empty input yields an empty series.
pub fn ema_series(values: &[f64], span: usize) -> Vec<f64> {
    smooth(values, ema_alpha(span))
}

/// Last EMA value, or `None` when there are fewer samples than `span`.
pub fn calculate_ema(values: &[f64], span: usize) -> Option<f64> {
    if span == 0 || values.len() < span {
        return None;
    }
    ema_series(values, span).last().copied()
}

/// Exponential smoothing with an arbitrary factor.
fn smooth(values: &[f64], alpha: f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    let mut iter = values.iter();
    let Some(&first) = iter.next() else {
        return out;
    };
    let mut prev = first;
    out.push(prev);
    for &value in iter {
        prev += alpha * (value - prev);
        out.push(prev);
    }
    out
}
