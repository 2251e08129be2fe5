//! Alert message formatting (Telegram HTML).

use chrono::{DateTime, Utc};

use crate::models::{ConsensusSignal, ScanResult};

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub fn startup_message(interval: &str, source: &str, now: DateTime<Utc>) -> String {
    format!(
        "🤖 <b>EMA+MACD+RSI scanner started</b>\n⏰ {}\n🧩 Interval {} · universe: {}",
        now.format("%Y-%m-%d %H:%M:%S UTC"),
        escape_html(interval),
        escape_html(source)
    )
}

/// Digest of signals that changed this round, or `None` if there are none.
pub fn new_signals_message(fresh: &[ScanResult]) -> Option<String> {
    if fresh.is_empty() {
        return None;
    }
    let lines: Vec<String> = fresh
        .iter()
        .map(|r| {
            format!(
                "{} ➜ <b>{}</b> ({})",
                escape_html(r.instrument.as_str()),
                r.signal,
                r.strength.label()
            )
        })
        .collect();
    Some(format!("📊 <b>New signals:</b>\n{}", lines.join("\n")))
}

/// BUY/SELL counts over every result of the round.
pub fn summary_message(results: &[ScanResult], now: DateTime<Utc>) -> String {
    let buys = results
        .iter()
        .filter(|r| r.signal == ConsensusSignal::Buy)
        .count();
    let sells = results
        .iter()
        .filter(|r| r.signal == ConsensusSignal::Sell)
        .count();
    format!(
        "📈 Summary: 🟢 BUY {} | 🔴 SELL {} ({} scanned)\n⏰ {}",
        buys,
        sells,
        results.len(),
        now.format("%H:%M:%S UTC")
    )
}

pub fn universe_failure_message(consecutive: u32, error: &str) -> String {
    format!(
        "🚨 <b>Instrument list unavailable</b>\n{} consecutive failures, last error: {}",
        consecutive,
        escape_html(error)
    )
}
