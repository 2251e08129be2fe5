//! Wire shapes of the Binance-compatible REST endpoints.

use serde::Deserialize;
use serde_json::Value;

use crate::error::FetchError;
use crate::models::Candle;
use chrono::{TimeZone, Utc};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeInfo {
    pub symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolInfo {
    pub symbol: String,
    pub status: String,
    pub quote_asset: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticker24h {
    pub symbol: String,
    pub quote_volume: String,
}

impl Ticker24h {
    pub fn quote_volume(&self) -> f64 {
        self.quote_volume.parse().unwrap_or(0.0)
    }
}

/// Parse a klines body: an array of arrays, open time at index 0, close at index 4.
pub fn parse_klines(body: &str) -> Result<Vec<Candle>, FetchError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| FetchError::Malformed(e.to_string()))?;
    let rows = value
        .as_array()
        .ok_or_else(|| FetchError::Malformed(format!("expected kline array, got: {}", value)))?;

    rows.iter().map(parse_kline_row).collect()
}

fn parse_kline_row(row: &Value) -> Result<Candle, FetchError> {
    let fields = row
        .as_array()
        .filter(|f| f.len() > 4)
        .ok_or_else(|| FetchError::Malformed(format!("invalid kline row: {}", row)))?;

    let open_ms = fields[0]
        .as_i64()
        .ok_or_else(|| FetchError::Malformed(format!("invalid open time: {}", fields[0])))?;
    let open_time = Utc
        .timestamp_millis_opt(open_ms)
        .single()
        .ok_or_else(|| FetchError::Malformed(format!("invalid open time: {}", open_ms)))?;

    let close = match &fields[4] {
        Value::String(s) => s.parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
    .filter(|c| c.is_finite())
    .ok_or_else(|| FetchError::Malformed(format!("invalid close price: {}", fields[4])))?;

    Ok(Candle::new(open_time, close))
}
