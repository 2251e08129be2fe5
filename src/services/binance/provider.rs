//! Binance-compatible REST market data provider.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::responses::{parse_klines, ExchangeInfo, Ticker24h};
use crate::config::UniverseConfig;
use crate::error::FetchError;
use crate::models::{Candle, Instrument};
use crate::services::market_data::MarketDataProvider;

#[derive(Clone)]
pub struct BinanceMarketDataProvider {
    client: Client,
    base_url: String,
    universe: UniverseConfig,
}

impl BinanceMarketDataProvider {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        universe: UniverseConfig,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(Self::with_client(base_url, client, universe))
    }

    pub fn with_client(base_url: impl Into<String>, client: Client, universe: UniverseConfig) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            universe,
        }
    }

    async fn get_text(&self, path: &str, query: &[(&str, String)]) -> Result<String, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.client.get(&url).query(query).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            Ok(body)
        } else {
            Err(FetchError::from_status(status.as_u16(), body))
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let body = self.get_text(path, &[]).await?;
        serde_json::from_str(&body).map_err(|e| FetchError::Malformed(e.to_string()))
    }

    /// Discover tradable symbols on the configured quote asset, drop those
    /// below the volume floor, most liquid first.
    async fn discover_universe(&self) -> Result<Vec<Instrument>, FetchError> {
        let info: ExchangeInfo = self.get_json("/api/v3/exchangeInfo").await?;
        let tickers: Vec<Ticker24h> = self.get_json("/api/v3/ticker/24hr").await?;

        let volumes: HashMap<String, f64> = tickers
            .iter()
            .map(|t| (t.symbol.clone(), t.quote_volume()))
            .collect();

        let mut listed: Vec<(String, f64)> = info
            .symbols
            .into_iter()
            .filter(|s| s.status == "TRADING" && s.quote_asset == self.universe.quote_asset)
            .map(|s| {
                let volume = volumes.get(&s.symbol).copied().unwrap_or(0.0);
                (s.symbol, volume)
            })
            .filter(|(_, volume)| *volume >= self.universe.min_quote_volume)
            .collect();

        listed.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        listed.truncate(self.universe.max_instruments);

        debug!(count = listed.len(), "BinanceMarketDataProvider: discovered {} instruments", listed.len());
        Ok(listed.into_iter().map(|(symbol, _)| Instrument::new(symbol)).collect())
    }
}

#[async_trait]
impl MarketDataProvider for BinanceMarketDataProvider {
    async fn list_instruments(&self) -> Result<Vec<Instrument>, FetchError> {
        if self.universe.symbols.is_empty() {
            return self.discover_universe().await;
        }
        Ok(self
            .universe
            .symbols
            .iter()
            .take(self.universe.max_instruments)
            .map(|s| Instrument::new(s.as_str()))
            .collect())
    }

    async fn get_candles(
        &self,
        instrument: &Instrument,
        interval: &str,
        limit: usize,
    ) -> Result<Vec<Candle>, FetchError> {
        let body = self
            .get_text(
                "/api/v3/klines",
                &[
                    ("symbol", instrument.to_string()),
                    ("interval", interval.to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;
        parse_klines(&body)
    }
}
