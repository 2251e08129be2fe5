//! Market data provider interface.

use async_trait::async_trait;

use crate::error::FetchError;
use crate::models::{Candle, Instrument};

/// Upstream source of the instrument universe and price history.
///
/// Each call is a single attempt; retry policy lives in `SeriesFetcher`.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Instruments to scan this round.
    async fn list_instruments(&self) -> Result<Vec<Instrument>, FetchError>;

    /// Chronologically ordered candles for one instrument.
    async fn get_candles(
        &self,
        instrument: &Instrument,
        interval: &str,
        limit: usize,
    ) -> Result<Vec<Candle>, FetchError>;
}
