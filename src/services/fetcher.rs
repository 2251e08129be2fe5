//! Price series retrieval with bounded retries and exponential backoff.

use std::sync::Arc;
use std::time::Duration;

use backon::{BackoffBuilder, Retryable};
use tracing::{debug, warn};

use crate::config::RetryConfig;
use crate::error::FetchError;
use crate::models::{Instrument, PriceSeries};
use crate::services::market_data::MarketDataProvider;

/// Backoff schedule: `base`, `2·base`, `4·base`, ... without jitter,
/// yielding `max_retries - 1` delays so the total attempt count is `max_retries`.
/// Delays saturate at `Duration::MAX` instead of wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoublingBackoff {
    base: Duration,
    retries: usize,
}

impl DoublingBackoff {
    pub fn new(retry: &RetryConfig) -> Self {
        Self {
            base: retry.base_delay,
            retries: retry.max_retries.saturating_sub(1),
        }
    }
}

impl BackoffBuilder for DoublingBackoff {
    type Backoff = DoublingDelays;

    fn build(self) -> Self::Backoff {
        DoublingDelays {
            next: self.base,
            remaining: self.retries,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DoublingDelays {
    next: Duration,
    remaining: usize,
}

impl Iterator for DoublingDelays {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let delay = self.next;
        self.next = delay.saturating_mul(2);
        Some(delay)
    }
}

pub struct SeriesFetcher {
    provider: Arc<dyn MarketDataProvider>,
    retry: RetryConfig,
}

impl SeriesFetcher {
    pub fn new(provider: Arc<dyn MarketDataProvider>, retry: RetryConfig) -> Self {
        Self { provider, retry }
    }

    pub fn backoff(&self) -> DoublingBackoff {
        DoublingBackoff::new(&self.retry)
    }

    /// Fetch one instrument's closes. Transient failures are retried; the
    /// final error is returned for the caller to skip the instrument.
    pub async fn fetch(
        &self,
        instrument: &Instrument,
        interval: &str,
        limit: usize,
    ) -> Result<PriceSeries, FetchError> {
        let attempt = || async move {
            let candles = self
                .provider
                .get_candles(instrument, interval, limit)
                .await?;
            PriceSeries::from_candles(&candles)
                .ok_or_else(|| FetchError::Malformed("empty candle list".to_string()))
        };

        attempt
            .retry(self.backoff())
            .sleep(tokio::time::sleep)
            .when(FetchError::is_transient)
            .notify(|err: &FetchError, delay: Duration| {
                debug!(
                    symbol = %instrument,
                    error = %err,
                    delay_ms = delay.as_millis() as u64,
                    "SeriesFetcher: transient failure for {}, retrying in {:?}",
                    instrument,
                    delay
                );
            })
            .await
            .map_err(|err| {
                warn!(symbol = %instrument, error = %err, "SeriesFetcher: giving up on {}", instrument);
                err
            })
    }
}
