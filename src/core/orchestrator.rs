//! One scan round: bounded-concurrency fetch and classify per instrument.

use std::sync::Arc;

use futures_util::future::join_all;
use tokio::sync::Semaphore;
use tracing::{debug, error, info};

use crate::config::ScannerConfig;
use crate::error::FetchError;
use crate::indicators::IndicatorEngine;
use crate::metrics::Metrics;
use crate::models::{Instrument, ScanResult};
use crate::services::SeriesFetcher;
use crate::signals::SignalClassifier;

pub struct ScanOrchestrator {
    fetcher: Arc<SeriesFetcher>,
    classifier: SignalClassifier,
    config: Arc<ScannerConfig>,
    metrics: Option<Arc<Metrics>>,
}

impl ScanOrchestrator {
    pub fn new(fetcher: Arc<SeriesFetcher>, config: Arc<ScannerConfig>) -> Self {
        let classifier = SignalClassifier::new(
            IndicatorEngine::new(config.indicators),
            config.thresholds,
        );
        Self {
            fetcher,
            classifier,
            config,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Scan every instrument and return once all tasks have finished.
    ///
    /// At most `concurrency` tasks hold the admission gate at a time. An
    /// instrument whose fetch fails contributes no result.
    pub async fn run_round(&self, instruments: &[Instrument]) -> Vec<ScanResult> {
        let gate = Arc::new(Semaphore::new(self.config.concurrency));

        let handles: Vec<_> = instruments
            .iter()
            .cloned()
            .map(|instrument| {
                let gate = gate.clone();
                let fetcher = self.fetcher.clone();
                let classifier = self.classifier;
                let interval = self.config.interval.clone();
                let limit = self.config.candle_limit;

                tokio::spawn(async move {
                    let _permit = gate
                        .acquire_owned()
                        .await
                        .map_err(|e| FetchError::Transport(e.to_string()))?;
                    let series = fetcher.fetch(&instrument, &interval, limit).await?;
                    let classification = classifier.evaluate(&series);

                    match &classification.snapshot {
                        Some(snapshot) => debug!(
                            symbol = %instrument,
                            price = snapshot.price,
                            rsi = snapshot.rsi,
                            ema_delta = snapshot.ema_fast.last - snapshot.ema_slow.last,
                            macd_delta = snapshot.macd_line.last - snapshot.macd_signal.last,
                            votes = ?classification.votes,
                            signal = %classification.signal,
                            "ScanOrchestrator: classified {}",
                            instrument
                        ),
                        None => debug!(
                            symbol = %instrument,
                            candles = series.len(),
                            "ScanOrchestrator: not enough history for {}",
                            instrument
                        ),
                    }

                    Ok::<_, FetchError>(ScanResult::new(
                        instrument,
                        classification.signal,
                        classification.strength,
                    ))
                })
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        let mut failures = 0usize;
        for outcome in join_all(handles).await {
            match outcome {
                Ok(Ok(result)) => results.push(result),
                Ok(Err(_)) => failures += 1,
                Err(e) => {
                    error!(error = %e, "ScanOrchestrator: scan task aborted");
                    failures += 1;
                }
            }
        }

        if let Some(metrics) = &self.metrics {
            metrics.instruments_scanned_total.inc_by(results.len() as u64);
            metrics.fetch_failures_total.inc_by(failures as u64);
        }

        info!(
            requested = instruments.len(),
            scanned = results.len(),
            failed = failures,
            "ScanOrchestrator: round scanned {} of {} instruments",
            results.len(),
            instruments.len()
        );

        results
    }
}
