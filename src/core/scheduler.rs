//! Repeat-forever round loop with latched escalation on universe failures.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{error, info, warn};

use crate::config::ScannerConfig;
use crate::core::alerts;
use crate::core::orchestrator::ScanOrchestrator;
use crate::core::state::StateStore;
use crate::metrics::Metrics;
use crate::models::ScanResult;
use crate::services::{MarketDataProvider, Notifier};

/// Consecutive universe-fetch failures. Fires once per streak at the threshold.
#[derive(Debug, Clone)]
pub struct FailureCounter {
    count: u32,
    threshold: u32,
    alerted: bool,
}

impl FailureCounter {
    pub fn new(threshold: u32) -> Self {
        Self {
            count: 0,
            threshold,
            alerted: false,
        }
    }

    /// Returns `true` exactly when this failure should raise the operator alert.
    pub fn record_failure(&mut self) -> bool {
        self.count = self.count.saturating_add(1);
        if self.count >= self.threshold && !self.alerted {
            self.alerted = true;
            return true;
        }
        false
    }

    pub fn record_success(&mut self) {
        self.count = 0;
        self.alerted = false;
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RoundOutcome {
    Completed {
        scanned: usize,
        new_signals: Vec<ScanResult>,
    },
    UniverseUnavailable {
        consecutive: u32,
        alerted: bool,
    },
}

pub struct RoundScheduler {
    provider: Arc<dyn MarketDataProvider>,
    orchestrator: ScanOrchestrator,
    notifier: Arc<dyn Notifier>,
    state: StateStore,
    failures: FailureCounter,
    config: Arc<ScannerConfig>,
    metrics: Option<Arc<Metrics>>,
}

impl RoundScheduler {
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        orchestrator: ScanOrchestrator,
        notifier: Arc<dyn Notifier>,
        state: StateStore,
        config: Arc<ScannerConfig>,
    ) -> Self {
        Self {
            provider,
            orchestrator,
            notifier,
            state,
            failures: FailureCounter::new(config.error_notify_threshold),
            config,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn state(&self) -> &StateStore {
        &self.state
    }

    pub fn failures(&self) -> &FailureCounter {
        &self.failures
    }

    /// Delay before the next step after `outcome`.
    pub fn next_delay(&self, outcome: &RoundOutcome) -> Duration {
        match outcome {
            RoundOutcome::Completed { .. } => self.config.round_interval,
            RoundOutcome::UniverseUnavailable { .. } => self.config.universe_retry_delay,
        }
    }

    pub async fn announce_startup(&self) {
        let source = if self.config.universe.symbols.is_empty() {
            format!("top {} by volume", self.config.universe.max_instruments)
        } else {
            format!("{} configured symbols", self.config.universe.symbols.len())
        };
        self.notify(&alerts::startup_message(&self.config.interval, &source, Utc::now()))
            .await;
    }

    /// Run rounds until the process is stopped.
    pub async fn run(mut self) {
        info!(
            interval = %self.config.interval,
            round_interval_secs = self.config.round_interval.as_secs(),
            "RoundScheduler: started"
        );
        loop {
            let outcome = self.step().await;
            tokio::time::sleep(self.next_delay(&outcome)).await;
        }
    }

    /// One pass of the state machine: fetch the universe, then scan or back off.
    pub async fn step(&mut self) -> RoundOutcome {
        let instruments = match self.provider.list_instruments().await {
            Ok(instruments) => instruments,
            Err(e) => {
                let alert = self.failures.record_failure();
                let consecutive = self.failures.count();
                warn!(
                    error = %e,
                    consecutive = consecutive,
                    "RoundScheduler: failed to fetch instrument universe ({} in a row)",
                    consecutive
                );
                if let Some(metrics) = &self.metrics {
                    metrics.universe_failures_total.inc();
                    metrics.consecutive_universe_failures.set(consecutive as i64);
                }
                if alert {
                    self.notify(&alerts::universe_failure_message(consecutive, &e.to_string()))
                        .await;
                }
                return RoundOutcome::UniverseUnavailable {
                    consecutive,
                    alerted: alert,
                };
            }
        };

        self.failures.record_success();
        if let Some(metrics) = &self.metrics {
            metrics.consecutive_universe_failures.set(0);
        }

        let started = Instant::now();
        let results = self.orchestrator.run_round(&instruments).await;
        let fresh = self.state.diff(&results);

        for signal in &fresh {
            info!(
                symbol = %signal.instrument,
                signal = %signal.signal,
                strength = signal.strength.label(),
                "RoundScheduler: new signal {} for {}",
                signal.signal,
                signal.instrument
            );
        }

        if let Some(message) = alerts::new_signals_message(&fresh) {
            self.notify(&message).await;
        } else {
            info!("RoundScheduler: no new signals this round");
        }
        if self.config.round_summary {
            self.notify(&alerts::summary_message(&results, Utc::now())).await;
        }

        self.state.persist();

        if let Some(metrics) = &self.metrics {
            metrics.rounds_total.inc();
            metrics.signals_emitted_total.inc_by(fresh.len() as u64);
            metrics
                .round_duration_seconds
                .observe(started.elapsed().as_secs_f64());
        }

        RoundOutcome::Completed {
            scanned: results.len(),
            new_signals: fresh,
        }
    }

    /// Send and swallow failures.
    async fn notify(&self, text: &str) {
        if let Err(e) = self.notifier.send(text).await {
            error!(error = %e, "RoundScheduler: failed to send notification");
            if let Some(metrics) = &self.metrics {
                metrics.notifications_failed_total.inc();
            }
        }
    }
}
