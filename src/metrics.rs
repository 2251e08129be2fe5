//! Prometheus metrics for the scan loop.

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder};

pub struct Metrics {
    registry: Registry,
    pub rounds_total: IntCounter,
    pub instruments_scanned_total: IntCounter,
    pub fetch_failures_total: IntCounter,
    pub signals_emitted_total: IntCounter,
    pub notifications_failed_total: IntCounter,
    pub universe_failures_total: IntCounter,
    pub consecutive_universe_failures: IntGauge,
    pub round_duration_seconds: Histogram,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let rounds_total = IntCounter::new("scan_rounds_total", "Completed scan rounds")?;
        let instruments_scanned_total = IntCounter::new(
            "scan_instruments_total",
            "Instruments classified across all rounds",
        )?;
        let fetch_failures_total = IntCounter::new(
            "scan_fetch_failures_total",
            "Series fetches that failed after retries",
        )?;
        let signals_emitted_total =
            IntCounter::new("scan_signals_emitted_total", "New signals alerted")?;
        let notifications_failed_total = IntCounter::new(
            "scan_notifications_failed_total",
            "Notifications that could not be delivered",
        )?;
        let universe_failures_total = IntCounter::new(
            "scan_universe_failures_total",
            "Failed instrument universe fetches",
        )?;
        let consecutive_universe_failures = IntGauge::new(
            "scan_consecutive_universe_failures",
            "Current streak of failed universe fetches",
        )?;
        let round_duration_seconds = Histogram::with_opts(
            HistogramOpts::new("scan_round_duration_seconds", "Wall time of one scan round")
                .buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0]),
        )?;

        registry.register(Box::new(rounds_total.clone()))?;
        registry.register(Box::new(instruments_scanned_total.clone()))?;
        registry.register(Box::new(fetch_failures_total.clone()))?;
        registry.register(Box::new(signals_emitted_total.clone()))?;
        registry.register(Box::new(notifications_failed_total.clone()))?;
        registry.register(Box::new(universe_failures_total.clone()))?;
        registry.register(Box::new(consecutive_universe_failures.clone()))?;
        registry.register(Box::new(round_duration_seconds.clone()))?;

        Ok(Self {
            registry,
            rounds_total,
            instruments_scanned_total,
            fetch_failures_total,
            signals_emitted_total,
            notifications_failed_total,
            universe_failures_total,
            consecutive_universe_failures,
            round_duration_seconds,
        })
    }

    /// Render all metrics in the Prometheus text format.
    pub fn export(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
