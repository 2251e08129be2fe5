//! Trendwatch Scanner
//!
//! Scans the instrument universe on a fixed cadence, classifies an
//! EMA/MACD/RSI consensus per instrument and alerts when it changes.

use dotenvy::dotenv;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use trendwatch::config::{get_environment, ScannerConfig};
use trendwatch::core::http::start_server;
use trendwatch::core::{RoundScheduler, ScanOrchestrator, StateStore};
use trendwatch::logging;
use trendwatch::metrics::Metrics;
use trendwatch::services::binance::BinanceMarketDataProvider;
use trendwatch::services::{LogNotifier, MarketDataProvider, Notifier, SeriesFetcher, TelegramNotifier};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env if present
    dotenv().ok();

    logging::init_logging();

    let config = Arc::new(ScannerConfig::from_env()?);
    info!("Starting Trendwatch Scanner");
    info!(environment = %get_environment(), "Environment");
    info!(
        interval = %config.interval,
        concurrency = config.concurrency,
        round_interval_secs = config.round_interval.as_secs(),
        max_retries = config.retry.max_retries,
        none_policy = ?config.none_policy,
        "Scanner configuration loaded"
    );

    let metrics = Arc::new(Metrics::new()?);

    if let Some(port) = config.http_port {
        let metrics = metrics.clone();
        tokio::spawn(async move {
            if let Err(e) = start_server(port, metrics).await {
                error!(error = %e, "HTTP server error");
            }
        });
    }

    let provider: Arc<dyn MarketDataProvider> = Arc::new(BinanceMarketDataProvider::new(
        config.market_data_url.clone(),
        config.request_timeout,
        config.universe.clone(),
    )?);

    let http_client = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()?;
    let notifier: Arc<dyn Notifier> = match TelegramNotifier::new(&config.telegram, http_client) {
        Some(telegram) => Arc::new(telegram),
        None => {
            warn!("Alerts will be written to the log only");
            Arc::new(LogNotifier)
        }
    };

    let state = match &config.state_file {
        Some(path) => StateStore::with_snapshot(path, config.none_policy),
        None => StateStore::new(config.none_policy),
    };
    info!(instruments = state.len(), "Signal state ready");

    let fetcher = Arc::new(SeriesFetcher::new(provider.clone(), config.retry.clone()));
    let orchestrator = ScanOrchestrator::new(fetcher, config.clone()).with_metrics(metrics.clone());
    let scheduler = RoundScheduler::new(provider, orchestrator, notifier, state, config.clone())
        .with_metrics(metrics);

    scheduler.announce_startup().await;

    info!("Scanner started, waiting for shutdown signal...");
    tokio::select! {
        _ = scheduler.run() => {}
        _ = signal::ctrl_c() => {
            info!("Shutting down scanner...");
        }
    }

    Ok(())
}
