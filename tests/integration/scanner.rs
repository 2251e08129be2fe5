//! Integration tests for scan rounds: orchestrator fan-out and the scheduler loop

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tempfile::TempDir;
use trendwatch::config::ScannerConfig;
use trendwatch::core::{NonePolicy, RoundOutcome, RoundScheduler, ScanOrchestrator, StateStore};
use trendwatch::error::FetchError;
use trendwatch::metrics::Metrics;
use trendwatch::models::{ConsensusSignal, Instrument, SignalStrength};
use trendwatch::services::{MarketDataProvider, SeriesFetcher};

use crate::fixtures::{blowoff_top, capitulation_bounce};
use crate::test_utils::{test_config, RecordingNotifier, ScriptedProvider};

fn orchestrator(provider: &Arc<ScriptedProvider>, config: &Arc<ScannerConfig>) -> ScanOrchestrator {
    let fetcher = Arc::new(SeriesFetcher::new(provider.clone(), config.retry.clone()));
    ScanOrchestrator::new(fetcher, config.clone())
}

fn scheduler(
    provider: &Arc<ScriptedProvider>,
    notifier: &Arc<RecordingNotifier>,
    config: ScannerConfig,
    state: StateStore,
) -> RoundScheduler {
    let config = Arc::new(config);
    RoundScheduler::new(
        provider.clone(),
        orchestrator(provider, &config),
        notifier.clone(),
        state,
        config,
    )
}

fn universe_down(rounds: usize) -> Vec<Result<Vec<Instrument>, FetchError>> {
    (0..rounds)
        .map(|_| Err(FetchError::Server { status: 503 }))
        .collect()
}

#[tokio::test(start_paused = true)]
async fn round_respects_concurrency_limit() {
    let symbols: Vec<String> = (0..12).map(|i| format!("SYM{}USDT", i)).collect();
    let refs: Vec<&str> = symbols.iter().map(String::as_str).collect();
    let provider =
        Arc::new(ScriptedProvider::new(&refs).with_latency(Duration::from_millis(50)));
    let config = Arc::new(test_config());

    let instruments = provider.list_instruments().await.expect("universe");
    let started = tokio::time::Instant::now();
    let results = orchestrator(&provider, &config).run_round(&instruments).await;

    assert_eq!(results.len(), 12);
    assert_eq!(provider.max_in_flight(), 3);
    // Four waves of three
    assert!(started.elapsed() >= Duration::from_millis(200));
}

#[tokio::test(start_paused = true)]
async fn failed_instrument_is_dropped_from_round() {
    let provider = Arc::new(ScriptedProvider::new(&["BTCUSDT", "DELISTED", "ETHUSDT"]));
    provider.fail_always(
        "DELISTED",
        FetchError::Status {
            status: 400,
            body: "Invalid symbol.".to_string(),
        },
    );
    let config = Arc::new(test_config());

    let instruments = provider.list_instruments().await.expect("universe");
    let results = orchestrator(&provider, &config).run_round(&instruments).await;

    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.instrument.as_str() != "DELISTED"));
}

#[tokio::test(start_paused = true)]
async fn round_classifies_each_instrument() {
    let provider = Arc::new(ScriptedProvider::new(&["UPUSDT", "DOWNUSDT", "FLATUSDT"]));
    provider.set_closes("UPUSDT", capitulation_bounce());
    provider.set_closes("DOWNUSDT", blowoff_top());
    let config = Arc::new(test_config());

    let instruments = provider.list_instruments().await.expect("universe");
    let results = orchestrator(&provider, &config).run_round(&instruments).await;

    let signal_of = |symbol: &str| {
        results
            .iter()
            .find(|r| r.instrument.as_str() == symbol)
            .map(|r| (r.signal, r.strength))
    };
    assert_eq!(
        signal_of("UPUSDT"),
        Some((ConsensusSignal::Buy, SignalStrength::Strong))
    );
    assert_eq!(
        signal_of("DOWNUSDT"),
        Some((ConsensusSignal::Sell, SignalStrength::Strong))
    );
    assert_eq!(
        signal_of("FLATUSDT"),
        Some((ConsensusSignal::None, SignalStrength::None))
    );
}

#[tokio::test(start_paused = true)]
async fn universe_failures_alert_once_per_streak() {
    let provider = Arc::new(ScriptedProvider::new(&["BTCUSDT"]));
    let notifier = Arc::new(RecordingNotifier::new());
    let mut scheduler = scheduler(
        &provider,
        &notifier,
        test_config(),
        StateStore::new(NonePolicy::Reset),
    );

    provider.script_universe(universe_down(7));
    let mut alerted = Vec::new();
    for _ in 0..7 {
        match scheduler.step().await {
            RoundOutcome::UniverseUnavailable { alerted: fired, .. } => alerted.push(fired),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }
    assert_eq!(alerted, vec![false, false, false, false, true, false, false]);
    assert_eq!(notifier.count_containing("Instrument list unavailable"), 1);
    assert_eq!(provider.total_calls(), 0);

    // Recovery re-arms the alert
    let outcome = scheduler.step().await;
    assert!(matches!(outcome, RoundOutcome::Completed { scanned: 1, .. }));
    assert_eq!(scheduler.failures().count(), 0);

    provider.script_universe(universe_down(5));
    for _ in 0..5 {
        scheduler.step().await;
    }
    assert_eq!(notifier.count_containing("Instrument list unavailable"), 2);
}

#[tokio::test(start_paused = true)]
async fn repeated_signal_alerts_only_on_change() {
    let provider = Arc::new(ScriptedProvider::new(&["BTCUSDT"]));
    let notifier = Arc::new(RecordingNotifier::new());
    let mut scheduler = scheduler(
        &provider,
        &notifier,
        test_config(),
        StateStore::new(NonePolicy::Reset),
    );

    provider.set_closes("BTCUSDT", capitulation_bounce());
    let first = scheduler.step().await;
    let second = scheduler.step().await;

    match first {
        RoundOutcome::Completed { new_signals, .. } => {
            assert_eq!(new_signals.len(), 1);
            assert_eq!(new_signals[0].signal, ConsensusSignal::Buy);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert!(matches!(
        second,
        RoundOutcome::Completed { ref new_signals, .. } if new_signals.is_empty()
    ));
    assert_eq!(notifier.count_containing("New signals"), 1);

    // A quiet round resets the stored signal, so the next BUY alerts again
    provider.set_closes("BTCUSDT", vec![100.0; 50]);
    scheduler.step().await;
    assert_eq!(
        scheduler.state().get(&Instrument::new("BTCUSDT")),
        Some(ConsensusSignal::None)
    );
    provider.set_closes("BTCUSDT", capitulation_bounce());
    scheduler.step().await;
    assert_eq!(notifier.count_containing("New signals"), 2);
}

#[tokio::test(start_paused = true)]
async fn keep_policy_suppresses_realert_after_quiet_round() {
    let provider = Arc::new(ScriptedProvider::new(&["BTCUSDT"]));
    let notifier = Arc::new(RecordingNotifier::new());
    let mut scheduler = scheduler(
        &provider,
        &notifier,
        test_config(),
        StateStore::new(NonePolicy::Keep),
    );

    provider.set_closes("BTCUSDT", capitulation_bounce());
    scheduler.step().await;
    scheduler.step().await;
    provider.set_closes("BTCUSDT", vec![100.0; 50]);
    scheduler.step().await;
    provider.set_closes("BTCUSDT", capitulation_bounce());
    scheduler.step().await;

    assert_eq!(notifier.count_containing("New signals"), 1);
    assert_eq!(
        scheduler.state().get(&Instrument::new("BTCUSDT")),
        Some(ConsensusSignal::Buy)
    );
}

#[tokio::test(start_paused = true)]
async fn round_summary_is_sent_every_round() {
    let provider = Arc::new(ScriptedProvider::new(&["BTCUSDT", "ETHUSDT"]));
    provider.set_closes("BTCUSDT", capitulation_bounce());
    let notifier = Arc::new(RecordingNotifier::new());
    let config = ScannerConfig {
        round_summary: true,
        ..test_config()
    };
    let mut scheduler = scheduler(&provider, &notifier, config, StateStore::new(NonePolicy::Reset));

    scheduler.step().await;
    scheduler.step().await;

    let messages = notifier.messages();
    assert_eq!(notifier.count_containing("Summary"), 2);
    assert!(messages
        .iter()
        .any(|m| m.contains("BUY 1") && m.contains("2 scanned")));
}

#[tokio::test(start_paused = true)]
async fn notification_failure_does_not_abort_round() {
    let provider = Arc::new(ScriptedProvider::new(&["BTCUSDT"]));
    provider.set_closes("BTCUSDT", capitulation_bounce());
    let notifier = Arc::new(RecordingNotifier::failing());
    let metrics = Arc::new(Metrics::new().expect("metrics"));
    let mut scheduler = scheduler(
        &provider,
        &notifier,
        test_config(),
        StateStore::new(NonePolicy::Reset),
    )
    .with_metrics(metrics.clone());

    let outcome = scheduler.step().await;

    assert!(matches!(outcome, RoundOutcome::Completed { .. }));
    assert_eq!(
        scheduler.state().get(&Instrument::new("BTCUSDT")),
        Some(ConsensusSignal::Buy)
    );
    assert_eq!(metrics.notifications_failed_total.get(), 1);
    assert_eq!(metrics.rounds_total.get(), 1);
    assert_eq!(metrics.signals_emitted_total.get(), 1);
}

#[tokio::test(start_paused = true)]
async fn state_snapshot_is_written_after_round() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("signals.json");
    let provider = Arc::new(ScriptedProvider::new(&["BTCUSDT", "ETHUSDT"]));
    provider.set_closes("BTCUSDT", capitulation_bounce());
    let notifier = Arc::new(RecordingNotifier::new());
    let mut scheduler = scheduler(
        &provider,
        &notifier,
        test_config(),
        StateStore::with_snapshot(&path, NonePolicy::Reset),
    );

    scheduler.step().await;

    let raw: Value =
        serde_json::from_str(&std::fs::read_to_string(&path).expect("snapshot written"))
            .expect("json");
    assert_eq!(raw["BTCUSDT"], "BUY");
    assert!(raw["ETHUSDT"].is_null());
}

#[tokio::test(start_paused = true)]
async fn delay_depends_on_outcome() {
    let provider = Arc::new(ScriptedProvider::new(&["BTCUSDT"]));
    let notifier = Arc::new(RecordingNotifier::new());
    let config = ScannerConfig {
        round_interval: Duration::from_secs(300),
        universe_retry_delay: Duration::from_secs(30),
        ..test_config()
    };
    let mut scheduler = scheduler(&provider, &notifier, config, StateStore::new(NonePolicy::Reset));

    provider.script_universe(universe_down(1));
    let failed = scheduler.step().await;
    let completed = scheduler.step().await;

    assert_eq!(scheduler.next_delay(&failed), Duration::from_secs(30));
    assert_eq!(scheduler.next_delay(&completed), Duration::from_secs(300));
}

#[tokio::test(start_paused = true)]
async fn startup_announcement_is_sent() {
    let provider = Arc::new(ScriptedProvider::new(&["BTCUSDT"]));
    let notifier = Arc::new(RecordingNotifier::new());
    let scheduler = scheduler(
        &provider,
        &notifier,
        test_config(),
        StateStore::new(NonePolicy::Reset),
    );

    scheduler.announce_startup().await;

    let messages = notifier.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("scanner started"));
    assert!(messages[0].contains("Interval 5m"));
}
