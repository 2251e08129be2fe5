//! Integration tests for the Binance REST adapter against a mocked exchange

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use trendwatch::config::{RetryConfig, UniverseConfig};
use trendwatch::error::FetchError;
use trendwatch::models::Instrument;
use trendwatch::services::binance::BinanceMarketDataProvider;
use trendwatch::services::{MarketDataProvider, SeriesFetcher};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn kline_rows(closes: &[f64]) -> serde_json::Value {
    let rows: Vec<serde_json::Value> = closes
        .iter()
        .enumerate()
        .map(|(i, close)| {
            let open = 1_700_000_000_000i64 + i as i64 * 300_000;
            json!([
                open,
                close.to_string(),
                close.to_string(),
                close.to_string(),
                close.to_string(),
                "10.0",
                open + 299_999,
                "1000.0",
                42,
                "5.0",
                "500.0",
                "0"
            ])
        })
        .collect();
    json!(rows)
}

fn provider(server: &MockServer, universe: UniverseConfig) -> BinanceMarketDataProvider {
    BinanceMarketDataProvider::new(server.uri(), Duration::from_secs(5), universe)
        .expect("client builds")
}

#[tokio::test]
async fn klines_are_requested_with_symbol_interval_and_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/klines"))
        .and(query_param("symbol", "BTCUSDT"))
        .and(query_param("interval", "5m"))
        .and(query_param("limit", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(kline_rows(&[1.5, 2.5, 3.5])))
        .expect(1)
        .mount(&server)
        .await;

    let candles = provider(&server, UniverseConfig::default())
        .get_candles(&Instrument::new("BTCUSDT"), "5m", 3)
        .await
        .expect("klines parse");

    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    assert_eq!(closes, vec![1.5, 2.5, 3.5]);
    assert!(candles[0].open_time < candles[1].open_time);
}

#[tokio::test]
async fn rate_limited_request_is_retried_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/klines"))
        .respond_with(ResponseTemplate::new(429).set_body_string("Too many requests"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v3/klines"))
        .respond_with(ResponseTemplate::new(200).set_body_json(kline_rows(&[10.0, 11.0])))
        .mount(&server)
        .await;

    let fetcher = SeriesFetcher::new(
        Arc::new(provider(&server, UniverseConfig::default())),
        RetryConfig {
            max_retries: 3,
            base_delay: Duration::from_millis(10),
        },
    );
    let series = fetcher
        .fetch(&Instrument::new("ETHUSDT"), "1h", 2)
        .await
        .expect("second attempt succeeds");

    assert_eq!(series.last_price(), 11.0);
    let requests = server.received_requests().await.expect("requests recorded");
    assert_eq!(requests.len(), 2);
}

#[tokio::test]
async fn client_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/klines"))
        .respond_with(
            ResponseTemplate::new(400).set_body_string(r#"{"code":-1121,"msg":"Invalid symbol."}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = SeriesFetcher::new(
        Arc::new(provider(&server, UniverseConfig::default())),
        RetryConfig {
            max_retries: 3,
            base_delay: Duration::from_millis(10),
        },
    );
    let err = fetcher
        .fetch(&Instrument::new("NOPE"), "5m", 50)
        .await
        .unwrap_err();

    match err {
        FetchError::Status { status, body } => {
            assert_eq!(status, 400);
            assert!(body.contains("Invalid symbol"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn malformed_klines_body_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/klines"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = provider(&server, UniverseConfig::default())
        .get_candles(&Instrument::new("BTCUSDT"), "5m", 50)
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Malformed(_)));
}

#[tokio::test]
async fn universe_is_filtered_sorted_and_capped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/exchangeInfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "timezone": "UTC",
            "symbols": [
                {"symbol": "BTCUSDT", "status": "TRADING", "baseAsset": "BTC", "quoteAsset": "USDT"},
                {"symbol": "ETHUSDT", "status": "TRADING", "baseAsset": "ETH", "quoteAsset": "USDT"},
                {"symbol": "SOLUSDT", "status": "TRADING", "baseAsset": "SOL", "quoteAsset": "USDT"},
                {"symbol": "DOGEUSDT", "status": "TRADING", "baseAsset": "DOGE", "quoteAsset": "USDT"},
                {"symbol": "LUNAUSDT", "status": "BREAK", "baseAsset": "LUNA", "quoteAsset": "USDT"},
                {"symbol": "ETHBTC", "status": "TRADING", "baseAsset": "ETH", "quoteAsset": "BTC"}
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v3/ticker/24hr"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"symbol": "BTCUSDT", "quoteVolume": "900000.0"},
            {"symbol": "ETHUSDT", "quoteVolume": "500000.0"},
            {"symbol": "SOLUSDT", "quoteVolume": "700000.0"},
            {"symbol": "DOGEUSDT", "quoteVolume": "50.0"},
            {"symbol": "LUNAUSDT", "quoteVolume": "99999999.0"},
            {"symbol": "ETHBTC", "quoteVolume": "99999999.0"}
        ])))
        .mount(&server)
        .await;

    let universe = UniverseConfig {
        min_quote_volume: 1000.0,
        max_instruments: 2,
        ..UniverseConfig::default()
    };
    let instruments = provider(&server, universe)
        .list_instruments()
        .await
        .expect("universe");

    assert_eq!(
        instruments,
        vec![Instrument::new("BTCUSDT"), Instrument::new("SOLUSDT")]
    );
}

#[tokio::test]
async fn configured_symbols_skip_discovery() {
    let server = MockServer::start().await;
    let universe = UniverseConfig {
        symbols: vec!["BTCUSDT".to_string(), "ETHUSDT".to_string()],
        ..UniverseConfig::default()
    };

    let instruments = provider(&server, universe)
        .list_instruments()
        .await
        .expect("static universe");

    assert_eq!(instruments.len(), 2);
    let requests = server.received_requests().await.expect("requests recorded");
    assert!(requests.is_empty());
}

#[tokio::test]
async fn universe_server_error_is_transient() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/exchangeInfo"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let err = provider(&server, UniverseConfig::default())
        .list_instruments()
        .await
        .unwrap_err();

    assert_eq!(err, FetchError::Server { status: 502 });
    assert!(err.is_transient());
}
