//! Scanner configuration, read once from the environment at startup.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tokio::sync::Semaphore;

use crate::core::state::NonePolicy;
use crate::error::ConfigError;
use crate::indicators::IndicatorParams;
use crate::signals::RsiThresholds;

/// Deployment environment name (`ENVIRONMENT`, default `sandbox`).
pub fn get_environment() -> String {
    env::var("ENVIRONMENT").unwrap_or_else(|_| "sandbox".to_string())
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Total attempts per series fetch, including the first.
    pub max_retries: usize,
    pub base_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UniverseConfig {
    /// Fixed instrument list; empty means discover from the provider.
    pub symbols: Vec<String>,
    pub quote_asset: String,
    pub min_quote_volume: f64,
    pub max_instruments: usize,
}

impl Default for UniverseConfig {
    fn default() -> Self {
        Self {
            symbols: Vec::new(),
            quote_asset: "USDT".to_string(),
            min_quote_volume: 0.0,
            max_instruments: 100,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelegramConfig {
    pub token: String,
    pub chat_id: String,
    pub api_url: String,
}

impl TelegramConfig {
    pub fn is_configured(&self) -> bool {
        !self.token.is_empty() && !self.chat_id.is_empty()
    }
}

/// Immutable configuration shared by every component.
#[derive(Debug, Clone, PartialEq)]
pub struct ScannerConfig {
    pub interval: String,
    pub candle_limit: usize,
    pub indicators: IndicatorParams,
    pub thresholds: RsiThresholds,
    pub concurrency: usize,
    pub round_interval: Duration,
    pub retry: RetryConfig,
    pub request_timeout: Duration,
    pub error_notify_threshold: u32,
    pub universe_retry_delay: Duration,
    pub universe: UniverseConfig,
    pub market_data_url: String,
    pub telegram: TelegramConfig,
    pub state_file: Option<PathBuf>,
    pub none_policy: NonePolicy,
    pub round_summary: bool,
    pub http_port: Option<u16>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            interval: "5m".to_string(),
            candle_limit: 100,
            indicators: IndicatorParams::default(),
            thresholds: RsiThresholds::default(),
            concurrency: 10,
            round_interval: Duration::from_secs(300),
            retry: RetryConfig::default(),
            request_timeout: Duration::from_secs(10),
            error_notify_threshold: 5,
            universe_retry_delay: Duration::from_secs(30),
            universe: UniverseConfig::default(),
            market_data_url: "https://api.binance.com".to_string(),
            telegram: TelegramConfig {
                api_url: "https://api.telegram.org".to_string(),
                ..TelegramConfig::default()
            },
            state_file: None,
            none_policy: NonePolicy::Reset,
            round_summary: true,
            http_port: None,
        }
    }
}

impl ScannerConfig {
    /// Build from process environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Present-but-unparsable values are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let indicators = IndicatorParams {
            ema_fast: parse_or(&get, "EMA_FAST", defaults.indicators.ema_fast)?,
            ema_slow: parse_or(&get, "EMA_SLOW", defaults.indicators.ema_slow)?,
            macd_fast: parse_or(&get, "MACD_FAST", defaults.indicators.macd_fast)?,
            macd_slow: parse_or(&get, "MACD_SLOW", defaults.indicators.macd_slow)?,
            macd_signal: parse_or(&get, "MACD_SIGNAL", defaults.indicators.macd_signal)?,
            rsi_period: parse_or(&get, "RSI_PERIOD", defaults.indicators.rsi_period)?,
        };

        let thresholds = RsiThresholds {
            oversold: parse_or(&get, "RSI_OVERSOLD", defaults.thresholds.oversold)?,
            overbought: parse_or(&get, "RSI_OVERBOUGHT", defaults.thresholds.overbought)?,
        };

        let retry = RetryConfig {
            max_retries: parse_or(&get, "MAX_RETRIES", defaults.retry.max_retries)?,
            base_delay: Duration::from_millis(parse_or(
                &get,
                "RETRY_BASE_DELAY_MS",
                defaults.retry.base_delay.as_millis() as u64,
            )?),
        };

        let universe = UniverseConfig {
            symbols: get("SYMBOLS")
                .map(|list| {
                    list.split(',')
                        .map(|s| s.trim().to_uppercase())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            quote_asset: get("QUOTE_ASSET").unwrap_or(defaults.universe.quote_asset),
            min_quote_volume: parse_or(&get, "MIN_QUOTE_VOLUME", defaults.universe.min_quote_volume)?,
            max_instruments: parse_or(&get, "MAX_INSTRUMENTS", defaults.universe.max_instruments)?,
        };

        let telegram = TelegramConfig {
            token: get("TELEGRAM_BOT_TOKEN").unwrap_or_default(),
            chat_id: get("TELEGRAM_CHAT_ID").unwrap_or_default(),
            api_url: get("TELEGRAM_API_URL").unwrap_or(defaults.telegram.api_url),
        };

        let none_policy = if parse_or(&get, "NONE_RESETS_STATE", true)? {
            NonePolicy::Reset
        } else {
            NonePolicy::Keep
        };

        let http_port = match get("PORT") {
            Some(raw) => Some(parse_value("PORT", &raw)?),
            None => None,
        };

        let config = Self {
            interval: get("SCAN_INTERVAL").unwrap_or(defaults.interval),
            candle_limit: parse_or(&get, "CANDLE_LIMIT", defaults.candle_limit)?,
            indicators,
            thresholds,
            concurrency: parse_or(&get, "CONCURRENT_REQUESTS", defaults.concurrency)?,
            round_interval: Duration::from_secs(parse_or(
                &get,
                "SLEEP_BETWEEN_ROUNDS_SECONDS",
                defaults.round_interval.as_secs(),
            )?),
            retry,
            request_timeout: Duration::from_secs(parse_or(
                &get,
                "REQUEST_TIMEOUT_SECONDS",
                defaults.request_timeout.as_secs(),
            )?),
            error_notify_threshold: parse_or(
                &get,
                "ERROR_NOTIFY_THRESHOLD",
                defaults.error_notify_threshold,
            )?,
            universe_retry_delay: Duration::from_secs(parse_or(
                &get,
                "UNIVERSE_RETRY_DELAY_SECONDS",
                defaults.universe_retry_delay.as_secs(),
            )?),
            universe,
            market_data_url: get("MARKET_DATA_URL").unwrap_or(defaults.market_data_url),
            telegram,
            state_file: get("STATE_FILE").map(PathBuf::from),
            none_policy,
            round_summary: parse_or(&get, "ROUND_SUMMARY", defaults.round_summary)?,
            http_port,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.indicators;
        if [p.ema_fast, p.ema_slow, p.macd_fast, p.macd_slow, p.macd_signal, p.rsi_period]
            .contains(&0)
        {
            return Err(ConfigError::Validation(
                "indicator periods must be greater than zero".to_string(),
            ));
        }
        if p.ema_fast >= p.ema_slow {
            return Err(ConfigError::Validation(format!(
                "EMA_FAST ({}) must be less than EMA_SLOW ({})",
                p.ema_fast, p.ema_slow
            )));
        }
        if p.macd_fast >= p.macd_slow {
            return Err(ConfigError::Validation(format!(
                "MACD_FAST ({}) must be less than MACD_SLOW ({})",
                p.macd_fast, p.macd_slow
            )));
        }
        if self.thresholds.oversold >= self.thresholds.overbought {
            return Err(ConfigError::Validation(format!(
                "RSI_OVERSOLD ({}) must be less than RSI_OVERBOUGHT ({})",
                self.thresholds.oversold, self.thresholds.overbought
            )));
        }
        if self.concurrency == 0 {
            return Err(ConfigError::Validation(
                "CONCURRENT_REQUESTS must be greater than zero".to_string(),
            ));
        }
        if self.concurrency > Semaphore::MAX_PERMITS {
            return Err(ConfigError::Validation(format!(
                "CONCURRENT_REQUESTS ({}) exceeds the maximum of {}",
                self.concurrency,
                Semaphore::MAX_PERMITS
            )));
        }
        if self.retry.max_retries == 0 {
            return Err(ConfigError::Validation(
                "MAX_RETRIES must be at least 1".to_string(),
            ));
        }
        if self.error_notify_threshold == 0 {
            return Err(ConfigError::Validation(
                "ERROR_NOTIFY_THRESHOLD must be greater than zero".to_string(),
            ));
        }
        if self.candle_limit < p.min_series_len() {
            return Err(ConfigError::Validation(format!(
                "CANDLE_LIMIT ({}) is below the minimum series length ({})",
                self.candle_limit,
                p.min_series_len()
            )));
        }
        Ok(())
    }
}

fn parse_or<G, T>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    G: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

fn parse_value<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| ConfigError::Invalid {
        key,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}
