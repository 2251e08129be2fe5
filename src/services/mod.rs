//! Adapters to upstream data and the outbound alert channel.

pub mod binance;
pub mod fetcher;
pub mod market_data;
pub mod notifier;

pub use fetcher::{DoublingBackoff, SeriesFetcher};
pub use market_data::MarketDataProvider;
pub use notifier::{LogNotifier, Notifier, TelegramNotifier};
