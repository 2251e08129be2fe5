//! Binance-compatible REST adapter.

pub mod provider;
pub mod responses;

pub use provider::BinanceMarketDataProvider;
