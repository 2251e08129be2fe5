//! Trendwatch: periodic EMA/MACD/RSI consensus scanner with change-only alerting.

pub mod config;
pub mod core;
pub mod error;
pub mod indicators;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod signals;
