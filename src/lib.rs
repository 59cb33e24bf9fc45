//! tradewatch: Telegram-controlled spot trading assistant
//!
//! This library provides the core components for:
//! - Real-time price feeds from Binance
//! - The price-target auto-sell engine (watch, sample, decide)
//! - Binance REST and paper trading venues
//! - RSI, Bollinger Bands and crash-reversal indicators
//! - Periodic market alerts
//! - The Telegram command surface
//! - A durable event journal
//! - Structured logging and Prometheus metrics

pub mod alerts;
pub mod bot;
pub mod cli;
pub mod config;
pub mod feed;
pub mod indicators;
pub mod journal;
pub mod notify;
pub mod telemetry;
pub mod venue;
pub mod watch;
pub mod ws;
