//! Price feed types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single price tick from an exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTick {
    /// Trading symbol (e.g., "BTCUSDT")
    pub symbol: String,
    /// Last traded price
    pub price: Decimal,
    /// Local timestamp when tick was received
    pub timestamp: DateTime<Utc>,
    /// Exchange event time
    pub exchange_ts: DateTime<Utc>,
}

impl PriceTick {
    /// Build a tick stamped with the current time on both clocks
    pub fn now(symbol: impl Into<String>, price: Decimal) -> Self {
        let now = Utc::now();
        Self {
            symbol: symbol.into(),
            price,
            timestamp: now,
            exchange_ts: now,
        }
    }
}

/// What a subscriber receives from the feed
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    Tick(PriceTick),
    /// The underlying connection is gone. The feed does not retry on its own.
    Disconnected,
}

/// Price feed errors
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("failed to open price feed for {symbol}: {reason}")]
    Connect { symbol: String, reason: String },
    #[error("price feed for {0} already has a subscriber")]
    Busy(String),
}
