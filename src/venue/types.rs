//! Trading venue types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Order side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An order acknowledged by the venue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderResult {
    /// Venue order identifier
    pub order_id: String,
    pub symbol: String,
    pub side: Side,
    /// Limit price
    pub price: Decimal,
    /// Ordered base quantity
    pub quantity: Decimal,
    /// Venue status string (NEW, FILLED, ...)
    pub status: String,
}

impl fmt::Display for OrderResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} {} {} @ {} ({})",
            self.order_id, self.side, self.quantity, self.symbol, self.price, self.status
        )
    }
}

/// OHLCV candle. Analytics run on `f64`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Trading venue errors
#[derive(Debug, Error)]
pub enum VenueError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Venue rejected request ({code}): {msg}")]
    Api { code: i64, msg: String },
    #[error("Unexpected venue response: {0}")]
    Decode(String),
    #[error("API credentials are not configured")]
    MissingCredentials,
    #[error("Insufficient {asset} balance: {available} available, {required} required")]
    InsufficientBalance {
        asset: String,
        available: Decimal,
        required: Decimal,
    },
    #[error("Invalid order: {0}")]
    InvalidOrder(String),
}
