//! Trading venue module
//!
//! Exchange access for the traded symbol: prices, balances, candles and
//! limit orders, either against Binance or a paper book.

mod binance;
mod paper;
pub mod sizing;
mod types;

pub use binance::{BinanceVenue, BinanceVenueConfig, Credentials, BINANCE_API_URL};
pub use paper::PaperVenue;
pub use types::{Candle, OrderResult, Side, VenueError};

use async_trait::async_trait;
use rust_decimal::Decimal;

/// Trait for trading venue implementations
#[async_trait]
pub trait TradingVenue: Send + Sync {
    /// Current ticker price
    async fn price(&self, symbol: &str) -> Result<Decimal, VenueError>;

    /// Free balance of one asset
    async fn balance(&self, asset: &str) -> Result<Decimal, VenueError>;

    /// Place a GTC limit order
    async fn place_limit(
        &self,
        symbol: &str,
        side: Side,
        quantity: Decimal,
        price: Decimal,
    ) -> Result<OrderResult, VenueError>;

    /// Sell `quantity` with a limit at the current ticker price
    async fn sell(&self, symbol: &str, quantity: Decimal) -> Result<OrderResult, VenueError> {
        let price = self.price(symbol).await?;
        self.place_limit(symbol, Side::Sell, quantity, price).await
    }

    /// Orders still resting on the book
    async fn open_orders(&self, symbol: &str) -> Result<Vec<OrderResult>, VenueError>;

    /// Most recent `limit` candles, oldest first
    async fn candles(
        &self,
        symbol: &str,
        interval: &str,
        limit: u16,
    ) -> Result<Vec<Candle>, VenueError>;
}
