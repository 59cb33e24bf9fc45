//! Price feed module
//!
//! Live price stream for the traded symbol plus the shared latest-price cell

mod binance;
mod channel;
mod latest;
mod subscription;
mod types;

pub use binance::{BinanceFeed, BINANCE_WS_URL};
pub use channel::ChannelFeed;
pub use latest::{latest_price, PriceReader, PriceWriter};
pub use subscription::FeedSubscription;
pub use types::{FeedError, FeedEvent, PriceTick};

use async_trait::async_trait;

/// Trait for price feed implementations
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Subscribe to price updates for one symbol
    async fn subscribe(&self, symbol: &str) -> Result<FeedSubscription, FeedError>;
}
