//! In-process price feed driven by the caller

use super::{FeedError, FeedEvent, FeedSubscription, PriceFeed, PriceTick};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

#[derive(Debug, Default)]
struct ChannelFeedState {
    symbol: String,
    sender: Option<mpsc::Sender<FeedEvent>>,
    subscriptions: usize,
}

/// Feed whose ticks are pushed by hand. Serves replays and tests.
///
/// Like the exchange feed it accepts one subscriber at a time; a second
/// `subscribe` while the first is still open fails with [`FeedError::Busy`].
#[derive(Debug, Clone, Default)]
pub struct ChannelFeed {
    state: Arc<Mutex<ChannelFeedState>>,
}

impl ChannelFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver a price to the current subscriber. Returns `false` if nobody
    /// is subscribed.
    pub async fn push(&self, price: Decimal) -> bool {
        let (sender, symbol) = {
            let state = self.state.lock().await;
            (state.sender.clone(), state.symbol.clone())
        };
        match sender {
            Some(tx) => tx
                .send(FeedEvent::Tick(PriceTick::now(symbol, price)))
                .await
                .is_ok(),
            None => false,
        }
    }

    /// Simulate a dropped connection
    pub async fn disconnect(&self) -> bool {
        let sender = self.state.lock().await.sender.take();
        match sender {
            Some(tx) => tx.send(FeedEvent::Disconnected).await.is_ok(),
            None => false,
        }
    }

    /// Whether a subscriber currently holds the stream open
    pub async fn is_subscribed(&self) -> bool {
        self.state
            .lock()
            .await
            .sender
            .as_ref()
            .is_some_and(|tx| !tx.is_closed())
    }

    /// Total subscriptions handed out so far
    pub async fn subscription_count(&self) -> usize {
        self.state.lock().await.subscriptions
    }
}

#[async_trait]
impl PriceFeed for ChannelFeed {
    async fn subscribe(&self, symbol: &str) -> Result<FeedSubscription, FeedError> {
        let mut state = self.state.lock().await;
        if state.sender.as_ref().is_some_and(|tx| !tx.is_closed()) {
            return Err(FeedError::Busy(symbol.to_string()));
        }

        let (tx, rx) = mpsc::channel(1024);
        state.symbol = symbol.to_string();
        state.sender = Some(tx);
        state.subscriptions += 1;

        Ok(FeedSubscription::new(symbol, rx, vec![]))
    }
}
