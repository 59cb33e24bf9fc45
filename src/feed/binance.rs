//! Binance WebSocket price feed implementation

use super::{FeedEvent, FeedError, FeedSubscription, PriceFeed, PriceTick};
use crate::ws::{WsClient, WsConfig, WsMessage};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};

/// Binance WebSocket base URL
pub const BINANCE_WS_URL: &str = "wss://stream.binance.com:9443/ws";

/// Binance 24h rolling ticker message
#[derive(Debug, Deserialize)]
struct BinanceTickerMessage {
    /// Event type
    #[serde(rename = "e")]
    event_type: String,
    /// Event time (milliseconds)
    #[serde(rename = "E")]
    event_time: i64,
    /// Symbol
    #[serde(rename = "s")]
    symbol: String,
    /// Last price
    #[serde(rename = "c")]
    last_price: String,
}

/// Binance WebSocket feed over the `<symbol>@ticker` stream.
///
/// A dropped connection is reported to the subscriber as
/// [`FeedEvent::Disconnected`]; the feed never reconnects behind its back.
/// One subscriber at a time; a second `subscribe` while the first stream is
/// open fails with [`FeedError::Busy`].
pub struct BinanceFeed {
    base_url: String,
    ping_interval: Duration,
    active: Mutex<Option<mpsc::WeakSender<FeedEvent>>>,
}

impl BinanceFeed {
    /// Create a new Binance feed against the given stream base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ping_interval: Duration::from_secs(30),
            active: Mutex::new(None),
        }
    }

    /// Build the WebSocket URL for the ticker stream
    fn build_ws_url(&self, symbol: &str) -> String {
        format!("{}/{}@ticker", self.base_url, symbol.to_lowercase())
    }

    /// Parse a Binance ticker message into a PriceTick
    fn parse_message(msg: &str) -> Option<PriceTick> {
        let ticker: BinanceTickerMessage = serde_json::from_str(msg).ok()?;

        if ticker.event_type != "24hrTicker" {
            return None;
        }

        let price = Decimal::from_str(&ticker.last_price).ok()?;
        let exchange_ts = Utc.timestamp_millis_opt(ticker.event_time).single()?;

        Some(PriceTick {
            symbol: ticker.symbol,
            price,
            timestamp: Utc::now(),
            exchange_ts,
        })
    }

    /// Translate raw socket messages into feed events
    async fn run_message_loop(
        mut ws_rx: mpsc::Receiver<WsMessage>,
        event_tx: mpsc::Sender<FeedEvent>,
    ) {
        while let Some(msg) = ws_rx.recv().await {
            match msg {
                WsMessage::Text(text) => {
                    if let Some(tick) = Self::parse_message(&text) {
                        if event_tx.send(FeedEvent::Tick(tick)).await.is_err() {
                            tracing::debug!("Tick receiver dropped, stopping feed");
                            return;
                        }
                    }
                }
                WsMessage::Connected => {
                    tracing::info!("Binance feed connected");
                }
                WsMessage::Reconnecting { attempt } => {
                    tracing::warn!(attempt, "Binance feed reconnecting...");
                }
                WsMessage::Disconnected => break,
            }
        }

        tracing::warn!("Binance feed disconnected");
        let _ = event_tx.send(FeedEvent::Disconnected).await;
    }
}

impl Default for BinanceFeed {
    fn default() -> Self {
        Self::new(BINANCE_WS_URL)
    }
}

#[async_trait]
impl PriceFeed for BinanceFeed {
    async fn subscribe(&self, symbol: &str) -> Result<FeedSubscription, FeedError> {
        if symbol.is_empty() {
            return Err(FeedError::Connect {
                symbol: symbol.to_string(),
                reason: "empty symbol".to_string(),
            });
        }

        let mut active = self.active.lock().await;
        let open = active
            .as_ref()
            .and_then(|weak| weak.upgrade())
            .is_some_and(|tx| !tx.is_closed());
        if open {
            return Err(FeedError::Busy(symbol.to_string()));
        }

        let (event_tx, event_rx) = mpsc::channel(1024);
        *active = Some(event_tx.downgrade());
        let url = self.build_ws_url(symbol);

        tracing::info!(%symbol, %url, "Subscribing to Binance feed");

        let config = WsConfig::new(url)
            .max_reconnects(0)
            .ping_interval(self.ping_interval);
        let (ws_rx, ws_task) = WsClient::new(config).connect();

        let loop_task = tokio::spawn(Self::run_message_loop(ws_rx, event_tx));

        Ok(FeedSubscription::new(
            symbol.to_uppercase(),
            event_rx,
            vec![ws_task, loop_task],
        ))
    }
}
