//! WebSocket client with bounded reconnection

use super::types::{WsConfig, WsError, WsMessage};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_tungstenite::{connect_async, tungstenite::Message};

/// Read-only WebSocket client with ping keepalive
pub struct WsClient {
    config: WsConfig,
}

impl WsClient {
    /// Create a new WebSocket client with the given configuration
    pub fn new(config: WsConfig) -> Self {
        Self { config }
    }

    /// Connect and return a receiver for messages plus the connection task.
    ///
    /// The receiver always ends with exactly one `Disconnected` event unless
    /// the consumer drops it or the task is aborted first.
    pub fn connect(&self) -> (mpsc::Receiver<WsMessage>, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(1024);
        let config = self.config.clone();

        let task = tokio::spawn(async move {
            Self::run_connection_loop(config, tx).await;
        });

        (rx, task)
    }

    async fn run_connection_loop(config: WsConfig, tx: mpsc::Sender<WsMessage>) {
        let mut reconnect_attempts = 0;
        let mut reconnect_delay = config.initial_reconnect_delay;

        loop {
            match Self::connect_and_stream(&config, &tx).await {
                Ok(()) => {
                    tracing::info!(url = %config.url, "WebSocket connection closed");
                    break;
                }
                Err(e) => {
                    if reconnect_attempts >= config.max_reconnect_attempts {
                        tracing::warn!(error = %e, "WebSocket connection lost");
                        break;
                    }
                    if tx.is_closed() {
                        tracing::debug!("Receiver dropped, stopping reconnection");
                        return;
                    }

                    reconnect_attempts += 1;
                    tracing::warn!(
                        error = %e,
                        attempt = reconnect_attempts,
                        "WebSocket connection error, reconnecting..."
                    );
                    let _ = tx
                        .send(WsMessage::Reconnecting {
                            attempt: reconnect_attempts,
                        })
                        .await;

                    sleep(reconnect_delay).await;
                    reconnect_delay = (reconnect_delay * 2).min(config.max_reconnect_delay);
                }
            }
        }

        let _ = tx.send(WsMessage::Disconnected).await;
    }

    async fn connect_and_stream(
        config: &WsConfig,
        tx: &mpsc::Sender<WsMessage>,
    ) -> Result<(), WsError> {
        tracing::info!(url = %config.url, "Connecting to WebSocket");

        let (ws_stream, _response) = connect_async(&config.url)
            .await
            .map_err(|e| WsError::ConnectionFailed(e.to_string()))?;

        let (mut write, mut read) = ws_stream.split();

        if tx.send(WsMessage::Connected).await.is_err() {
            return Ok(());
        }

        let mut ping_interval = tokio::time::interval(config.ping_interval);
        ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // the first tick completes immediately
        ping_interval.tick().await;
        let mut waiting_for_pong = false;

        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            if tx.send(WsMessage::Text(text)).await.is_err() {
                                tracing::debug!("Receiver dropped, closing connection");
                                return Ok(());
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            write.send(Message::Pong(data)).await
                                .map_err(|e| WsError::SendFailed(e.to_string()))?;
                        }
                        Some(Ok(Message::Pong(_))) => {
                            waiting_for_pong = false;
                        }
                        Some(Ok(Message::Close(_))) => {
                            return Err(WsError::ConnectionFailed("Server closed the stream".into()));
                        }
                        Some(Err(e)) => {
                            return Err(WsError::ConnectionFailed(e.to_string()));
                        }
                        None => {
                            return Err(WsError::ConnectionFailed("Stream ended unexpectedly".into()));
                        }
                        _ => {}
                    }
                }

                _ = ping_interval.tick() => {
                    if waiting_for_pong {
                        return Err(WsError::PongTimeout);
                    }
                    write.send(Message::Ping(vec![])).await
                        .map_err(|e| WsError::SendFailed(e.to_string()))?;
                    waiting_for_pong = true;
                }

                _ = tx.closed() => {
                    tracing::debug!("Receiver dropped, closing connection");
                    let _ = write.send(Message::Close(None)).await;
                    return Ok(());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_refused_connection_reports_disconnect_without_retry() {
        let client = WsClient::new(WsConfig::new("ws://127.0.0.1:1"));
        let (mut rx, task) = client.connect();

        let first = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("Test timed out");
        assert!(matches!(first, Some(WsMessage::Disconnected)));
        assert!(rx.recv().await.is_none());
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_refused_connection_retries_before_disconnect() {
        let client = WsClient::new(
            WsConfig::new("ws://127.0.0.1:1")
                .max_reconnects(2)
                .initial_delay(Duration::from_millis(5)),
        );
        let (mut rx, _task) = client.connect();

        let mut attempts = Vec::new();
        let got_disconnect = tokio::time::timeout(Duration::from_secs(5), async {
            while let Some(msg) = rx.recv().await {
                match msg {
                    WsMessage::Reconnecting { attempt } => attempts.push(attempt),
                    WsMessage::Disconnected => return true,
                    _ => {}
                }
            }
            false
        })
        .await
        .expect("Test timed out");

        assert!(got_disconnect);
        assert_eq!(attempts, vec![1, 2]);
    }
}
