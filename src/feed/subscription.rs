//! Subscription handle returned by a [`PriceFeed`](super::PriceFeed)

use super::types::FeedEvent;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A live subscription to one symbol's price stream.
///
/// Ticks arrive in source order. Once `Disconnected` has been yielded the
/// handle keeps yielding it. Dropping the handle releases the connection
/// the same way [`unsubscribe`](Self::unsubscribe) does.
#[derive(Debug)]
pub struct FeedSubscription {
    symbol: String,
    rx: mpsc::Receiver<FeedEvent>,
    tasks: Vec<JoinHandle<()>>,
    disconnected: bool,
    released: bool,
}

impl FeedSubscription {
    /// Wrap a receiver together with the producer tasks that feed it
    pub fn new(
        symbol: impl Into<String>,
        rx: mpsc::Receiver<FeedEvent>,
        tasks: Vec<JoinHandle<()>>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            rx,
            tasks,
            disconnected: false,
            released: false,
        }
    }

    /// Wait for the next event. Cancel-safe.
    pub async fn next(&mut self) -> FeedEvent {
        if self.disconnected {
            return FeedEvent::Disconnected;
        }
        match self.rx.recv().await {
            Some(FeedEvent::Tick(tick)) => FeedEvent::Tick(tick),
            Some(FeedEvent::Disconnected) | None => {
                self.disconnected = true;
                FeedEvent::Disconnected
            }
        }
    }

    /// Stop delivery and release the underlying connection
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.rx.close();
        for task in self.tasks.drain(..) {
            task.abort();
        }
        tracing::debug!(symbol = %self.symbol, "Price feed subscription released");
    }
}

impl Drop for FeedSubscription {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::PriceTick;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_yields_ticks_in_order_then_disconnect() {
        let (tx, rx) = mpsc::channel(8);
        let mut sub = FeedSubscription::new("BTCUSDT", rx, vec![]);

        tx.send(FeedEvent::Tick(PriceTick::now("BTCUSDT", dec!(1))))
            .await
            .unwrap();
        tx.send(FeedEvent::Tick(PriceTick::now("BTCUSDT", dec!(2))))
            .await
            .unwrap();
        drop(tx);

        let prices: Vec<_> = [sub.next().await, sub.next().await]
            .into_iter()
            .map(|e| match e {
                FeedEvent::Tick(t) => t.price,
                FeedEvent::Disconnected => panic!("unexpected disconnect"),
            })
            .collect();
        assert_eq!(prices, vec![dec!(1), dec!(2)]);
        assert_eq!(sub.next().await, FeedEvent::Disconnected);
        assert_eq!(sub.next().await, FeedEvent::Disconnected);
    }

    #[tokio::test]
    async fn test_disconnect_is_sticky() {
        let (tx, rx) = mpsc::channel(8);
        let mut sub = FeedSubscription::new("BTCUSDT", rx, vec![]);

        tx.send(FeedEvent::Disconnected).await.unwrap();
        tx.send(FeedEvent::Tick(PriceTick::now("BTCUSDT", dec!(3))))
            .await
            .unwrap();

        assert_eq!(sub.next().await, FeedEvent::Disconnected);
        assert_eq!(sub.next().await, FeedEvent::Disconnected);
    }

    #[tokio::test]
    async fn test_unsubscribe_closes_channel_and_aborts_producers() {
        let (tx, rx) = mpsc::channel(8);
        let (alive_tx, mut alive_rx) = mpsc::channel::<()>(1);
        let producer = tokio::spawn(async move {
            let _alive = alive_tx;
            std::future::pending::<()>().await
        });
        let sub = FeedSubscription::new("BTCUSDT", rx, vec![producer]);

        sub.unsubscribe();

        assert!(tx.is_closed());
        // resolves once the aborted producer drops its sender
        assert!(alive_rx.recv().await.is_none());
    }
}
