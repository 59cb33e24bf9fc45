//! Single-slot owner of the active watch session

use super::session::{SessionDeps, WatchSession};
use super::types::{SessionConfig, SessionOutcome, WatchError, WatchState, WatchStatus};
use crate::feed::{PriceFeed, PriceReader};
use crate::journal::Journal;
use crate::notify::Notifier;
use crate::telemetry::{increment, CounterMetric};
use crate::venue::TradingVenue;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::{oneshot, watch, Mutex};
use tokio::task::JoinHandle;

struct ActiveSession {
    target_price: Decimal,
    state: watch::Receiver<WatchState>,
    price: PriceReader,
    cancel: Option<oneshot::Sender<()>>,
    outcome: watch::Receiver<Option<SessionOutcome>>,
    task: JoinHandle<()>,
}

impl ActiveSession {
    fn state(&self) -> WatchState {
        *self.state.borrow()
    }
}

/// Holds at most one live [`WatchSession`].
///
/// Commands from the bot and the CLI go through here; the session itself
/// runs on its own task.
pub struct SessionManager {
    config: SessionConfig,
    deps: Arc<SessionDeps>,
    slot: Mutex<Option<ActiveSession>>,
}

impl SessionManager {
    pub fn new(
        config: SessionConfig,
        feed: Arc<dyn PriceFeed>,
        notifier: Arc<dyn Notifier>,
        journal: Journal,
    ) -> Self {
        Self {
            config,
            deps: Arc::new(SessionDeps {
                feed,
                venue: None,
                notifier,
                journal,
            }),
            slot: Mutex::new(None),
        }
    }

    /// Place sell orders on this venue when a session decides to sell
    pub fn with_venue(mut self, venue: Arc<dyn TradingVenue>) -> Self {
        if let Some(deps) = Arc::get_mut(&mut self.deps) {
            deps.venue = Some(venue);
        }
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Arm a session at `target_price` using the configured sell quantity
    pub async fn start(&self, target_price: Decimal) -> Result<(), WatchError> {
        self.start_with_quantity(target_price, self.config.sell_quantity)
            .await
    }

    /// Arm a session that sells `quantity` (or only records the decision
    /// when `None`)
    pub async fn start_with_quantity(
        &self,
        target_price: Decimal,
        quantity: Option<Decimal>,
    ) -> Result<(), WatchError> {
        let mut slot = self.slot.lock().await;
        if slot.as_ref().is_some_and(|s| s.state().is_active()) {
            return Err(WatchError::AlreadyActive);
        }

        let config = SessionConfig {
            sell_quantity: quantity,
            ..self.config.clone()
        };
        let mut session = WatchSession::new(target_price, config);
        let subscription = session.arm(self.deps.feed.as_ref()).await?;

        let (cancel_tx, cancel_rx) = oneshot::channel();
        let (outcome_tx, outcome_rx) = watch::channel(None);
        let state = session.state_receiver();
        let price = session.price_reader();
        let deps = Arc::clone(&self.deps);

        let task = tokio::spawn(async move {
            let outcome = session.run(subscription, cancel_rx, deps).await;
            outcome_tx.send_replace(Some(outcome));
        });

        increment(CounterMetric::SessionsStarted);
        *slot = Some(ActiveSession {
            target_price,
            state,
            price,
            cancel: Some(cancel_tx),
            outcome: outcome_rx,
            task,
        });
        Ok(())
    }

    /// Cancel the active session and wait until it has closed.
    ///
    /// Returns `NotActive` unless it was this cancel that closed the
    /// session; a session that decided or disconnected on its own first
    /// keeps that outcome.
    pub async fn stop(&self) -> Result<(), WatchError> {
        let mut outcome = {
            let mut slot = self.slot.lock().await;
            let active = slot.as_mut().ok_or(WatchError::NotActive)?;
            if !active.state().is_active() {
                return Err(WatchError::NotActive);
            }
            let cancel = active.cancel.take().ok_or(WatchError::NotActive)?;
            if cancel.send(()).is_err() {
                tracing::debug!("Watch session finished before the cancel arrived");
            }
            active.outcome.clone()
        };

        let closed = match outcome.wait_for(Option::is_some).await {
            Ok(closed) => (*closed).clone(),
            Err(_) => None,
        };
        match closed {
            Some(SessionOutcome::Cancelled) => Ok(()),
            Some(other) => {
                tracing::info!(outcome = ?other, "Watch session closed on its own before cancel");
                Err(WatchError::NotActive)
            }
            None => {
                tracing::warn!("Watch session task ended without an outcome");
                Err(WatchError::NotActive)
            }
        }
    }

    pub async fn status(&self) -> WatchStatus {
        let slot = self.slot.lock().await;
        match slot.as_ref() {
            Some(active) if active.state().is_active() => WatchStatus {
                active: true,
                target_price: Some(active.target_price),
                state: Some(active.state()),
                latest_price: active.price.get(),
            },
            _ => WatchStatus::inactive(),
        }
    }

    /// Wait for the current (or most recent) session to close
    pub async fn wait_closed(&self) -> Option<SessionOutcome> {
        let mut outcome = {
            let slot = self.slot.lock().await;
            slot.as_ref()?.outcome.clone()
        };
        let closed = outcome.wait_for(Option::is_some).await.ok()?.clone();
        closed
    }

    /// Outcome of the most recent session, if it has closed
    pub async fn last_outcome(&self) -> Option<SessionOutcome> {
        let slot = self.slot.lock().await;
        let outcome = slot.as_ref()?.outcome.borrow().clone();
        outcome
    }

    /// Cancel any active session and abort its task
    pub async fn shutdown(&self) {
        if self.stop().await.is_ok() {
            tracing::info!("Active watch session cancelled on shutdown");
        }
        if let Some(active) = self.slot.lock().await.take() {
            active.task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::ChannelFeed;
    use crate::notify::LogNotifier;
    use rust_decimal_macros::dec;

    fn manager(feed: &ChannelFeed) -> SessionManager {
        SessionManager::new(
            SessionConfig::default(),
            Arc::new(feed.clone()),
            Arc::new(LogNotifier),
            Journal::disabled(),
        )
    }

    #[tokio::test]
    async fn test_start_status_stop() {
        let feed = ChannelFeed::new();
        let manager = manager(&feed);

        assert_eq!(manager.status().await, WatchStatus::inactive());

        manager.start(dec!(50000)).await.unwrap();
        let status = manager.status().await;
        assert!(status.active);
        assert_eq!(status.target_price, Some(dec!(50000)));
        assert_eq!(status.state, Some(WatchState::Armed));

        manager.stop().await.unwrap();
        assert!(!manager.status().await.active);
        assert_eq!(manager.last_outcome().await, Some(SessionOutcome::Cancelled));
        assert!(!feed.is_subscribed().await);
    }

    #[tokio::test]
    async fn test_second_start_rejected() {
        let feed = ChannelFeed::new();
        let manager = manager(&feed);

        manager.start(dec!(50000)).await.unwrap();
        let err = manager.start(dec!(51000)).await.unwrap_err();
        assert!(matches!(err, WatchError::AlreadyActive));
        assert_eq!(manager.status().await.target_price, Some(dec!(50000)));
        assert_eq!(feed.subscription_count().await, 1);
    }

    #[tokio::test]
    async fn test_stop_without_session() {
        let manager = manager(&ChannelFeed::new());
        assert!(matches!(manager.stop().await, Err(WatchError::NotActive)));
    }

    #[tokio::test]
    async fn test_double_stop_reports_not_active() {
        let manager = manager(&ChannelFeed::new());
        manager.start(dec!(100)).await.unwrap();
        manager.stop().await.unwrap();
        assert!(matches!(manager.stop().await, Err(WatchError::NotActive)));
    }

    #[tokio::test]
    async fn test_stop_after_session_closed_itself() {
        let manager = manager(&ChannelFeed::new());

        // the slot still reads Deciding, but the task has already finished
        let (_state_tx, state) = watch::channel(WatchState::Deciding);
        let (cancel, cancel_rx) = oneshot::channel();
        drop(cancel_rx);
        let (_outcome_tx, outcome) = watch::channel(Some(SessionOutcome::Disconnected));
        let (_writer, price) = crate::feed::latest_price();
        *manager.slot.lock().await = Some(ActiveSession {
            target_price: dec!(100),
            state,
            price,
            cancel: Some(cancel),
            outcome,
            task: tokio::spawn(async {}),
        });

        assert!(matches!(manager.stop().await, Err(WatchError::NotActive)));
        assert_eq!(
            manager.last_outcome().await,
            Some(SessionOutcome::Disconnected)
        );
    }

    #[tokio::test]
    async fn test_invalid_target_leaves_slot_empty() {
        let feed = ChannelFeed::new();
        let manager = manager(&feed);

        let err = manager.start(dec!(-1)).await.unwrap_err();
        assert!(matches!(err, WatchError::InvalidTarget(_)));
        assert!(!feed.is_subscribed().await);
        assert!(manager.last_outcome().await.is_none());
    }

    #[tokio::test]
    async fn test_restart_after_stop() {
        let feed = ChannelFeed::new();
        let manager = manager(&feed);

        manager.start(dec!(100)).await.unwrap();
        manager.stop().await.unwrap();
        manager.start(dec!(200)).await.unwrap();

        assert_eq!(manager.status().await.target_price, Some(dec!(200)));
        assert_eq!(feed.subscription_count().await, 2);
    }
}
