//! Watch session state machine
//!
//! A session is armed with a target price, consumes the feed until the
//! target is crossed, samples the trend for a fixed window, applies the
//! sell/hold policy and closes. Feed consumption and the sampling clock
//! run in one task, so the decision logic never races itself.

use super::sampler::TrendSampler;
use super::types::{
    Decision, DecisionAction, SellExecution, SessionConfig, SessionOutcome, WatchError,
    WatchState,
};
use crate::feed::{latest_price, FeedEvent, FeedSubscription, PriceFeed, PriceReader, PriceTick, PriceWriter};
use crate::journal::{Journal, JournalLevel};
use crate::notify::Notifier;
use crate::telemetry::{
    increment, record_latency, set_gauge, CounterMetric, GaugeMetric, LatencyMetric,
};
use crate::venue::TradingVenue;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// Collaborators a running session talks to
pub struct SessionDeps {
    pub feed: Arc<dyn PriceFeed>,
    pub venue: Option<Arc<dyn TradingVenue>>,
    pub notifier: Arc<dyn Notifier>,
    pub journal: Journal,
}

/// One price-target watch
pub struct WatchSession {
    target_price: Decimal,
    config: SessionConfig,
    state: WatchState,
    state_tx: watch::Sender<WatchState>,
    writer: PriceWriter,
    reader: PriceReader,
    sampler: Option<TrendSampler>,
    start_price: Option<Decimal>,
}

impl WatchSession {
    /// A new session in `Idle`
    pub fn new(target_price: Decimal, config: SessionConfig) -> Self {
        let (state_tx, _) = watch::channel(WatchState::Idle);
        let (writer, reader) = latest_price();
        Self {
            target_price,
            config,
            state: WatchState::Idle,
            state_tx,
            writer,
            reader,
            sampler: None,
            start_price: None,
        }
    }

    pub fn target_price(&self) -> Decimal {
        self.target_price
    }

    pub fn state(&self) -> WatchState {
        self.state
    }

    /// Price of the crossing tick, once crossed
    pub fn start_price(&self) -> Option<Decimal> {
        self.start_price
    }

    /// Follow state changes from outside the session task
    pub fn state_receiver(&self) -> watch::Receiver<WatchState> {
        self.state_tx.subscribe()
    }

    /// Latest price seen by this session
    pub fn price_reader(&self) -> PriceReader {
        self.reader.clone()
    }

    fn advance(&mut self, next: WatchState) -> bool {
        if !self.state.can_advance_to(next) {
            tracing::warn!(from = %self.state, to = %next, "Ignoring illegal watch state transition");
            return false;
        }
        tracing::debug!(from = %self.state, to = %next, "Watch state transition");
        self.state = next;
        self.state_tx.send_replace(next);
        true
    }

    /// `Idle → Armed`: validate the target and subscribe to the feed
    pub async fn arm(&mut self, feed: &dyn PriceFeed) -> Result<FeedSubscription, WatchError> {
        if self.target_price <= Decimal::ZERO {
            return Err(WatchError::InvalidTarget(self.target_price));
        }
        if self.state != WatchState::Idle {
            return Err(WatchError::AlreadyActive);
        }

        let subscription = feed.subscribe(&self.config.symbol).await?;
        self.advance(WatchState::Armed);

        tracing::info!(
            symbol = %self.config.symbol,
            target = %self.target_price,
            "Watch session armed"
        );
        Ok(subscription)
    }

    /// Consume one tick. Returns `true` if this tick is the crossing.
    pub fn observe(&mut self, tick: &PriceTick) -> bool {
        self.writer.publish(tick.price);
        set_gauge(GaugeMetric::LastPrice, tick.price.to_f64().unwrap_or_default());

        if self.state != WatchState::Armed || tick.price < self.target_price {
            return false;
        }

        self.start_price = Some(tick.price);
        self.sampler = Some(TrendSampler::new(tick.price, self.config.sample_count));
        self.advance(WatchState::Sampling);

        tracing::info!(
            target = %self.target_price,
            start_price = %tick.price,
            samples = self.config.sample_count,
            "Target crossed, sampling trend"
        );
        true
    }

    /// One tick of the sampling clock. Returns the decision once the
    /// window is complete, leaving the session in `Deciding`.
    pub fn sample(&mut self) -> Option<Decision> {
        let sampler = self.sampler.as_mut()?;
        if !sampler.record(self.reader.get()) {
            return None;
        }

        let sampler = self.sampler.take()?;
        self.advance(WatchState::Deciding);
        let decision = sampler.finish(self.config.hold_margin);

        tracing::info!(
            action = %decision.action,
            start_price = %decision.start_price,
            max_price = %decision.reference_max,
            "Trend window complete"
        );
        Some(decision)
    }

    /// Move to `Closed` from whatever state the session is in
    pub fn close(&mut self) {
        self.sampler = None;
        if self.state != WatchState::Closed {
            self.advance(WatchState::Closed);
        }
    }

    /// Venue and quantity for the order a decision calls for, if any
    fn pending_order<'a>(
        &self,
        decision: &Decision,
        deps: &'a SessionDeps,
    ) -> Option<(&'a Arc<dyn TradingVenue>, Decimal)> {
        if decision.action != DecisionAction::Sell {
            return None;
        }
        Some((deps.venue.as_ref()?, self.config.sell_quantity?))
    }

    async fn execute(&self, decision: &Decision, deps: &SessionDeps) -> SellExecution {
        let Some((venue, quantity)) = self.pending_order(decision, deps) else {
            return SellExecution::Skipped;
        };

        let started = std::time::Instant::now();
        let result = venue.sell(&self.config.symbol, quantity).await;
        record_latency(LatencyMetric::OrderSubmission, started.elapsed());

        match result {
            Ok(order) => {
                increment(CounterMetric::OrdersPlaced);
                tracing::info!(order = %order, "Auto-sell order placed");
                SellExecution::Placed(order)
            }
            Err(e) => {
                increment(CounterMetric::VenueErrors);
                tracing::error!(error = %e, %quantity, "Auto-sell order failed");
                SellExecution::Failed(e.to_string())
            }
        }
    }

    /// Drive the session until it closes. The subscription is released
    /// exactly once, before the state is published as `Closed`.
    ///
    /// Cancel is honoured in every state, including while a sell order is
    /// in flight; the venue call is dropped and the session closes as
    /// `Cancelled`.
    pub async fn run(
        mut self,
        mut subscription: FeedSubscription,
        mut cancel: oneshot::Receiver<()>,
        deps: Arc<SessionDeps>,
    ) -> SessionOutcome {
        deps.journal.log(
            JournalLevel::Info,
            format!("Auto-sell armed for {} at {}", self.config.symbol, self.target_price),
        );

        let mut clock: Option<Interval> = None;
        let mut abandoned_order = false;

        let outcome = loop {
            tokio::select! {
                biased;

                _ = &mut cancel => break SessionOutcome::Cancelled,

                _ = next_sample(&mut clock) => {
                    if let Some(decision) = self.sample() {
                        let execution = tokio::select! {
                            biased;

                            _ = &mut cancel => {
                                abandoned_order = self.pending_order(&decision, &deps).is_some();
                                break SessionOutcome::Cancelled;
                            }

                            execution = self.execute(&decision, &deps) => execution,
                        };
                        break SessionOutcome::Decided { decision, execution };
                    }
                }

                event = subscription.next() => match event {
                    FeedEvent::Tick(tick) => {
                        if self.observe(&tick) {
                            clock = Some(sample_clock(self.config.sample_interval));
                            deps.journal.log(
                                JournalLevel::Info,
                                format!("Target {} crossed at {}", self.target_price, tick.price),
                            );
                        }
                    }
                    FeedEvent::Disconnected => break SessionOutcome::Disconnected,
                },
            }
        };

        subscription.unsubscribe();
        self.close();
        self.report(&outcome, abandoned_order, &deps).await;
        outcome
    }

    /// Record a terminal outcome: journal, metrics, operator notification
    async fn report(&self, outcome: &SessionOutcome, abandoned_order: bool, deps: &SessionDeps) {
        let symbol = &self.config.symbol;

        let (level, message, notify) = match outcome {
            SessionOutcome::Decided { decision, execution } => {
                let counter = match decision.action {
                    DecisionAction::Sell => CounterMetric::SellDecisions,
                    DecisionAction::Hold => CounterMetric::HoldDecisions,
                };
                increment(counter);
                let (level, message) = describe_decision(symbol, decision, execution);
                (level, message, true)
            }
            SessionOutcome::Cancelled if abandoned_order => {
                increment(CounterMetric::SessionsCancelled);
                (
                    JournalLevel::Warn,
                    format!(
                        "Auto-sell for {} at {} cancelled while its sell order was in flight. Check /orders.",
                        symbol, self.target_price
                    ),
                    true,
                )
            }
            SessionOutcome::Cancelled => {
                increment(CounterMetric::SessionsCancelled);
                (
                    JournalLevel::Info,
                    format!("Auto-sell for {} at {} cancelled", symbol, self.target_price),
                    false,
                )
            }
            SessionOutcome::Disconnected => {
                increment(CounterMetric::FeedDisconnects);
                (
                    JournalLevel::Warn,
                    format!(
                        "Price feed for {} disconnected, auto-sell at {} stopped. Re-arm to continue.",
                        symbol, self.target_price
                    ),
                    true,
                )
            }
        };

        tracing::info!(%symbol, target = %self.target_price, %level, "{}", message);
        deps.journal.log(level, message.clone());
        if notify {
            deps.notifier.notify(&message).await;
        }
    }
}

fn describe_decision(
    symbol: &str,
    decision: &Decision,
    execution: &SellExecution,
) -> (JournalLevel, String) {
    match (decision.action, execution) {
        (DecisionAction::Hold, _) => (
            JournalLevel::Info,
            format!(
                "Price still rising, not selling {}. Max {} vs start {}",
                symbol, decision.reference_max, decision.start_price
            ),
        ),
        (DecisionAction::Sell, SellExecution::Placed(order)) => (
            JournalLevel::Sell,
            format!(
                "Auto-sell: {} sold at {}, start was {}. Order {}",
                symbol, decision.reference_max, decision.start_price, order
            ),
        ),
        (DecisionAction::Sell, SellExecution::Skipped) => (
            JournalLevel::Sell,
            format!(
                "Auto-sell: sell {} at {}, start was {} (no order placed)",
                symbol, decision.reference_max, decision.start_price
            ),
        ),
        (DecisionAction::Sell, SellExecution::Failed(err)) => (
            JournalLevel::Error,
            format!(
                "Auto-sell decided to sell {} at {} (start {}) but the order failed: {}. Retry manually.",
                symbol, decision.reference_max, decision.start_price, err
            ),
        ),
    }
}

fn sample_clock(period: Duration) -> Interval {
    let period = period.max(Duration::from_millis(1));
    let mut clock = interval_at(Instant::now() + period, period);
    clock.set_missed_tick_behavior(MissedTickBehavior::Delay);
    clock
}

async fn next_sample(clock: &mut Option<Interval>) {
    match clock {
        Some(clock) => {
            clock.tick().await;
        }
        None => std::future::pending().await,
    }
}
