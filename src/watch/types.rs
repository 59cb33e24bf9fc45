//! Watch engine types

use crate::venue::OrderResult;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Lifecycle of a watch session.
///
/// States only move forward, one step at a time, except that any state
/// may jump straight to `Closed` on cancel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WatchState {
    /// Constructed, not yet subscribed
    Idle,
    /// Subscribed and waiting for the target to be crossed
    Armed,
    /// Target crossed, sampling window running
    Sampling,
    /// Window complete, applying the sell/hold policy
    Deciding,
    /// Terminal; feed released
    Closed,
}

impl WatchState {
    fn rank(self) -> u8 {
        match self {
            WatchState::Idle => 0,
            WatchState::Armed => 1,
            WatchState::Sampling => 2,
            WatchState::Deciding => 3,
            WatchState::Closed => 4,
        }
    }

    /// Whether moving from `self` to `next` is a legal transition
    pub fn can_advance_to(self, next: WatchState) -> bool {
        if self == WatchState::Closed {
            return false;
        }
        next == WatchState::Closed || next.rank() == self.rank() + 1
    }

    /// A session in this state still holds (or is about to hold) the feed
    pub fn is_active(self) -> bool {
        !matches!(self, WatchState::Idle | WatchState::Closed)
    }
}

impl fmt::Display for WatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WatchState::Idle => "idle",
            WatchState::Armed => "armed",
            WatchState::Sampling => "sampling",
            WatchState::Deciding => "deciding",
            WatchState::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Runtime parameters for a watch session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Traded symbol
    pub symbol: String,
    /// Samples taken after crossing
    pub sample_count: usize,
    /// Spacing between samples
    pub sample_interval: Duration,
    /// Minimum fractional rise above the crossing price to hold
    pub hold_margin: Decimal,
    /// Base quantity sold on a `Sell` decision; `None` records the decision only
    pub sell_quantity: Option<Decimal>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            symbol: "BTCUSDT".to_string(),
            sample_count: 10,
            sample_interval: Duration::from_secs(1),
            hold_margin: dec!(0.001),
            sell_quantity: None,
        }
    }
}

/// One observation of the sampling window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Sample {
    /// 1-based position in the window
    pub tick_index: usize,
    pub price: Decimal,
}

/// Outcome of the sell/hold policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DecisionAction {
    /// Momentum stalled near the crossing price; liquidate
    Sell,
    /// Still climbing; keep the position
    Hold,
}

impl fmt::Display for DecisionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecisionAction::Sell => f.write_str("SELL"),
            DecisionAction::Hold => f.write_str("HOLD"),
        }
    }
}

/// A decision together with the data it was made from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub action: DecisionAction,
    /// Sampled maximum the decision is based on
    pub reference_max: Decimal,
    /// Price of the crossing tick
    pub start_price: Decimal,
    pub samples: Vec<Sample>,
}

/// What happened to the sell order on a `Sell` decision
#[derive(Debug, Clone, PartialEq)]
pub enum SellExecution {
    /// No venue or no quantity configured; decision recorded only
    Skipped,
    Placed(OrderResult),
    /// The venue call failed; not retried
    Failed(String),
}

/// How a session ended
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    Decided {
        decision: Decision,
        execution: SellExecution,
    },
    Cancelled,
    Disconnected,
}

/// Snapshot returned by `SessionManager::status`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WatchStatus {
    pub active: bool,
    pub target_price: Option<Decimal>,
    pub state: Option<WatchState>,
    pub latest_price: Option<Decimal>,
}

impl WatchStatus {
    pub fn inactive() -> Self {
        Self {
            active: false,
            target_price: None,
            state: None,
            latest_price: None,
        }
    }
}

/// Watch engine errors
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("a watch session is already active")]
    AlreadyActive,
    #[error("no watch session is active")]
    NotActive,
    #[error("target price must be positive, got {0}")]
    InvalidTarget(Decimal),
    #[error("price feed disconnected, session closed")]
    FeedDisconnected,
    #[error(transparent)]
    Feed(#[from] crate::feed::FeedError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions() {
        assert!(WatchState::Idle.can_advance_to(WatchState::Armed));
        assert!(WatchState::Armed.can_advance_to(WatchState::Sampling));
        assert!(WatchState::Sampling.can_advance_to(WatchState::Deciding));
        assert!(WatchState::Deciding.can_advance_to(WatchState::Closed));
    }

    #[test]
    fn test_no_skips_or_regressions() {
        assert!(!WatchState::Idle.can_advance_to(WatchState::Sampling));
        assert!(!WatchState::Sampling.can_advance_to(WatchState::Armed));
        assert!(!WatchState::Deciding.can_advance_to(WatchState::Sampling));
        assert!(!WatchState::Armed.can_advance_to(WatchState::Armed));
    }

    #[test]
    fn test_cancel_from_any_live_state() {
        for state in [
            WatchState::Idle,
            WatchState::Armed,
            WatchState::Sampling,
            WatchState::Deciding,
        ] {
            assert!(state.can_advance_to(WatchState::Closed), "{state}");
        }
        assert!(!WatchState::Closed.can_advance_to(WatchState::Closed));
    }

    #[test]
    fn test_active_states() {
        assert!(!WatchState::Idle.is_active());
        assert!(WatchState::Armed.is_active());
        assert!(WatchState::Deciding.is_active());
        assert!(!WatchState::Closed.is_active());
    }

    #[test]
    fn test_default_session_config() {
        let config = SessionConfig::default();
        assert_eq!(config.sample_count, 10);
        assert_eq!(config.sample_interval, Duration::from_secs(1));
        assert_eq!(config.hold_margin, dec!(0.001));
        assert!(config.sell_quantity.is_none());
    }
}
