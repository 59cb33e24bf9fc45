use super::args::{parse_autosell_args, parse_count, parse_order_args};
use super::commands::Command;
use crate::alerts::{AlertHandle, CrashAlertMonitor};
use crate::indicators::{analyze, rsi, RsiReading, RSI_PERIOD};
use crate::journal::{read_recent, Journal, JournalLevel};
use crate::telemetry::{increment, record_latency, set_gauge, CounterMetric, GaugeMetric, LatencyMetric};
use crate::venue::sizing::{plan_buy, plan_sell, OrderPlan};
use crate::venue::{Side, TradingVenue, VenueError};
use crate::watch::{SessionManager, WatchError};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tokio::sync::Mutex;

/// Candle interval used by `/rsi` and `/analysis`
const ANALYSIS_INTERVAL: &str = "15m";
const RSI_CANDLES: u16 = 30;
const ANALYSIS_CANDLES: u16 = 50;

/// Everything the command handlers need
pub struct BotState {
    symbol: String,
    base_asset: String,
    quote_asset: String,
    venue: Arc<dyn TradingVenue>,
    manager: Arc<SessionManager>,
    journal: Journal,
    journal_path: Option<PathBuf>,
    monitor: Option<Arc<CrashAlertMonitor>>,
    monitor_task: Mutex<Option<AlertHandle>>,
}

impl BotState {
    pub fn new(
        symbol: impl Into<String>,
        base_asset: impl Into<String>,
        quote_asset: impl Into<String>,
        venue: Arc<dyn TradingVenue>,
        manager: Arc<SessionManager>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            base_asset: base_asset.into(),
            quote_asset: quote_asset.into(),
            venue,
            manager,
            journal: Journal::disabled(),
            journal_path: None,
            monitor: None,
            monitor_task: Mutex::new(None),
        }
    }

    /// Record manual orders and expose `/journal` from this file
    pub fn with_journal(mut self, journal: Journal, path: Option<PathBuf>) -> Self {
        self.journal = journal;
        self.journal_path = path;
        self
    }

    /// Make `/monitor` toggle this alert loop
    pub fn with_monitor(mut self, monitor: Arc<CrashAlertMonitor>) -> Self {
        self.monitor = Some(monitor);
        self
    }

    pub fn manager(&self) -> &Arc<SessionManager> {
        &self.manager
    }

    /// Start the alert loop if it is not running. Returns `false` when no
    /// monitor is configured.
    pub async fn start_monitor(&self) -> bool {
        let Some(monitor) = &self.monitor else {
            return false;
        };
        let mut task = self.monitor_task.lock().await;
        if !task.as_ref().is_some_and(|t| t.is_running()) {
            *task = Some(Arc::clone(monitor).spawn());
        }
        true
    }

    /// Stop the alert loop. Returns `true` if it was running.
    pub async fn stop_monitor(&self) -> bool {
        let handle = self.monitor_task.lock().await.take();
        match handle {
            Some(handle) => {
                handle.stop().await;
                true
            }
            None => false,
        }
    }

    pub async fn is_monitoring(&self) -> bool {
        self.monitor_task
            .lock()
            .await
            .as_ref()
            .is_some_and(|t| t.is_running())
    }

    /// Run one command and produce the reply text
    pub async fn execute(&self, cmd: Command) -> String {
        match cmd {
            Command::Price => match self.venue.price(&self.symbol).await {
                Ok(price) => format!("{} price: {} {}", self.symbol, price, self.quote_asset),
                Err(e) => self.venue_failure("get price", e),
            },
            Command::Rsi => self.rsi_reply().await,
            Command::Analysis => self.analysis_reply().await,
            Command::Balance => self.balance_reply().await,
            Command::Orders => self.orders_reply().await,
            Command::Buy(args) => self.order_reply(Side::Buy, &args).await,
            Command::Sell(args) => self.order_reply(Side::Sell, &args).await,
            Command::Autosell(args) => self.autosell_reply(&args).await,
            Command::SellStatus => self.status_reply().await,
            Command::SellCancel => match self.manager.stop().await {
                Ok(()) => "Auto-sell cancelled.".to_string(),
                Err(WatchError::NotActive) => "Auto-sell is not active.".to_string(),
                Err(e) => format!("Failed to cancel auto-sell: {e}"),
            },
            Command::Monitor => self.toggle_monitor().await,
            Command::Journal(args) => self.journal_reply(&args).await,
            Command::Help => Command::descriptions().to_string(),
        }
    }

    fn venue_failure(&self, action: &str, e: VenueError) -> String {
        increment(CounterMetric::VenueErrors);
        tracing::error!(error = %e, action, "Venue request failed");
        format!("Failed to {action}: {e}")
    }

    async fn rsi_reply(&self) -> String {
        let candles = match self
            .venue
            .candles(&self.symbol, ANALYSIS_INTERVAL, RSI_CANDLES)
            .await
        {
            Ok(candles) => candles,
            Err(e) => return self.venue_failure("fetch candles", e),
        };
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        match rsi(&closes, RSI_PERIOD).map(RsiReading::new) {
            Some(reading) => {
                set_gauge(GaugeMetric::Rsi, reading.value);
                format!("RSI({RSI_PERIOD}) = {:.2} ({})", reading.value, reading.zone)
            }
            None => "RSI unavailable: not enough price movement".to_string(),
        }
    }

    async fn analysis_reply(&self) -> String {
        match self
            .venue
            .candles(&self.symbol, ANALYSIS_INTERVAL, ANALYSIS_CANDLES)
            .await
        {
            Ok(candles) => format!("Market analysis:\n\n{}", analyze(&candles)),
            Err(e) => self.venue_failure("fetch candles", e),
        }
    }

    async fn balance_reply(&self) -> String {
        let base = self.venue.balance(&self.base_asset).await;
        let quote = self.venue.balance(&self.quote_asset).await;
        match (base, quote) {
            (Ok(base), Ok(quote)) => format!(
                "Balances:\n{}: {}\n{}: {}",
                self.base_asset, base, self.quote_asset, quote
            ),
            (Err(e), _) | (_, Err(e)) => self.venue_failure("get balances", e),
        }
    }

    async fn orders_reply(&self) -> String {
        match self.venue.open_orders(&self.symbol).await {
            Ok(orders) if orders.is_empty() => "No open orders".to_string(),
            Ok(orders) => orders
                .iter()
                .map(|o| o.to_string())
                .collect::<Vec<_>>()
                .join("\n"),
            Err(e) => self.venue_failure("get open orders", e),
        }
    }

    async fn plan(&self, side: Side, args: &str) -> Result<OrderPlan, String> {
        let args = parse_order_args(args).map_err(|e| format!("Invalid order: {e}"))?;
        let price = match args.price {
            Some(price) => price,
            None => self
                .venue
                .price(&self.symbol)
                .await
                .map_err(|e| self.venue_failure("get price", e))?,
        };

        let plan = match side {
            Side::Buy => {
                let balance = self
                    .venue
                    .balance(&self.quote_asset)
                    .await
                    .map_err(|e| self.venue_failure("get balance", e))?;
                plan_buy(&self.quote_asset, balance, price, args.percent)
            }
            Side::Sell => {
                let balance = self
                    .venue
                    .balance(&self.base_asset)
                    .await
                    .map_err(|e| self.venue_failure("get balance", e))?;
                plan_sell(&self.base_asset, balance, price, args.percent)
            }
        };
        plan.map_err(|e| format!("Cannot {}: {e}", side.as_str().to_lowercase()))
    }

    async fn order_reply(&self, side: Side, args: &str) -> String {
        let plan = match self.plan(side, args).await {
            Ok(plan) => plan,
            Err(reply) => return reply,
        };

        let started = Instant::now();
        let result = self
            .venue
            .place_limit(&self.symbol, side, plan.quantity, plan.price)
            .await;
        record_latency(LatencyMetric::OrderSubmission, started.elapsed());

        let level = match side {
            Side::Buy => JournalLevel::Buy,
            Side::Sell => JournalLevel::Sell,
        };
        match result {
            Ok(order) => {
                increment(CounterMetric::OrdersPlaced);
                self.journal.log(
                    level,
                    format!("Manual {}% order placed: {}", plan.percent, order),
                );
                format!(
                    "Order placed: {}\n{}% of balance, {} {}",
                    order, plan.percent, plan.notional, self.quote_asset
                )
            }
            Err(e) => {
                self.journal
                    .log(JournalLevel::Error, format!("Manual {side} order failed: {e}"));
                self.venue_failure("place order", e)
            }
        }
    }

    async fn autosell_reply(&self, args: &str) -> String {
        let args = match parse_autosell_args(args) {
            Ok(args) => args,
            Err(e) => return format!("Invalid auto-sell: {e}"),
        };
        let quantity = args.quantity.or(self.manager.config().sell_quantity);

        match self.manager.start_with_quantity(args.target, quantity).await {
            Ok(()) => {
                let sell = match quantity {
                    Some(q) => format!("will sell {} {}", q, self.base_asset),
                    None => "decision only, no quantity configured".to_string(),
                };
                format!(
                    "Auto-sell armed: waiting for {} to reach {} {} ({})",
                    self.symbol, args.target, self.quote_asset, sell
                )
            }
            Err(WatchError::AlreadyActive) => {
                let status = self.manager.status().await;
                match status.target_price {
                    Some(target) => format!(
                        "Auto-sell already active at {target}. Use /sell_cancel first."
                    ),
                    None => "Auto-sell already active. Use /sell_cancel first.".to_string(),
                }
            }
            Err(e) => format!("Failed to arm auto-sell: {e}"),
        }
    }

    async fn status_reply(&self) -> String {
        let status = self.manager.status().await;
        let (Some(target), Some(state)) = (status.target_price, status.state) else {
            return "Auto-sell is off.".to_string();
        };
        let latest = status
            .latest_price
            .map(|p| p.to_string())
            .unwrap_or_else(|| "no ticks yet".to_string());
        format!(
            "Auto-sell active: target {} {}, state {}, last price {}",
            target, self.quote_asset, state, latest
        )
    }

    async fn toggle_monitor(&self) -> String {
        if self.monitor.is_none() {
            return "Crash alerts are not available.".to_string();
        }
        if self.stop_monitor().await {
            "Crash alerts stopped.".to_string()
        } else {
            self.start_monitor().await;
            "Crash alerts started.".to_string()
        }
    }

    async fn journal_reply(&self, args: &str) -> String {
        let Some(path) = &self.journal_path else {
            return "Journal is disabled.".to_string();
        };
        let limit = parse_count(args, 10, 50);
        match read_recent(path, limit).await {
            Ok(entries) if entries.is_empty() => "Journal is empty.".to_string(),
            Ok(entries) => entries
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("\n"),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read journal");
                format!("Failed to read journal: {e}")
            }
        }
    }
}

/// Handle incoming Telegram commands
pub async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    state: Arc<BotState>,
) -> ResponseResult<()> {
    let started = Instant::now();
    tracing::info!(chat_id = %msg.chat.id, command = ?cmd, "Bot command");
    increment(CounterMetric::BotCommands);

    let reply = state.execute(cmd).await;
    bot.send_message(msg.chat.id, reply).await?;

    record_latency(LatencyMetric::CommandHandling, started.elapsed());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::ChannelFeed;
    use crate::notify::LogNotifier;
    use crate::venue::PaperVenue;
    use crate::watch::SessionConfig;
    use rust_decimal_macros::dec;

    async fn state() -> (BotState, PaperVenue, ChannelFeed) {
        let venue = PaperVenue::new("BTC", "USDT", dec!(0));
        venue.set_price(dec!(50000)).await;
        venue.set_balance("USDT", dec!(1000)).await;
        venue.set_balance("BTC", dec!(0.02)).await;

        let feed = ChannelFeed::new();
        let manager = SessionManager::new(
            SessionConfig::default(),
            Arc::new(feed.clone()),
            Arc::new(LogNotifier),
            Journal::disabled(),
        );
        let state = BotState::new(
            "BTCUSDT",
            "BTC",
            "USDT",
            Arc::new(venue.clone()),
            Arc::new(manager),
        );
        (state, venue, feed)
    }

    #[tokio::test]
    async fn test_price_reply() {
        let (state, _, _) = state().await;
        assert_eq!(
            state.execute(Command::Price).await,
            "BTCUSDT price: 50000 USDT"
        );
    }

    #[tokio::test]
    async fn test_buy_quarter_of_balance() {
        let (state, venue, _) = state().await;
        let reply = state.execute(Command::Buy("25".into())).await;
        assert!(reply.starts_with("Order placed"), "{reply}");

        let fills = venue.fills().await;
        assert_eq!(fills.len(), 1);
        // 250 USDT at 50000
        assert_eq!(fills[0].quantity, dec!(0.005));
        assert_eq!(venue.balance("USDT").await.unwrap(), dec!(750));
    }

    #[tokio::test]
    async fn test_sell_half_at_limit_price() {
        let (state, venue, _) = state().await;
        let reply = state.execute(Command::Sell("50 51000".into())).await;
        assert!(reply.starts_with("Order placed"), "{reply}");

        let fills = venue.fills().await;
        assert_eq!(fills[0].price, dec!(51000));
        assert_eq!(fills[0].quantity, dec!(0.01));
    }

    #[tokio::test]
    async fn test_buy_with_insufficient_balance() {
        let (state, venue, _) = state().await;
        venue.set_balance("USDT", dec!(5)).await;
        let reply = state.execute(Command::Buy("100".into())).await;
        assert!(reply.contains("Insufficient USDT balance"), "{reply}");
        assert!(venue.fills().await.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_order_args() {
        let (state, _, _) = state().await;
        let reply = state.execute(Command::Buy("33".into())).await;
        assert!(reply.starts_with("Invalid order"), "{reply}");
    }

    #[tokio::test]
    async fn test_autosell_lifecycle() {
        let (state, _, feed) = state().await;

        assert_eq!(state.execute(Command::SellStatus).await, "Auto-sell is off.");

        let reply = state.execute(Command::Autosell("60000".into())).await;
        assert!(reply.starts_with("Auto-sell armed"), "{reply}");
        assert!(feed.is_subscribed().await);

        let reply = state.execute(Command::Autosell("61000".into())).await;
        assert!(reply.contains("already active at 60000"), "{reply}");

        let reply = state.execute(Command::SellStatus).await;
        assert!(reply.contains("target 60000"), "{reply}");
        assert!(reply.contains("armed"), "{reply}");

        assert_eq!(state.execute(Command::SellCancel).await, "Auto-sell cancelled.");
        assert_eq!(
            state.execute(Command::SellCancel).await,
            "Auto-sell is not active."
        );
        assert!(!feed.is_subscribed().await);
    }

    #[tokio::test]
    async fn test_orders_and_balance() {
        let (state, _, _) = state().await;
        assert_eq!(state.execute(Command::Orders).await, "No open orders");
        let reply = state.execute(Command::Balance).await;
        assert!(reply.contains("BTC: 0.02"), "{reply}");
        assert!(reply.contains("USDT: 1000"), "{reply}");
    }

    #[tokio::test]
    async fn test_rsi_without_candles() {
        let (state, _, _) = state().await;
        let reply = state.execute(Command::Rsi).await;
        assert!(reply.starts_with("RSI unavailable"), "{reply}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_monitor_toggle() {
        use crate::alerts::AlertSettings;

        let (state, venue, _) = state().await;
        let monitor = CrashAlertMonitor::new(
            AlertSettings::default(),
            Arc::new(venue),
            Arc::new(LogNotifier),
            Journal::disabled(),
        );
        let state = state.with_monitor(Arc::new(monitor));

        assert!(!state.is_monitoring().await);
        assert_eq!(state.execute(Command::Monitor).await, "Crash alerts started.");
        assert!(state.is_monitoring().await);
        assert_eq!(state.execute(Command::Monitor).await, "Crash alerts stopped.");
        assert!(!state.is_monitoring().await);
    }

    #[tokio::test]
    async fn test_monitor_and_journal_unavailable() {
        let (state, _, _) = state().await;
        assert_eq!(
            state.execute(Command::Monitor).await,
            "Crash alerts are not available."
        );
        assert_eq!(
            state.execute(Command::Journal(String::new())).await,
            "Journal is disabled."
        );
    }
}
