//! Periodic market alerts
//!
//! Polls candle history, runs the crash-reversal detector (and optionally
//! RSI) and pushes a notification when a condition starts to hold. An
//! alert fires once per episode: the condition must clear before it can
//! fire again.

use crate::indicators::{crash_reading, rsi, CrashParams, CrashReading, RsiReading, Zone, RSI_PERIOD};
use crate::journal::{Journal, JournalLevel};
use crate::notify::Notifier;
use crate::telemetry::{increment, set_gauge, CounterMetric, GaugeMetric};
use crate::venue::{TradingVenue, VenueError};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Monitor settings
#[derive(Debug, Clone)]
pub struct AlertSettings {
    pub symbol: String,
    /// Candle interval, e.g. `1m`
    pub interval: String,
    pub candle_limit: u16,
    pub poll_interval: Duration,
    pub crash: CrashParams,
    pub rsi_alerts: bool,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            symbol: "BTCUSDT".to_string(),
            interval: "1m".to_string(),
            candle_limit: 50,
            poll_interval: Duration::from_secs(60),
            crash: CrashParams {
                drop_threshold_pct: 1.0,
                ..CrashParams::default()
            },
            rsi_alerts: false,
        }
    }
}

/// A raised alert
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    CrashReversal(CrashReading),
    Rsi(RsiReading),
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Alert::CrashReversal(r) => write!(
                f,
                "Sharp reversal detected: {:.2}% drop on rising volume. Possible rebound.",
                r.price_change_pct
            ),
            Alert::Rsi(r) => write!(f, "RSI = {:.2} ({})", r.value, r.zone),
        }
    }
}

impl Alert {
    /// Counter bumped when this alert is raised
    pub fn counter(&self) -> CounterMetric {
        match self {
            Alert::CrashReversal(_) => CounterMetric::CrashAlerts,
            Alert::Rsi(_) => CounterMetric::RsiAlerts,
        }
    }
}

#[derive(Debug, Default)]
struct EdgeState {
    crash_active: bool,
    rsi_zone: Option<Zone>,
}

/// Crash-reversal alert loop
pub struct CrashAlertMonitor {
    settings: AlertSettings,
    venue: Arc<dyn TradingVenue>,
    notifier: Arc<dyn Notifier>,
    journal: Journal,
    edges: Mutex<EdgeState>,
}

impl CrashAlertMonitor {
    pub fn new(
        settings: AlertSettings,
        venue: Arc<dyn TradingVenue>,
        notifier: Arc<dyn Notifier>,
        journal: Journal,
    ) -> Self {
        Self {
            settings,
            venue,
            notifier,
            journal,
            edges: Mutex::new(EdgeState::default()),
        }
    }

    pub fn settings(&self) -> &AlertSettings {
        &self.settings
    }

    /// Poll once and deliver any newly raised alerts
    pub async fn check_once(&self) -> Result<Vec<Alert>, VenueError> {
        let s = &self.settings;
        let candles = self
            .venue
            .candles(&s.symbol, &s.interval, s.candle_limit)
            .await?;

        let mut raised = Vec::new();
        let mut edges = self.edges.lock().await;

        let crash = crash_reading(&candles, &s.crash);
        let crash_now = crash.is_some_and(|r| r.detected);
        if let Some(reading) = crash.filter(|_| crash_now && !edges.crash_active) {
            raised.push(Alert::CrashReversal(reading));
        }
        edges.crash_active = crash_now;

        if s.rsi_alerts {
            let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
            if let Some(reading) = rsi(&closes, RSI_PERIOD).map(RsiReading::new) {
                set_gauge(GaugeMetric::Rsi, reading.value);
                let entered = edges.rsi_zone != Some(reading.zone);
                if entered && reading.zone != Zone::Neutral {
                    raised.push(Alert::Rsi(reading));
                }
                edges.rsi_zone = Some(reading.zone);
            }
        }
        drop(edges);

        for alert in &raised {
            increment(alert.counter());
            tracing::info!(symbol = %s.symbol, alert = %alert, "Market alert raised");
            self.journal.log(JournalLevel::Warn, alert.to_string());
            self.notifier.notify(&alert.to_string()).await;
        }

        Ok(raised)
    }

    /// Run the loop until the returned handle is stopped
    pub fn spawn(self: Arc<Self>) -> AlertHandle {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let period = self.settings.poll_interval.max(Duration::from_secs(1));

        let task = tokio::spawn(async move {
            tracing::info!(
                symbol = %self.settings.symbol,
                interval = %self.settings.interval,
                poll_secs = period.as_secs(),
                "Crash alert monitor started"
            );
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        if let Err(e) = self.check_once().await {
                            increment(CounterMetric::VenueErrors);
                            tracing::warn!(error = %e, "Alert check failed");
                        }
                    }
                }
            }
            tracing::info!("Crash alert monitor stopped");
        });

        AlertHandle {
            stop: Some(stop_tx),
            task,
        }
    }
}

/// Handle to a running alert loop
pub struct AlertHandle {
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl AlertHandle {
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop the loop and wait for it to exit
    pub async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Err(e) = (&mut self.task).await {
            tracing::warn!(error = %e, "Alert task ended abnormally");
        }
    }
}

impl Drop for AlertHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::venue::{Candle, PaperVenue};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    #[derive(Default)]
    struct RecordingNotifier {
        sent: std::sync::Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, text: &str) {
            self.sent.lock().unwrap().push(text.to_string());
        }
    }

    fn crash_candles() -> Vec<Candle> {
        (0..20)
            .map(|i| {
                let (close, volume) = if i < 10 {
                    (100.0, 10.0)
                } else {
                    (100.0 - (i - 9) as f64, 30.0)
                };
                Candle {
                    open_time: Utc.timestamp_opt(i * 60, 0).unwrap(),
                    open: close,
                    high: close,
                    low: close,
                    close,
                    volume,
                }
            })
            .collect()
    }

    async fn monitor(candles: Vec<Candle>) -> (CrashAlertMonitor, Arc<RecordingNotifier>, PaperVenue) {
        let venue = PaperVenue::new("BTC", "USDT", dec!(0));
        venue.set_candles(candles).await;
        let notifier = Arc::new(RecordingNotifier::default());
        let monitor = CrashAlertMonitor::new(
            AlertSettings::default(),
            Arc::new(venue.clone()),
            notifier.clone(),
            Journal::disabled(),
        );
        (monitor, notifier, venue)
    }

    #[tokio::test]
    async fn test_crash_alert_fires_once_per_episode() {
        let (monitor, notifier, venue) = monitor(crash_candles()).await;

        let first = monitor.check_once().await.unwrap();
        assert_eq!(first.len(), 1);
        assert!(matches!(first[0], Alert::CrashReversal(_)));

        // still crashing: no repeat
        assert!(monitor.check_once().await.unwrap().is_empty());

        // calm market clears the episode
        let calm: Vec<Candle> = crash_candles()
            .into_iter()
            .map(|c| Candle { close: 100.0, ..c })
            .collect();
        venue.set_candles(calm).await;
        assert!(monitor.check_once().await.unwrap().is_empty());

        venue.set_candles(crash_candles()).await;
        assert_eq!(monitor.check_once().await.unwrap().len(), 1);
        assert_eq!(notifier.sent.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_rsi_alerts_when_enabled() {
        let (mut monitor, notifier, _venue) = monitor(crash_candles()).await;
        monitor.settings.rsi_alerts = true;

        let alerts = monitor.check_once().await.unwrap();
        assert!(alerts
            .iter()
            .any(|a| matches!(a, Alert::Rsi(r) if r.zone == Zone::Oversold)));
        assert_eq!(notifier.sent.lock().unwrap().len(), alerts.len());

        for alert in &alerts {
            let expected = match alert {
                Alert::CrashReversal(_) => CounterMetric::CrashAlerts,
                Alert::Rsi(_) => CounterMetric::RsiAlerts,
            };
            assert_eq!(alert.counter(), expected);
        }
        assert!(alerts.iter().any(|a| a.counter() == CounterMetric::RsiAlerts));
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_loop_stops() {
        let (monitor, notifier, _venue) = monitor(crash_candles()).await;
        let handle = Arc::new(monitor).spawn();

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(handle.is_running());
        handle.stop().await;

        assert_eq!(notifier.sent.lock().unwrap().len(), 1);
    }
}
