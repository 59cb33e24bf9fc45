//! Configuration types for tradewatch

use crate::feed::BINANCE_WS_URL;
use crate::indicators::CrashParams;
use crate::telemetry::LogFormat;
use crate::venue::{BinanceVenueConfig, Credentials, BINANCE_API_URL};
use crate::watch::SessionConfig;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub watch: WatchConfig,
    #[serde(default)]
    pub venue: VenueConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub alerts: AlertsConfig,
    #[serde(default)]
    pub journal: JournalConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Price feed configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_symbol")]
    pub symbol: String,
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
}

fn default_symbol() -> String {
    "BTCUSDT".to_string()
}
fn default_ws_url() -> String {
    BINANCE_WS_URL.to_string()
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            symbol: default_symbol(),
            ws_url: default_ws_url(),
        }
    }
}

/// Auto-sell engine configuration
#[derive(Debug, Clone, Deserialize)]
pub struct WatchConfig {
    /// Samples taken after the target is crossed
    #[serde(default = "default_sample_count")]
    pub sample_count: usize,

    /// Spacing between samples (milliseconds)
    #[serde(default = "default_sample_interval_ms")]
    pub sample_interval_ms: u64,

    /// Fractional rise above the crossing price needed to hold
    #[serde(default = "default_hold_margin")]
    pub hold_margin: Decimal,

    /// Base quantity sold on a Sell decision. Unset records the decision only.
    #[serde(default)]
    pub sell_quantity: Option<Decimal>,
}

fn default_sample_count() -> usize {
    10
}
fn default_sample_interval_ms() -> u64 {
    1000
}
fn default_hold_margin() -> Decimal {
    Decimal::new(1, 3) // 0.001 = 0.1%
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            sample_count: 10,
            sample_interval_ms: 1000,
            hold_margin: Decimal::new(1, 3),
            sell_quantity: None,
        }
    }
}

/// Venue mode: paper trading or live
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum VenueMode {
    #[default]
    Paper,
    Live,
}

/// Trading venue configuration
#[derive(Debug, Clone, Deserialize)]
pub struct VenueConfig {
    #[serde(default)]
    pub mode: VenueMode,

    #[serde(default = "default_api_url")]
    pub base_url: String,

    #[serde(default = "default_base_asset")]
    pub base_asset: String,

    #[serde(default = "default_quote_asset")]
    pub quote_asset: String,

    /// Paper fee charged in the quote asset
    #[serde(default = "default_fee_rate")]
    pub fee_rate: Decimal,

    #[serde(default = "default_recv_window_ms")]
    pub recv_window_ms: u64,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub paper: PaperConfig,
}

fn default_api_url() -> String {
    BINANCE_API_URL.to_string()
}
fn default_base_asset() -> String {
    "BTC".to_string()
}
fn default_quote_asset() -> String {
    "USDT".to_string()
}
fn default_fee_rate() -> Decimal {
    Decimal::new(1, 3) // 0.1%
}
fn default_recv_window_ms() -> u64 {
    5000
}
fn default_timeout_secs() -> u64 {
    10
}

impl Default for VenueConfig {
    fn default() -> Self {
        Self {
            mode: VenueMode::Paper,
            base_url: default_api_url(),
            base_asset: default_base_asset(),
            quote_asset: default_quote_asset(),
            fee_rate: Decimal::new(1, 3),
            recv_window_ms: 5000,
            timeout_secs: 10,
            paper: PaperConfig::default(),
        }
    }
}

/// Starting balances for the paper venue
#[derive(Debug, Clone, Deserialize)]
pub struct PaperConfig {
    #[serde(default)]
    pub base_balance: Decimal,
    #[serde(default = "default_paper_quote_balance")]
    pub quote_balance: Decimal,
}

fn default_paper_quote_balance() -> Decimal {
    Decimal::new(1000, 0)
}

impl Default for PaperConfig {
    fn default() -> Self {
        Self {
            base_balance: Decimal::ZERO,
            quote_balance: Decimal::new(1000, 0),
        }
    }
}

/// Telegram bot configuration. Both values may come from the environment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: Option<String>,
    /// The only chat allowed to issue commands and receive alerts
    #[serde(default)]
    pub chat_id: Option<i64>,
}

/// Background alert loops
#[derive(Debug, Clone, Deserialize)]
pub struct AlertsConfig {
    /// Start the crash-reversal monitor with the bot
    #[serde(default)]
    pub enabled: bool,

    /// Candle interval the monitor polls
    #[serde(default = "default_alert_interval")]
    pub interval: String,

    #[serde(default = "default_candle_limit")]
    pub candle_limit: u16,

    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Minimum drop over the recent window, in percent
    #[serde(default = "default_drop_threshold_pct")]
    pub drop_threshold_pct: f64,

    #[serde(default = "default_crash_period")]
    pub period: usize,

    #[serde(default = "default_volume_multiplier")]
    pub volume_multiplier: f64,

    /// Also alert when RSI leaves the 30..70 range
    #[serde(default)]
    pub rsi_alerts: bool,
}

fn default_alert_interval() -> String {
    "1m".to_string()
}
fn default_candle_limit() -> u16 {
    50
}
fn default_poll_interval_secs() -> u64 {
    60
}
fn default_drop_threshold_pct() -> f64 {
    1.0
}
fn default_crash_period() -> usize {
    10
}
fn default_volume_multiplier() -> f64 {
    1.5
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval: default_alert_interval(),
            candle_limit: 50,
            poll_interval_secs: 60,
            drop_threshold_pct: 1.0,
            period: 10,
            volume_multiplier: 1.5,
            rsi_alerts: false,
        }
    }
}

impl AlertsConfig {
    pub fn crash_params(&self) -> CrashParams {
        CrashParams {
            drop_threshold_pct: self.drop_threshold_pct,
            period: self.period,
            volume_multiplier: self.volume_multiplier,
        }
    }
}

/// Event journal configuration
#[derive(Debug, Clone, Deserialize)]
pub struct JournalConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_journal_path")]
    pub path: PathBuf,
}

fn default_true() -> bool {
    true
}
fn default_journal_path() -> PathBuf {
    PathBuf::from("tradewatch-journal.jsonl")
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_journal_path(),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    /// Prometheus listener port; no listener when unset
    #[serde(default)]
    pub metrics_port: Option<u16>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            metrics_port: None,
            log_level: default_log_level(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.feed.symbol.trim().is_empty() {
            anyhow::bail!("feed.symbol must not be empty");
        }
        if self.watch.sample_count == 0 {
            anyhow::bail!("watch.sample_count must be at least 1");
        }
        if self.watch.sample_interval_ms == 0 {
            anyhow::bail!("watch.sample_interval_ms must be positive");
        }
        if self.watch.hold_margin.is_sign_negative() {
            anyhow::bail!("watch.hold_margin must not be negative");
        }
        if self
            .watch
            .sell_quantity
            .is_some_and(|q| q <= Decimal::ZERO)
        {
            anyhow::bail!("watch.sell_quantity must be positive");
        }
        if self.alerts.period == 0 {
            anyhow::bail!("alerts.period must be at least 1");
        }
        Ok(())
    }

    /// Apply environment secrets on top of the file values
    pub fn with_secrets(mut self, secrets: &Secrets) -> Self {
        if let Some(token) = &secrets.telegram_token {
            self.telegram.bot_token = Some(token.clone());
        }
        if let Some(chat_id) = secrets.telegram_chat_id {
            self.telegram.chat_id = Some(chat_id);
        }
        self
    }

    /// Engine parameters for a watch session on the configured symbol
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            symbol: self.feed.symbol.to_uppercase(),
            sample_count: self.watch.sample_count,
            sample_interval: Duration::from_millis(self.watch.sample_interval_ms),
            hold_margin: self.watch.hold_margin,
            sell_quantity: self.watch.sell_quantity,
        }
    }

    pub fn binance_venue_config(&self) -> BinanceVenueConfig {
        BinanceVenueConfig {
            base_url: self.venue.base_url.clone(),
            timeout: Duration::from_secs(self.venue.timeout_secs),
            recv_window_ms: self.venue.recv_window_ms,
        }
    }
}

/// Secrets read from the environment (and `.env`)
#[derive(Debug, Clone, Default)]
pub struct Secrets {
    pub binance: Option<Credentials>,
    pub telegram_token: Option<String>,
    pub telegram_chat_id: Option<i64>,
}

impl Secrets {
    /// Load `.env` if present, then read the process environment
    pub fn from_env() -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded .env");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let binance = match (get("BINANCE_API_KEY"), get("BINANCE_API_SECRET")) {
            (Some(api_key), Some(api_secret)) => Some(Credentials {
                api_key,
                api_secret,
            }),
            _ => None,
        };

        let telegram_chat_id = get("TELEGRAM_CHAT_ID").and_then(|raw| match raw.trim().parse() {
            Ok(id) => Some(id),
            Err(_) => {
                tracing::warn!(value = %raw, "TELEGRAM_CHAT_ID is not a number, ignoring");
                None
            }
        });

        Self {
            binance,
            telegram_token: get("TELEGRAM_BOT_TOKEN"),
            telegram_chat_id,
        }
    }
}
