//! CLI interface for tradewatch
//!
//! Provides subcommands for:
//! - `run`: Telegram bot with the auto-sell engine and alerts
//! - `watch`: Headless auto-sell for one target price
//! - `price`: Print the current price
//! - `analyze`: Print the indicator readings
//! - `config`: Show configuration

mod analyze;
mod price;
mod run;
mod watch;

pub use analyze::AnalyzeArgs;
pub use price::PriceArgs;
pub use run::RunArgs;
pub use watch::WatchArgs;

use crate::config::{Config, JournalConfig, Secrets, VenueMode};
use crate::journal::Journal;
use crate::venue::{BinanceVenue, PaperVenue, TradingVenue};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

#[derive(Parser, Debug)]
#[command(name = "tradewatch")]
#[command(about = "Telegram-controlled spot trading assistant with price-target auto-sell")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the Telegram bot
    Run(RunArgs),
    /// Watch one target price without the bot
    Watch(WatchArgs),
    /// Print the current price
    Price(PriceArgs),
    /// Print Bollinger, RSI and crash readings
    Analyze(AnalyzeArgs),
    /// Show configuration
    Config,
}

/// Venue for the configured mode. Paper mode still reads live market data.
pub(crate) async fn build_venue(
    config: &Config,
    secrets: &Secrets,
) -> anyhow::Result<Arc<dyn TradingVenue>> {
    match config.venue.mode {
        VenueMode::Live => {
            let credentials = secrets.binance.clone().ok_or_else(|| {
                anyhow::anyhow!("live mode requires BINANCE_API_KEY and BINANCE_API_SECRET")
            })?;
            let venue = BinanceVenue::new(config.binance_venue_config(), Some(credentials))?;
            tracing::info!(base_url = %config.venue.base_url, "Live trading on Binance");
            Ok(Arc::new(venue))
        }
        VenueMode::Paper => {
            let market = BinanceVenue::new(config.binance_venue_config(), None)?;
            let paper = PaperVenue::new(
                &config.venue.base_asset,
                &config.venue.quote_asset,
                config.venue.fee_rate,
            )
            .with_market(Arc::new(market));

            let balances = &config.venue.paper;
            paper
                .set_balance(&config.venue.base_asset, balances.base_balance)
                .await;
            paper
                .set_balance(&config.venue.quote_asset, balances.quote_balance)
                .await;
            tracing::info!(
                base = %balances.base_balance,
                quote = %balances.quote_balance,
                "Paper trading"
            );
            Ok(Arc::new(paper))
        }
    }
}

/// Journal per config, plus its writer task when enabled
pub(crate) fn open_journal(config: &JournalConfig) -> (Journal, Option<JoinHandle<()>>) {
    if !config.enabled {
        return (Journal::disabled(), None);
    }
    let (journal, task) = Journal::open(&config.path);
    (journal, Some(task))
}

/// Drop the last journal handle and let the writer drain
pub(crate) async fn close_journal(journal: Journal, writer: Option<JoinHandle<()>>) {
    drop(journal);
    let Some(writer) = writer else {
        return;
    };
    match tokio::time::timeout(Duration::from_secs(2), writer).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!(error = %e, "Journal writer ended abnormally"),
        Err(_) => tracing::warn!("Journal writer still busy at shutdown"),
    }
}
