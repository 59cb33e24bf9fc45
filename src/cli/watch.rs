//! Headless auto-sell for a single target

use super::{build_venue, close_journal, open_journal};
use crate::config::{Config, Secrets};
use crate::feed::{BinanceFeed, ChannelFeed, PriceFeed};
use crate::notify::LogNotifier;
use crate::watch::{SellExecution, SessionManager, SessionOutcome, WatchError};
use clap::Args;
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Target price that arms the trend check
    pub target: Decimal,

    /// Base quantity to sell on a Sell decision
    #[arg(short, long)]
    pub quantity: Option<Decimal>,

    /// Decide only, never place an order
    #[arg(long)]
    pub dry_run: bool,

    /// Replay prices from a file (one per line) instead of the live feed
    #[arg(long)]
    pub replay: Option<PathBuf>,

    /// Delay between replayed prices (milliseconds)
    #[arg(long, default_value_t = 200)]
    pub replay_tick_ms: u64,
}

impl WatchArgs {
    pub async fn execute(&self, config: Config) -> anyhow::Result<()> {
        let secrets = Secrets::from_env();
        let session_config = config.session_config();
        let window = session_config.sample_interval * (session_config.sample_count as u32 + 1);

        let (feed, replay): (Arc<dyn PriceFeed>, Option<ChannelFeed>) = match &self.replay {
            Some(_) => {
                let feed = ChannelFeed::new();
                (Arc::new(feed.clone()), Some(feed))
            }
            None => (Arc::new(BinanceFeed::new(&config.feed.ws_url)), None),
        };

        let (journal, writer) = open_journal(&config.journal);
        let mut manager = SessionManager::new(
            session_config,
            feed,
            Arc::new(LogNotifier),
            journal.clone(),
        );
        if !self.dry_run {
            manager = manager.with_venue(build_venue(&config, &secrets).await?);
        }

        let quantity = if self.dry_run {
            None
        } else {
            self.quantity.or(config.watch.sell_quantity)
        };
        manager.start_with_quantity(self.target, quantity).await?;
        println!(
            "Watching {} for {} (sell quantity: {})",
            config.feed.symbol.to_uppercase(),
            self.target,
            quantity.map_or_else(|| "none".to_string(), |q| q.to_string())
        );

        if let (Some(path), Some(feed)) = (&self.replay, replay) {
            let prices = read_prices(path)?;
            let tick = Duration::from_millis(self.replay_tick_ms);
            tokio::spawn(replay_prices(feed, prices, tick, window));
        }

        let outcome = tokio::select! {
            outcome = manager.wait_closed() => outcome,
            _ = tokio::signal::ctrl_c() => {
                println!("Interrupted, cancelling");
                manager.stop().await?;
                manager.last_outcome().await
            }
        };

        close_journal(journal, writer).await;
        drop(manager);

        match outcome {
            Some(SessionOutcome::Decided { decision, execution }) => {
                println!(
                    "Decision: {} (start {}, max {})",
                    decision.action, decision.start_price, decision.reference_max
                );
                match execution {
                    SellExecution::Placed(order) => println!("Order placed: {order}"),
                    SellExecution::Skipped => {}
                    SellExecution::Failed(e) => anyhow::bail!("sell order failed: {e}"),
                }
                Ok(())
            }
            Some(SessionOutcome::Cancelled) => {
                println!("Cancelled");
                Ok(())
            }
            Some(SessionOutcome::Disconnected) => Err(WatchError::FeedDisconnected.into()),
            None => anyhow::bail!("watch session ended without an outcome"),
        }
    }
}

fn read_prices(path: &Path) -> anyhow::Result<Vec<Decimal>> {
    let content = std::fs::read_to_string(path)?;
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| {
            Decimal::from_str(line).map_err(|e| anyhow::anyhow!("bad price '{line}': {e}"))
        })
        .collect()
}

/// Push every price, give the sampling window time to finish, then hang up
async fn replay_prices(feed: ChannelFeed, prices: Vec<Decimal>, tick: Duration, window: Duration) {
    for price in prices {
        if !feed.push(price).await {
            return;
        }
        tokio::time::sleep(tick).await;
    }
    tokio::time::sleep(window).await;
    feed.disconnect().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_prices_skips_comments_and_blanks() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "# replay\n49990\n\n50010.5\n").unwrap();
        assert_eq!(
            read_prices(file.path()).unwrap(),
            vec![dec!(49990), dec!(50010.5)]
        );
    }

    #[test]
    fn test_read_prices_rejects_garbage() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "50000\nabc\n").unwrap();
        assert!(read_prices(file.path()).is_err());
    }
}
