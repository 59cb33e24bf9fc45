//! Run command implementation

use super::{build_venue, close_journal, open_journal};
use crate::alerts::{AlertSettings, CrashAlertMonitor};
use crate::bot::{run_bot, AuthorizedChat, BotState};
use crate::config::{Config, Secrets};
use crate::feed::BinanceFeed;
use crate::notify::{LogNotifier, Notifier, TelegramNotifier};
use crate::watch::SessionManager;
use clap::Args;
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Start crash alerts regardless of `alerts.enabled`
    #[arg(long)]
    pub alerts: bool,
}

impl RunArgs {
    pub async fn execute(&self, config: Config) -> anyhow::Result<()> {
        let secrets = Secrets::from_env();
        let config = config.with_secrets(&secrets);

        let token = config.telegram.bot_token.clone().ok_or_else(|| {
            anyhow::anyhow!("TELEGRAM_BOT_TOKEN is required to run the bot")
        })?;
        let bot = Bot::new(token);
        let auth = AuthorizedChat::new(config.telegram.chat_id);

        let notifier: Arc<dyn Notifier> = match auth.chat_id() {
            Some(chat_id) => Arc::new(TelegramNotifier::new(bot.clone(), chat_id)),
            None => Arc::new(LogNotifier),
        };

        let venue = build_venue(&config, &secrets).await?;
        let (journal, writer) = open_journal(&config.journal);
        let feed = Arc::new(BinanceFeed::new(&config.feed.ws_url));

        let manager = Arc::new(
            SessionManager::new(
                config.session_config(),
                feed,
                Arc::clone(&notifier),
                journal.clone(),
            )
            .with_venue(Arc::clone(&venue)),
        );

        let monitor = Arc::new(CrashAlertMonitor::new(
            AlertSettings {
                symbol: config.feed.symbol.to_uppercase(),
                interval: config.alerts.interval.clone(),
                candle_limit: config.alerts.candle_limit,
                poll_interval: Duration::from_secs(config.alerts.poll_interval_secs),
                crash: config.alerts.crash_params(),
                rsi_alerts: config.alerts.rsi_alerts,
            },
            Arc::clone(&venue),
            notifier,
            journal.clone(),
        ));

        let journal_path = config.journal.enabled.then(|| config.journal.path.clone());
        let state = Arc::new(
            BotState::new(
                config.feed.symbol.to_uppercase(),
                &config.venue.base_asset,
                &config.venue.quote_asset,
                venue,
                Arc::clone(&manager),
            )
            .with_journal(journal.clone(), journal_path)
            .with_monitor(monitor),
        );

        if config.alerts.enabled || self.alerts {
            state.start_monitor().await;
        }

        tracing::info!(
            symbol = %config.feed.symbol,
            mode = ?config.venue.mode,
            "tradewatch bot starting"
        );
        run_bot(bot, auth, Arc::clone(&state)).await;

        tracing::info!("Shutting down");
        state.stop_monitor().await;
        manager.shutdown().await;
        drop(state);
        drop(manager);
        close_journal(journal, writer).await;
        Ok(())
    }
}
