//! Telegram command surface
//!
//! Commands are accepted only from the configured operator chat; anything
//! else is logged and dropped.

mod args;
mod auth;
mod commands;
mod handlers;

pub use args::{parse_autosell_args, parse_count, parse_order_args, ArgsError, AutosellArgs, OrderArgs};
pub use auth::AuthorizedChat;
pub use commands::Command;
pub use handlers::{handle_command, BotState};

use std::sync::Arc;
use teloxide::prelude::*;

/// Run the dispatcher until Ctrl-C
pub async fn run_bot(bot: Bot, auth: AuthorizedChat, state: Arc<BotState>) {
    let handler = Update::filter_message()
        .filter(move |msg: Message| {
            let authorized = auth.is_authorized(msg.chat.id);
            if !authorized {
                tracing::warn!(chat_id = %msg.chat.id, "Unauthorized access attempt");
            }
            authorized
        })
        .filter_command::<Command>()
        .endpoint(move |bot: Bot, msg: Message, cmd: Command| {
            let state = Arc::clone(&state);
            async move { handle_command(bot, msg, cmd, state).await }
        });

    tracing::info!("Starting Telegram bot dispatcher...");
    Dispatcher::builder(bot, handler)
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}
