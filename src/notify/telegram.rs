//! Telegram chat notifier

use super::Notifier;
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::ChatId;
use teloxide::RequestError;

/// Sends notifications to a single Telegram chat
#[derive(Clone)]
pub struct TelegramNotifier {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramNotifier {
    pub fn new(bot: Bot, chat_id: ChatId) -> Self {
        Self { bot, chat_id }
    }

    pub fn chat_id(&self) -> ChatId {
        self.chat_id
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, text: &str) {
        match self.bot.send_message(self.chat_id, text).await {
            Ok(_) => {}
            Err(RequestError::RetryAfter(delay)) => {
                tracing::warn!(chat_id = %self.chat_id, ?delay, "Telegram rate limited, notification dropped");
            }
            Err(err) => {
                tracing::error!(chat_id = %self.chat_id, error = %err, "Failed to deliver notification");
            }
        }
    }
}
