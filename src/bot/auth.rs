use teloxide::types::ChatId;

/// Authorization filter for the single operator chat
#[derive(Debug, Clone, Copy)]
pub struct AuthorizedChat {
    chat_id: Option<ChatId>,
}

impl AuthorizedChat {
    pub fn new(chat_id: Option<i64>) -> Self {
        if chat_id.is_none() {
            tracing::warn!("No authorized chat configured, every command will be rejected");
        }
        Self {
            chat_id: chat_id.map(ChatId),
        }
    }

    pub fn chat_id(&self) -> Option<ChatId> {
        self.chat_id
    }

    pub fn is_authorized(&self, chat_id: ChatId) -> bool {
        self.chat_id == Some(chat_id)
    }
}
