//! Operator notifications
//!
//! Delivery is fire-and-forget: a failed send is logged and dropped, it
//! never reaches the caller.

mod telegram;

pub use telegram::TelegramNotifier;

use async_trait::async_trait;

/// Trait for notification sinks
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `text` to the operator
    async fn notify(&self, text: &str);
}

/// Notifier that only writes to the log. Used by headless runs.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, text: &str) {
        tracing::info!(target: "tradewatch::notify", "{}", text);
    }
}
