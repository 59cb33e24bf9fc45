//! Durable event journal
//!
//! Lifecycle events and decisions are appended as JSON lines by a
//! background writer. Logging is best-effort: the caller never waits on
//! disk and never sees a write error.

mod writer;

pub use writer::{read_recent, spawn_writer};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Journal entry severity / category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JournalLevel {
    Info,
    Warn,
    Error,
    Buy,
    Sell,
}

impl fmt::Display for JournalLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JournalLevel::Info => "INFO",
            JournalLevel::Warn => "WARN",
            JournalLevel::Error => "ERROR",
            JournalLevel::Buy => "BUY",
            JournalLevel::Sell => "SELL",
        };
        f.write_str(s)
    }
}

/// One journal line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub timestamp: DateTime<Utc>,
    pub level: JournalLevel,
    pub message: String,
}

impl fmt::Display for JournalEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.level,
            self.message
        )
    }
}

/// Cloneable handle for appending to the journal
#[derive(Debug, Clone)]
pub struct Journal {
    tx: Option<mpsc::UnboundedSender<JournalEntry>>,
}

impl Journal {
    /// A journal that discards everything
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// A journal whose entries land on the returned receiver
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<JournalEntry>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// A journal appending to `path`, plus its writer task
    pub fn open(path: impl AsRef<Path>) -> (Self, JoinHandle<()>) {
        let (journal, rx) = Self::channel();
        let task = spawn_writer(path.as_ref().to_path_buf(), rx);
        (journal, task)
    }

    /// Record an entry. Never blocks and never fails.
    pub fn log(&self, level: JournalLevel, message: impl Into<String>) {
        let Some(tx) = &self.tx else {
            return;
        };
        let entry = JournalEntry {
            timestamp: Utc::now(),
            level,
            message: message.into(),
        };
        if tx.send(entry).is_err() {
            tracing::warn!("Journal writer has stopped, entry dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_journal_is_silent() {
        Journal::disabled().log(JournalLevel::Info, "nothing happens");
    }

    #[tokio::test]
    async fn test_channel_journal_delivers_entries() {
        let (journal, mut rx) = Journal::channel();
        journal.log(JournalLevel::Sell, "sold 0.001 at 50012");

        let entry = rx.recv().await.unwrap();
        assert_eq!(entry.level, JournalLevel::Sell);
        assert_eq!(entry.message, "sold 0.001 at 50012");
    }

    #[test]
    fn test_log_after_receiver_dropped_does_not_panic() {
        let (journal, rx) = Journal::channel();
        drop(rx);
        journal.log(JournalLevel::Warn, "lost");
    }

    #[test]
    fn test_level_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&JournalLevel::Sell).unwrap(), "\"SELL\"");
        assert_eq!(JournalLevel::Warn.to_string(), "WARN");
    }
}
