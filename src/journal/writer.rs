//! JSON-lines journal writer

use super::JournalEntry;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Spawn the background task that appends entries to `path`
pub fn spawn_writer(path: PathBuf, rx: mpsc::UnboundedReceiver<JournalEntry>) -> JoinHandle<()> {
    tokio::spawn(run_writer(path, rx))
}

async fn run_writer(path: PathBuf, mut rx: mpsc::UnboundedReceiver<JournalEntry>) {
    tracing::info!(path = %path.display(), "Journal writer started");
    let mut written = 0u64;

    while let Some(entry) = rx.recv().await {
        match append(&path, &entry).await {
            Ok(()) => written += 1,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to write journal entry");
            }
        }
    }

    tracing::info!(written, "Journal writer stopped");
}

// reopened per entry so a rotated or deleted file is recreated
async fn append(path: &Path, entry: &JournalEntry) -> std::io::Result<()> {
    let mut line = serde_json::to_vec(entry)?;
    line.push(b'\n');
    let mut file = OpenOptions::new().create(true).append(true).open(path).await?;
    file.write_all(&line).await?;
    file.flush().await
}

/// Last `limit` entries from the journal at `path`, newest first.
/// Lines that fail to parse are skipped.
pub async fn read_recent(path: impl AsRef<Path>, limit: usize) -> std::io::Result<Vec<JournalEntry>> {
    let content = match tokio::fs::read_to_string(path.as_ref()).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(vec![]),
        Err(e) => return Err(e),
    };

    Ok(content
        .lines()
        .rev()
        .filter_map(|line| serde_json::from_str(line).ok())
        .take(limit)
        .collect())
}
