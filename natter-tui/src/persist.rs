//! Persistence collaborator: drains the persist queue and appends each
//! chat line to a flat messages file.

use std::path::PathBuf;

use anyhow::Result;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;

/// Runs until the queue closes. The channel closing (every sender
/// dropped) is the end-of-stream sentinel: the last queued line is
/// still written before this returns.
pub async fn save_messages(mut rx: mpsc::UnboundedReceiver<String>, path: PathBuf) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .await?;
    tracing::debug!(path = %path.display(), "persisting messages");

    while let Some(line) = rx.recv().await {
        file.write_all(line.as_bytes()).await?;
        file.write_all(b"\n").await?;
    }
    file.flush().await?;
    tracing::debug!("message stream ended");
    Ok(())
}
