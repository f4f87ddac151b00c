//! Append-only log of inbound webhook requests.

use crate::events::{ArchiveReceiver, ArchivedRequest};
use std::path::PathBuf;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::watch;
use tracing::{error, info};

/// Writes each [`ArchivedRequest`] as one JSON line.
///
/// Entries still queued when shutdown is signaled are written before the
/// task exits. A failed write is logged and the file is reopened for the
/// next entry.
pub struct ArchiveWriter {
    path: PathBuf,
    archive_rx: ArchiveReceiver,
    shutdown_rx: watch::Receiver<bool>,
    file: Option<File>,
}

impl ArchiveWriter {
    pub fn new(
        path: impl Into<PathBuf>,
        archive_rx: ArchiveReceiver,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            path: path.into(),
            archive_rx,
            shutdown_rx,
            file: None,
        }
    }

    pub async fn run(mut self) {
        info!(path = %self.path.display(), "ArchiveWriter started");

        loop {
            tokio::select! {
                biased;

                changed = self.shutdown_rx.changed() => {
                    if changed.is_err() || *self.shutdown_rx.borrow() {
                        info!("ArchiveWriter received shutdown signal");
                        break;
                    }
                }

                entry = self.archive_rx.recv() => match entry {
                    Some(entry) => self.write(&entry).await,
                    None => {
                        info!("Archive channel closed");
                        break;
                    }
                },
            }
        }

        self.archive_rx.close();
        while let Some(entry) = self.archive_rx.recv().await {
            self.write(&entry).await;
        }

        info!("ArchiveWriter shutdown complete");
    }

    async fn write(&mut self, entry: &ArchivedRequest) {
        let mut line = match serde_json::to_vec(entry) {
            Ok(line) => line,
            Err(e) => {
                error!(error = %e, "Failed to serialize webhook archive entry");
                return;
            }
        };
        line.push(b'\n');

        if let Err(e) = self.append(&line).await {
            error!(path = %self.path.display(), error = %e, "Failed to write webhook archive entry");
            self.file = None;
        }
    }

    async fn append(&mut self, line: &[u8]) -> std::io::Result<()> {
        let file = match self.file.take() {
            Some(file) => file,
            None => {
                OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&self.path)
                    .await?
            }
        };
        let file = self.file.insert(file);
        file.write_all(line).await?;
        file.flush().await
    }
}
