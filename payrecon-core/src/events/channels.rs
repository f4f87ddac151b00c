//! Channel between the callback handler and the archive writer.

use super::types::ArchivedRequest;
use tokio::sync::mpsc;

/// Requests buffered before the callback handler starts dropping archive
/// entries.
pub const ARCHIVE_CHANNEL_BUFFER: usize = 4096;

pub type ArchiveSender = mpsc::Sender<ArchivedRequest>;
pub type ArchiveReceiver = mpsc::Receiver<ArchivedRequest>;

pub fn archive_channel() -> (ArchiveSender, ArchiveReceiver) {
    mpsc::channel(ARCHIVE_CHANNEL_BUFFER)
}

/// Hand a request to the archive writer without waiting.
///
/// Returns `false` if the entry was dropped because the channel is full or
/// the writer has stopped. The dropped entry's receipt time is logged so the
/// gap in the archive can be traced.
pub fn forward_to_archive(tx: &ArchiveSender, request: ArchivedRequest) -> bool {
    match tx.try_send(request) {
        Ok(()) => true,
        Err(mpsc::error::TrySendError::Full(dropped)) => {
            tracing::warn!(
                received_at = %dropped.timestamp,
                "Archive channel full, dropping webhook archive entry"
            );
            false
        }
        Err(mpsc::error::TrySendError::Closed(dropped)) => {
            tracing::warn!(
                received_at = %dropped.timestamp,
                "Archive writer stopped, dropping webhook archive entry"
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_forward_drops_when_full_or_closed() {
        let (tx, rx) = mpsc::channel(1);
        let entry = || ArchivedRequest::new(BTreeMap::new(), b"{}");

        assert!(forward_to_archive(&tx, entry()));
        assert!(!forward_to_archive(&tx, entry()));

        drop(rx);
        assert!(!forward_to_archive(&tx, entry()));
    }

    #[tokio::test]
    async fn test_archive_channel_absorbs_a_burst() {
        let (tx, mut rx) = archive_channel();
        for _ in 0..ARCHIVE_CHANNEL_BUFFER {
            assert!(forward_to_archive(&tx, ArchivedRequest::new(BTreeMap::new(), b"{}")));
        }
        assert!(!forward_to_archive(&tx, ArchivedRequest::new(BTreeMap::new(), b"{}")));

        rx.recv().await.unwrap();
        assert!(forward_to_archive(&tx, ArchivedRequest::new(BTreeMap::new(), b"{}")));
    }
}
