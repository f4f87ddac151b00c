//! Inbound event handling.
//!
//! Provider webhooks are normalized into [`ClassifiedEvent`]s by
//! [`classify`] before the reconciler sees them. Every raw request is also
//! forwarded to the archive writer as an [`ArchivedRequest`].

pub mod channels;
pub mod classifier;
pub mod types;

pub use channels::{
    ARCHIVE_CHANNEL_BUFFER, ArchiveReceiver, ArchiveSender, archive_channel, forward_to_archive,
};
pub use classifier::{MalformedEvent, classify};
pub use types::{ArchivedRequest, ClassifiedEvent, EventDomain, InvoiceAmounts};
