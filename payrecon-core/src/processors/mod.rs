//! Components that act on records: the webhook reconciler and the
//! transfers it issues, the scheduled invoice generator, and the webhook
//! archive writer.

pub mod archive_writer;
pub mod invoice_generator;
pub mod reconciler;
pub mod transfer_issuer;

pub use archive_writer::ArchiveWriter;
pub use invoice_generator::{GenerateError, GenerationReport, InvoiceGenerator};
pub use reconciler::{Action, ReconcileError, ReconcileOutcome, Reconciler};
pub use transfer_issuer::{IssuedTransfer, TransferIssuer};
