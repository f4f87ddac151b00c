pub mod admin;
pub mod invoice;
pub mod transfer;
pub mod webhook;

pub use admin::{AdminInvoiceResponse, GenerateResponse, ListInvoicesQuery, clamp_pagination};
pub use invoice::{CreatedInvoice, InvoiceBatch, InvoiceRequest};
pub use transfer::{CreatedTransfer, TransferBatch, TransferRequest};
pub use webhook::{EventLog, InvoiceLog, TransferLog, WebhookEnvelope, WebhookEvent};

use serde::{Deserialize, Serialize};

/// Invoice status for API responses.
///
/// This is the API/DTO version without sqlx::Type.
/// For database operations, use the version in `payrecon-core::entities`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Unrequested,
    Requested,
    Created,
    Paid,
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvoiceStatus::Unrequested => write!(f, "unrequested"),
            InvoiceStatus::Requested => write!(f, "requested"),
            InvoiceStatus::Created => write!(f, "created"),
            InvoiceStatus::Paid => write!(f, "paid"),
        }
    }
}

/// Outbound transfer status for API responses.
///
/// This is the API/DTO version without sqlx::Type.
/// For database operations, use the version in `payrecon-core::entities`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    Unrequested,
    Requested,
    Created,
    Completed,
    Failed,
}

impl std::fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferStatus::Unrequested => write!(f, "unrequested"),
            TransferStatus::Requested => write!(f, "requested"),
            TransferStatus::Created => write!(f, "created"),
            TransferStatus::Completed => write!(f, "completed"),
            TransferStatus::Failed => write!(f, "failed"),
        }
    }
}
