//! Invoice objects exchanged with the payment provider.

use serde::{Deserialize, Serialize};

/// A new invoice to be issued to a payer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceRequest {
    /// Amount in currency minor units.
    pub amount: i64,
    pub tax_id: String,
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub due: time::OffsetDateTime,
}

/// An invoice as confirmed by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedInvoice {
    pub id: String,
    pub amount: i64,
    #[serde(default)]
    pub tax_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
}

/// Batch wrapper used by the provider for both requests and responses:
/// `{"invoices": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceBatch<T> {
    pub invoices: Vec<T>,
}
