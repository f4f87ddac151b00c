//! Admin API request and response types.

use serde::{Deserialize, Serialize};

use super::{InvoiceStatus, TransferStatus};

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Full invoice record for the admin API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminInvoiceResponse {
    pub invoice_id: String,
    pub invoice_status: InvoiceStatus,
    pub transfer_id: String,
    pub internal_transfer_id: String,
    pub transfer_status: TransferStatus,
    pub transfer_amount: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Result of a manually triggered generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub requested: usize,
    pub created: usize,
    pub persisted: usize,
}

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 200;
const MAX_OFFSET: i64 = 100_000;

/// Query parameters for listing invoice records.
#[derive(Debug, Clone, Deserialize)]
pub struct ListInvoicesQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
    pub invoice_status: Option<InvoiceStatus>,
    pub transfer_status: Option<TransferStatus>,
    /// Only records last changed strictly before this unix timestamp.
    pub updated_before: Option<i64>,
}

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

/// Clamp limit and offset to safe maximums.
pub fn clamp_pagination(limit: i64, offset: i64) -> (i64, i64) {
    (limit.clamp(1, MAX_LIMIT), offset.clamp(0, MAX_OFFSET))
}
