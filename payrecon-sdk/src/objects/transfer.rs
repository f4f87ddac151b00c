//! Outbound transfer objects exchanged with the payment provider.

use serde::{Deserialize, Serialize};

/// A request for one outbound transfer.
///
/// `external_id` is the idempotency token: the provider rejects a second
/// transfer carrying an `external_id` it has already seen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    /// Amount in currency minor units.
    pub amount: i64,
    pub bank_code: String,
    pub branch_code: String,
    pub account_number: String,
    pub name: String,
    pub tax_id: String,
    pub account_type: String,
    pub external_id: String,
}

/// A transfer as accepted by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedTransfer {
    pub id: String,
    pub external_id: String,
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub status: String,
}

/// Batch wrapper: `{"transfers": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferBatch<T> {
    pub transfers: Vec<T>,
}
