//! Webhook envelope posted by the payment provider to `/callback`.
//!
//! Every field is optional at this level: the provider sends many more
//! attributes than we care about, and a missing field must surface as a
//! classification failure rather than a deserialization error.
//!
//! ```json
//! {
//!   "event": {
//!     "subscription": "invoice",
//!     "log": {
//!       "type": "credited",
//!       "invoice": { "id": "5155165527080960", "amount": 1000, "fee": 50 }
//!     }
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookEnvelope {
    #[serde(default)]
    pub event: Option<WebhookEvent>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookEvent {
    /// Provider-side event id, only used for logging.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub subscription: Option<String>,
    #[serde(default)]
    pub log: Option<EventLog>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLog {
    #[serde(rename = "type", default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub invoice: Option<InvoiceLog>,
    #[serde(default)]
    pub transfer: Option<TransferLog>,
}

/// Invoice snapshot attached to invoice-domain events. Amounts are in
/// currency minor units.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLog {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub fee: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferLog {
    #[serde(default)]
    pub id: Option<String>,
}
