use serde::Serialize;
use std::collections::BTreeMap;
use time::OffsetDateTime;

/// Which record family an event refers to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventDomain {
    Invoice,
    Transfer,
    /// Any subscription containing neither "invoice" nor "transfer".
    Other(String),
}

impl std::fmt::Display for EventDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventDomain::Invoice => write!(f, "invoice"),
            EventDomain::Transfer => write!(f, "transfer"),
            EventDomain::Other(subscription) => write!(f, "other:{subscription}"),
        }
    }
}

/// Gross amount and provider fee of a paid invoice, in minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvoiceAmounts {
    pub amount: i64,
    pub fee: i64,
}

impl InvoiceAmounts {
    /// Amount owed to the beneficiary.
    pub fn net(&self) -> i64 {
        self.amount.saturating_sub(self.fee)
    }
}

/// Normalized webhook event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedEvent {
    pub domain: EventDomain,
    pub event_type: String,
    /// Invoice id for invoice events, transfer id for transfer events, empty
    /// for other domains.
    pub entity_id: String,
    /// Present for invoice events that carried both `amount` and `fee`.
    pub amounts: Option<InvoiceAmounts>,
    /// Provider event id, for logging.
    pub event_id: Option<String>,
}

/// One inbound webhook request as written to the archive log.
#[derive(Debug, Clone, Serialize)]
pub struct ArchivedRequest {
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub headers: BTreeMap<String, String>,
    /// Parsed JSON body, or the raw body as a string when it is not JSON.
    pub body: serde_json::Value,
}

impl ArchivedRequest {
    pub fn new(headers: BTreeMap<String, String>, body: &[u8]) -> Self {
        let body = serde_json::from_slice(body).unwrap_or_else(|_| {
            serde_json::Value::String(String::from_utf8_lossy(body).into_owned())
        });
        Self {
            timestamp: OffsetDateTime::now_utc(),
            headers,
            body,
        }
    }
}
