use super::types::{ClassifiedEvent, EventDomain, InvoiceAmounts};
use payrecon_sdk::objects::WebhookEnvelope;

/// A webhook payload missing a field required for its domain.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed event: missing {field}")]
pub struct MalformedEvent {
    pub field: &'static str,
}

impl MalformedEvent {
    fn missing(field: &'static str) -> Self {
        Self { field }
    }
}

/// Event type that carries the settlement amounts.
pub const CREDITED: &str = "credited";

/// Subscription matching is by substring, "invoice" first.
fn domain_of(subscription: &str) -> EventDomain {
    if subscription.contains("invoice") {
        EventDomain::Invoice
    } else if subscription.contains("transfer") {
        EventDomain::Transfer
    } else {
        EventDomain::Other(subscription.to_owned())
    }
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|s| !s.is_empty())
}

/// Normalize a webhook envelope.
///
/// Unknown domains and event types are passed through untouched; only
/// missing fields fail.
pub fn classify(envelope: &WebhookEnvelope) -> Result<ClassifiedEvent, MalformedEvent> {
    let event = envelope
        .event
        .as_ref()
        .ok_or(MalformedEvent::missing("event"))?;
    let subscription = event
        .subscription
        .as_deref()
        .ok_or(MalformedEvent::missing("event.subscription"))?;
    let log = event
        .log
        .as_ref()
        .ok_or(MalformedEvent::missing("event.log"))?;
    let event_type = log
        .event_type
        .as_deref()
        .ok_or(MalformedEvent::missing("event.log.type"))?
        .to_owned();

    let domain = domain_of(subscription);
    let (entity_id, amounts) = match &domain {
        EventDomain::Invoice => {
            let invoice = log
                .invoice
                .as_ref()
                .ok_or(MalformedEvent::missing("event.log.invoice"))?;
            let id = non_empty(invoice.id.as_ref())
                .ok_or(MalformedEvent::missing("event.log.invoice.id"))?;
            let amounts = match (invoice.amount, invoice.fee) {
                (Some(amount), Some(fee)) => Some(InvoiceAmounts { amount, fee }),
                (None, _) if event_type == CREDITED => {
                    return Err(MalformedEvent::missing("event.log.invoice.amount"));
                }
                (_, None) if event_type == CREDITED => {
                    return Err(MalformedEvent::missing("event.log.invoice.fee"));
                }
                _ => None,
            };
            (id.to_owned(), amounts)
        }
        EventDomain::Transfer => {
            let transfer = log
                .transfer
                .as_ref()
                .ok_or(MalformedEvent::missing("event.log.transfer"))?;
            let id = non_empty(transfer.id.as_ref())
                .ok_or(MalformedEvent::missing("event.log.transfer.id"))?;
            (id.to_owned(), None)
        }
        EventDomain::Other(_) => (String::new(), None),
    };

    Ok(ClassifiedEvent {
        domain,
        event_type,
        entity_id,
        amounts,
        event_id: event.id.clone(),
    })
}
