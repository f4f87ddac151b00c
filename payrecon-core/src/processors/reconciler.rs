//! Webhook-driven state machine over invoice records.
//!
//! Invoice events are keyed by invoice id, transfer events by the provider's
//! transfer id. Each event performs one atomic update of one record. The
//! update that moves an invoice into `paid` also reserves the transfer (its
//! idempotency token and net amount), so only that caller ever issues it.

use crate::entities::invoice_records::{InvoiceRecord, TransferClaim};
use crate::entities::{InvoiceStatus, TransferStatus};
use crate::events::classifier::CREDITED;
use crate::events::{ClassifiedEvent, EventDomain, InvoiceAmounts};
use crate::processors::transfer_issuer::TransferIssuer;
use crate::provider::ProviderError;
use crate::store::{RecordStore, StoreError};
use kanau::processor::Processor;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("transfer for invoice {invoice_id} failed: {source}")]
    Provider {
        invoice_id: String,
        #[source]
        source: ProviderError,
    },

    #[error("credited event for invoice {0} carries no amounts")]
    MissingAmounts(String),

    #[error("invoice {0} not found")]
    NotFound(String),

    #[error("invoice {0} is not awaiting a transfer")]
    NotEligible(String),

    #[error("a transfer for invoice {0} is already being issued")]
    IssuanceInFlight(String),

    #[error("transfer {transfer_id} for invoice {invoice_id} could not be linked to its record")]
    TransferNotRecorded {
        invoice_id: String,
        transfer_id: String,
    },
}

/// What a classified event asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    AdvanceInvoice(InvoiceStatus),
    /// Mark paid and issue the net amount as a transfer.
    PayInvoice(InvoiceAmounts),
    AdvanceTransfer(TransferStatus),
    Ignore,
}

impl Action {
    pub fn resolve(event: &ClassifiedEvent) -> Result<Self, ReconcileError> {
        let action = match (&event.domain, event.event_type.as_str()) {
            (EventDomain::Invoice, "created") => Action::AdvanceInvoice(InvoiceStatus::Created),
            (EventDomain::Invoice, CREDITED) => Action::PayInvoice(
                event
                    .amounts
                    .ok_or_else(|| ReconcileError::MissingAmounts(event.entity_id.clone()))?,
            ),
            (EventDomain::Transfer, "created") => Action::AdvanceTransfer(TransferStatus::Created),
            (EventDomain::Transfer, "success") => {
                Action::AdvanceTransfer(TransferStatus::Completed)
            }
            (EventDomain::Transfer, "failed") => Action::AdvanceTransfer(TransferStatus::Failed),
            _ => Action::Ignore,
        };
        Ok(action)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// No rule for this (domain, event type) pair.
    Ignored,
    /// The event refers to a record this service does not hold.
    RecordNotFound,
    /// The record already reached the requested status, or a later one.
    Unchanged { record: InvoiceRecord },
    InvoiceAdvanced {
        previous: InvoiceStatus,
        record: InvoiceRecord,
    },
    /// The invoice was paid and its transfer was issued and linked.
    TransferIssued { record: InvoiceRecord },
    TransferAdvanced {
        previous: TransferStatus,
        record: InvoiceRecord,
    },
}

/// Applies webhook events to the record store.
pub struct Reconciler {
    store: Arc<dyn RecordStore>,
    issuer: TransferIssuer,
    /// Invoice ids with a transfer request currently outstanding.
    in_flight: Mutex<HashSet<String>>,
}

/// Marks an invoice as having a transfer request outstanding until dropped.
struct InFlightGuard<'a> {
    set: &'a Mutex<HashSet<String>>,
    invoice_id: String,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(set: &'a Mutex<HashSet<String>>, invoice_id: &str) -> Option<Self> {
        let inserted = set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(invoice_id.to_owned());
        inserted.then(|| Self {
            set,
            invoice_id: invoice_id.to_owned(),
        })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.invoice_id);
    }
}

impl Reconciler {
    pub fn new(store: Arc<dyn RecordStore>, issuer: TransferIssuer) -> Self {
        Self {
            store,
            issuer,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Apply one classified event.
    ///
    /// A provider failure while issuing a transfer is returned as an error,
    /// but the invoice stays `paid` with its transfer reserved so it can be
    /// re-issued with [`reissue_transfer`](Self::reissue_transfer).
    pub async fn apply(&self, event: &ClassifiedEvent) -> Result<ReconcileOutcome, ReconcileError> {
        info!(
            domain = %event.domain,
            event_type = %event.event_type,
            entity_id = %event.entity_id,
            event_id = event.event_id.as_deref().unwrap_or_default(),
            "Webhook event received"
        );

        match Action::resolve(event)? {
            Action::Ignore => {
                info!(
                    domain = %event.domain,
                    event_type = %event.event_type,
                    "Webhook event ignored"
                );
                Ok(ReconcileOutcome::Ignored)
            }
            Action::AdvanceInvoice(target) => self.advance_invoice(&event.entity_id, target).await,
            Action::PayInvoice(amounts) => self.pay_invoice(&event.entity_id, amounts).await,
            Action::AdvanceTransfer(target) => {
                self.advance_transfer(&event.entity_id, target).await
            }
        }
    }

    async fn advance_invoice(
        &self,
        invoice_id: &str,
        target: InvoiceStatus,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let Some(transition) = self
            .store
            .advance_invoice_status(invoice_id, target, None)
            .await?
        else {
            debug!(invoice_id, "No record for invoice event");
            return Ok(ReconcileOutcome::RecordNotFound);
        };

        if !transition.applied {
            return Ok(ReconcileOutcome::Unchanged {
                record: transition.record,
            });
        }

        info!(
            invoice_id,
            from = ?transition.previous,
            to = ?target,
            "Invoice status advanced"
        );
        Ok(ReconcileOutcome::InvoiceAdvanced {
            previous: transition.previous,
            record: transition.record,
        })
    }

    async fn pay_invoice(
        &self,
        invoice_id: &str,
        amounts: InvoiceAmounts,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let claim = TransferClaim {
            internal_transfer_id: Uuid::new_v4().to_string(),
            transfer_amount: amounts.net(),
        };

        let Some(transition) = self
            .store
            .advance_invoice_status(invoice_id, InvoiceStatus::Paid, Some(claim))
            .await?
        else {
            debug!(invoice_id, "No record for invoice event");
            return Ok(ReconcileOutcome::RecordNotFound);
        };

        if !transition.claimed {
            return Ok(if transition.applied {
                ReconcileOutcome::InvoiceAdvanced {
                    previous: transition.previous,
                    record: transition.record,
                }
            } else {
                ReconcileOutcome::Unchanged {
                    record: transition.record,
                }
            });
        }

        info!(
            invoice_id,
            amount = amounts.amount,
            fee = amounts.fee,
            internal_transfer_id = %transition.record.internal_transfer_id,
            "Invoice paid"
        );

        let record = self.issue_for(&transition.record).await?;
        Ok(ReconcileOutcome::TransferIssued { record })
    }

    async fn advance_transfer(
        &self,
        transfer_id: &str,
        target: TransferStatus,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let Some(transition) = self
            .store
            .advance_transfer_status(transfer_id, target)
            .await?
        else {
            // Also hit when the event overtakes the link of a just-issued
            // transfer; that record then stays `requested`.
            warn!(
                transfer_id,
                to = ?target,
                "No record linked to transfer, event dropped"
            );
            return Ok(ReconcileOutcome::RecordNotFound);
        };

        if !transition.applied {
            return Ok(ReconcileOutcome::Unchanged {
                record: transition.record,
            });
        }

        if target == TransferStatus::Failed {
            error!(
                transfer_id,
                invoice_id = %transition.record.invoice_id,
                amount = transition.record.transfer_amount,
                "Transfer failed"
            );
        } else {
            info!(
                transfer_id,
                invoice_id = %transition.record.invoice_id,
                from = ?transition.previous,
                to = ?target,
                "Transfer status advanced"
            );
        }

        Ok(ReconcileOutcome::TransferAdvanced {
            previous: transition.previous,
            record: transition.record,
        })
    }

    /// Re-issue the reserved transfer of a paid invoice whose earlier
    /// request failed. Reuses the stored idempotency token and amount.
    pub async fn reissue_transfer(&self, invoice_id: &str) -> Result<InvoiceRecord, ReconcileError> {
        let record = self
            .store
            .get_by_invoice_id(invoice_id)
            .await?
            .ok_or_else(|| ReconcileError::NotFound(invoice_id.to_owned()))?;

        if !record.is_awaiting_transfer() || record.internal_transfer_id.is_empty() {
            return Err(ReconcileError::NotEligible(invoice_id.to_owned()));
        }

        warn!(
            invoice_id,
            internal_transfer_id = %record.internal_transfer_id,
            "Re-issuing transfer"
        );
        self.issue_for(&record).await
    }

    /// Request the record's reserved transfer and link the result.
    async fn issue_for(&self, record: &InvoiceRecord) -> Result<InvoiceRecord, ReconcileError> {
        let invoice_id = record.invoice_id.as_str();
        let _guard = InFlightGuard::acquire(&self.in_flight, invoice_id)
            .ok_or_else(|| ReconcileError::IssuanceInFlight(invoice_id.to_owned()))?;

        let issued = self
            .issuer
            .issue(record.transfer_amount, &record.internal_transfer_id)
            .await
            .map_err(|source| {
                error!(invoice_id, error = %source, "Transfer request failed");
                ReconcileError::Provider {
                    invoice_id: invoice_id.to_owned(),
                    source,
                }
            })?;

        self.store
            .record_transfer_issued(invoice_id, &issued.transfer_id, &issued.internal_transfer_id)
            .await?
            .ok_or_else(|| ReconcileError::TransferNotRecorded {
                invoice_id: invoice_id.to_owned(),
                transfer_id: issued.transfer_id,
            })
    }
}

impl Processor<ClassifiedEvent> for Reconciler {
    type Output = ReconcileOutcome;
    type Error = ReconcileError;

    async fn process(&self, event: ClassifiedEvent) -> Result<ReconcileOutcome, ReconcileError> {
        self.apply(&event).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BeneficiaryConfig, ConfigStore};
    use crate::entities::invoice_records::{InvoiceTransition, ListInvoiceRecords, TransferTransition};
    use crate::provider::PaymentProvider;
    use crate::store::MemoryRecordStore;
    use payrecon_sdk::objects::{CreatedInvoice, CreatedTransfer, InvoiceRequest, TransferRequest};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct FakeProvider {
        calls: AtomicUsize,
        fail: AtomicBool,
        delay: Duration,
        requests: Mutex<Vec<TransferRequest>>,
    }

    #[async_trait::async_trait]
    impl PaymentProvider for FakeProvider {
        async fn create_invoices(
            &self,
            _invoices: Vec<InvoiceRequest>,
        ) -> Result<Vec<CreatedInvoice>, ProviderError> {
            Ok(Vec::new())
        }

        async fn create_transfer(
            &self,
            transfer: TransferRequest,
        ) -> Result<CreatedTransfer, ProviderError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if self.fail.load(Ordering::SeqCst) {
                return Err(ProviderError::EmptyResponse("transfer"));
            }
            self.requests.lock().unwrap().push(transfer.clone());
            Ok(CreatedTransfer {
                id: format!("tr-{n}"),
                external_id: transfer.external_id,
                amount: transfer.amount,
                status: "created".to_string(),
            })
        }
    }

    struct Harness {
        store: Arc<MemoryRecordStore>,
        provider: Arc<FakeProvider>,
        reconciler: Arc<Reconciler>,
    }

    fn harness(provider: FakeProvider) -> Harness {
        let store = Arc::new(MemoryRecordStore::new());
        let provider = Arc::new(provider);
        let issuer = TransferIssuer::new(
            provider.clone(),
            ConfigStore::new(BeneficiaryConfig::default()),
            Duration::from_secs(5),
        );
        let reconciler = Arc::new(Reconciler::new(store.clone(), issuer));
        Harness {
            store,
            provider,
            reconciler,
        }
    }

    async fn seed(store: &MemoryRecordStore, record: InvoiceRecord) {
        assert!(store.insert(record).await.unwrap());
    }

    fn invoice_event(event_type: &str, id: &str) -> ClassifiedEvent {
        ClassifiedEvent {
            domain: EventDomain::Invoice,
            event_type: event_type.to_string(),
            entity_id: id.to_string(),
            amounts: None,
            event_id: None,
        }
    }

    fn credited(id: &str, amount: i64, fee: i64) -> ClassifiedEvent {
        ClassifiedEvent {
            amounts: Some(InvoiceAmounts { amount, fee }),
            ..invoice_event("credited", id)
        }
    }

    fn transfer_event(event_type: &str, id: &str) -> ClassifiedEvent {
        ClassifiedEvent {
            domain: EventDomain::Transfer,
            event_type: event_type.to_string(),
            entity_id: id.to_string(),
            amounts: None,
            event_id: None,
        }
    }

    fn with_transfer(invoice_id: &str, transfer_id: &str, status: TransferStatus) -> InvoiceRecord {
        let mut record = InvoiceRecord::new(invoice_id, InvoiceStatus::Paid);
        record.transfer_id = transfer_id.to_string();
        record.internal_transfer_id = format!("tok-{invoice_id}");
        record.transfer_status = status;
        record
    }

    #[tokio::test]
    async fn test_invoice_created_advances_record() {
        let h = harness(FakeProvider::default());
        seed(&h.store, InvoiceRecord::new("123", InvoiceStatus::Unrequested)).await;

        let outcome = h.reconciler.apply(&invoice_event("created", "123")).await.unwrap();
        assert!(matches!(
            outcome,
            ReconcileOutcome::InvoiceAdvanced {
                previous: InvoiceStatus::Unrequested,
                ..
            }
        ));
        let record = h.store.get_by_invoice_id("123").await.unwrap().unwrap();
        assert_eq!(record.invoice_status, InvoiceStatus::Created);
    }

    #[tokio::test]
    async fn test_duplicate_created_is_idempotent() {
        let h = harness(FakeProvider::default());
        seed(&h.store, InvoiceRecord::requested("123")).await;

        h.reconciler.apply(&invoice_event("created", "123")).await.unwrap();
        let once = h.store.get_by_invoice_id("123").await.unwrap().unwrap();

        let outcome = h.reconciler.apply(&invoice_event("created", "123")).await.unwrap();
        assert!(matches!(outcome, ReconcileOutcome::Unchanged { .. }));
        let twice = h.store.get_by_invoice_id("123").await.unwrap().unwrap();
        assert_eq!(once, twice);
    }

    #[tokio::test]
    async fn test_credited_pays_and_issues_net_amount() {
        let h = harness(FakeProvider::default());
        seed(&h.store, InvoiceRecord::new("456", InvoiceStatus::Created)).await;

        let outcome = h.reconciler.apply(&credited("456", 1000, 50)).await.unwrap();
        let ReconcileOutcome::TransferIssued { record } = outcome else {
            panic!("unexpected outcome {outcome:?}");
        };
        assert_eq!(record.invoice_status, InvoiceStatus::Paid);
        assert_eq!(record.transfer_status, TransferStatus::Requested);
        assert_eq!(record.transfer_id, "tr-0");
        assert_eq!(record.transfer_amount, 950);
        assert!(!record.internal_transfer_id.is_empty());

        let requests = h.provider.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].amount, 950);
        assert_eq!(requests[0].external_id, record.internal_transfer_id);
    }

    #[tokio::test]
    async fn test_transfer_events_follow_transfer_id() {
        let h = harness(FakeProvider::default());
        seed(&h.store, with_transfer("a", "789", TransferStatus::Requested)).await;
        seed(&h.store, with_transfer("b", "12345", TransferStatus::Created)).await;

        h.reconciler.apply(&transfer_event("created", "789")).await.unwrap();
        h.reconciler.apply(&transfer_event("success", "12345")).await.unwrap();

        let a = h.store.get_by_invoice_id("a").await.unwrap().unwrap();
        let b = h.store.get_by_invoice_id("b").await.unwrap().unwrap();
        assert_eq!(a.transfer_status, TransferStatus::Created);
        assert_eq!(b.transfer_status, TransferStatus::Completed);
    }

    #[tokio::test]
    async fn test_transfer_failed_from_non_terminal_status() {
        let h = harness(FakeProvider::default());
        seed(&h.store, with_transfer("a", "789", TransferStatus::Created)).await;
        seed(&h.store, with_transfer("b", "790", TransferStatus::Requested)).await;

        for (invoice_id, transfer_id, previous_status) in [
            ("a", "789", TransferStatus::Created),
            ("b", "790", TransferStatus::Requested),
        ] {
            let outcome = h
                .reconciler
                .apply(&transfer_event("failed", transfer_id))
                .await
                .unwrap();
            let ReconcileOutcome::TransferAdvanced { previous, record } = outcome else {
                panic!("unexpected outcome {outcome:?}");
            };
            assert_eq!(previous, previous_status);
            assert_eq!(record.invoice_id, invoice_id);
            assert_eq!(record.transfer_status, TransferStatus::Failed);
            assert_eq!(record.invoice_status, InvoiceStatus::Paid);
        }
        assert_eq!(h.provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_terminal_transfer_status_is_final() {
        let h = harness(FakeProvider::default());
        seed(&h.store, with_transfer("a", "789", TransferStatus::Completed)).await;

        let outcome = h.reconciler.apply(&transfer_event("failed", "789")).await.unwrap();
        assert!(matches!(outcome, ReconcileOutcome::Unchanged { .. }));
        let a = h.store.get_by_invoice_id("a").await.unwrap().unwrap();
        assert_eq!(a.transfer_status, TransferStatus::Completed);
    }

    #[tokio::test]
    async fn test_missing_record_is_a_no_op() {
        let h = harness(FakeProvider::default());

        for event in [
            invoice_event("created", "nope"),
            credited("nope", 1000, 50),
            transfer_event("success", "nope"),
        ] {
            let outcome = h.reconciler.apply(&event).await.unwrap();
            assert_eq!(outcome, ReconcileOutcome::RecordNotFound);
        }
        assert!(h.store.get_by_invoice_id("nope").await.unwrap().is_none());
        assert_eq!(h.provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_combinations_never_mutate() {
        let h = harness(FakeProvider::default());
        seed(&h.store, InvoiceRecord::requested("123")).await;
        let before = h.store.get_by_invoice_id("123").await.unwrap().unwrap();

        let events = [
            invoice_event("overdue", "123"),
            invoice_event("success", "123"),
            transfer_event("credited", "123"),
            ClassifiedEvent {
                domain: EventDomain::Other("deposit".to_string()),
                ..invoice_event("created", "123")
            },
        ];
        for event in events {
            assert_eq!(
                h.reconciler.apply(&event).await.unwrap(),
                ReconcileOutcome::Ignored
            );
        }
        let after = h.store.get_by_invoice_id("123").await.unwrap().unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_invoice_status_never_regresses() {
        let h = harness(FakeProvider::default());
        seed(&h.store, InvoiceRecord::requested("456")).await;

        h.reconciler.apply(&credited("456", 1000, 50)).await.unwrap();
        h.reconciler.apply(&invoice_event("created", "456")).await.unwrap();
        h.reconciler.apply(&credited("456", 1000, 50)).await.unwrap();

        let record = h.store.get_by_invoice_id("456").await.unwrap().unwrap();
        assert_eq!(record.invoice_status, InvoiceStatus::Paid);
        assert_eq!(h.provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_provider_failure_keeps_paid_state() {
        let h = harness(FakeProvider {
            fail: AtomicBool::new(true),
            ..Default::default()
        });
        seed(&h.store, InvoiceRecord::new("456", InvoiceStatus::Created)).await;

        let err = h.reconciler.apply(&credited("456", 1000, 50)).await.unwrap_err();
        assert!(matches!(err, ReconcileError::Provider { .. }));

        let record = h.store.get_by_invoice_id("456").await.unwrap().unwrap();
        assert_eq!(record.invoice_status, InvoiceStatus::Paid);
        assert_eq!(record.transfer_status, TransferStatus::Unrequested);
        assert!(record.transfer_id.is_empty());
        assert_eq!(record.transfer_amount, 950);
        let token = record.internal_transfer_id.clone();
        assert!(!token.is_empty());

        // A repeated credited event does not issue again.
        let outcome = h.reconciler.apply(&credited("456", 1000, 50)).await.unwrap();
        assert!(matches!(outcome, ReconcileOutcome::Unchanged { .. }));
        assert_eq!(h.provider.calls.load(Ordering::SeqCst), 1);

        // Operator remediation reuses the reserved token and amount.
        h.provider.fail.store(false, Ordering::SeqCst);
        let record = h.reconciler.reissue_transfer("456").await.unwrap();
        assert_eq!(record.transfer_status, TransferStatus::Requested);
        assert_eq!(record.internal_transfer_id, token);
        let requests = h.provider.requests.lock().unwrap();
        assert_eq!(requests[0].external_id, token);
        assert_eq!(requests[0].amount, 950);
    }

    #[tokio::test]
    async fn test_non_positive_net_amount_keeps_paid_state() {
        let h = harness(FakeProvider::default());
        seed(&h.store, InvoiceRecord::new("456", InvoiceStatus::Created)).await;

        let err = h.reconciler.apply(&credited("456", 50, 50)).await.unwrap_err();
        assert!(matches!(
            err,
            ReconcileError::Provider {
                source: ProviderError::InvalidAmount(0),
                ..
            }
        ));
        let record = h.store.get_by_invoice_id("456").await.unwrap().unwrap();
        assert_eq!(record.invoice_status, InvoiceStatus::Paid);
        assert_eq!(h.provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_reissue_rejects_ineligible_records() {
        let h = harness(FakeProvider::default());
        seed(&h.store, InvoiceRecord::new("created", InvoiceStatus::Created)).await;
        seed(&h.store, with_transfer("linked", "789", TransferStatus::Requested)).await;

        assert!(matches!(
            h.reconciler.reissue_transfer("created").await,
            Err(ReconcileError::NotEligible(_))
        ));
        assert!(matches!(
            h.reconciler.reissue_transfer("linked").await,
            Err(ReconcileError::NotEligible(_))
        ));
        assert!(matches!(
            h.reconciler.reissue_transfer("missing").await,
            Err(ReconcileError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_reissue_blocked_while_in_flight() {
        let h = harness(FakeProvider::default());
        let mut record = InvoiceRecord::new("456", InvoiceStatus::Paid);
        record.internal_transfer_id = "tok".to_string();
        record.transfer_amount = 950;
        seed(&h.store, record).await;

        let guard = InFlightGuard::acquire(&h.reconciler.in_flight, "456").unwrap();
        assert!(matches!(
            h.reconciler.reissue_transfer("456").await,
            Err(ReconcileError::IssuanceInFlight(_))
        ));
        drop(guard);

        assert!(h.reconciler.reissue_transfer("456").await.is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_credited_issues_exactly_once() {
        let h = harness(FakeProvider {
            delay: Duration::from_millis(20),
            ..Default::default()
        });
        seed(&h.store, InvoiceRecord::new("456", InvoiceStatus::Created)).await;

        let mut handles = Vec::new();
        for _ in 0..10 {
            let reconciler = h.reconciler.clone();
            handles.push(tokio::spawn(async move {
                reconciler.apply(&credited("456", 1000, 50)).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(h.provider.calls.load(Ordering::SeqCst), 1);
        let record = h.store.get_by_invoice_id("456").await.unwrap().unwrap();
        assert_eq!(record.transfer_status, TransferStatus::Requested);
        assert_eq!(record.transfer_id, "tr-0");
    }

    /// Delays linking a transfer to its record.
    struct SlowLinkStore {
        inner: MemoryRecordStore,
        delay: Duration,
    }

    #[async_trait::async_trait]
    impl RecordStore for SlowLinkStore {
        async fn insert(&self, record: InvoiceRecord) -> Result<bool, StoreError> {
            self.inner.insert(record).await
        }

        async fn get_by_invoice_id(
            &self,
            invoice_id: &str,
        ) -> Result<Option<InvoiceRecord>, StoreError> {
            self.inner.get_by_invoice_id(invoice_id).await
        }

        async fn get_by_transfer_id(
            &self,
            transfer_id: &str,
        ) -> Result<Option<InvoiceRecord>, StoreError> {
            self.inner.get_by_transfer_id(transfer_id).await
        }

        async fn list(&self, query: ListInvoiceRecords) -> Result<Vec<InvoiceRecord>, StoreError> {
            self.inner.list(query).await
        }

        async fn advance_invoice_status(
            &self,
            invoice_id: &str,
            target: InvoiceStatus,
            claim: Option<TransferClaim>,
        ) -> Result<Option<InvoiceTransition>, StoreError> {
            self.inner.advance_invoice_status(invoice_id, target, claim).await
        }

        async fn advance_transfer_status(
            &self,
            transfer_id: &str,
            target: TransferStatus,
        ) -> Result<Option<TransferTransition>, StoreError> {
            self.inner.advance_transfer_status(transfer_id, target).await
        }

        async fn record_transfer_issued(
            &self,
            invoice_id: &str,
            transfer_id: &str,
            internal_transfer_id: &str,
        ) -> Result<Option<InvoiceRecord>, StoreError> {
            tokio::time::sleep(self.delay).await;
            self.inner
                .record_transfer_issued(invoice_id, transfer_id, internal_transfer_id)
                .await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_transfer_event_before_link_leaves_record_requested() {
        let store = Arc::new(SlowLinkStore {
            inner: MemoryRecordStore::new(),
            delay: Duration::from_millis(100),
        });
        let issuer = TransferIssuer::new(
            Arc::new(FakeProvider::default()),
            ConfigStore::new(BeneficiaryConfig::default()),
            Duration::from_secs(5),
        );
        let reconciler = Arc::new(Reconciler::new(store.clone(), issuer));
        store
            .insert(InvoiceRecord::new("456", InvoiceStatus::Created))
            .await
            .unwrap();

        let paying = tokio::spawn({
            let reconciler = reconciler.clone();
            async move { reconciler.apply(&credited("456", 1000, 50)).await }
        });
        tokio::time::sleep(Duration::from_millis(30)).await;

        let early = reconciler.apply(&transfer_event("success", "tr-0")).await.unwrap();
        assert_eq!(early, ReconcileOutcome::RecordNotFound);

        let paid = paying.await.unwrap().unwrap();
        assert!(matches!(paid, ReconcileOutcome::TransferIssued { .. }));

        let stuck = store
            .list(ListInvoiceRecords {
                limit: 10,
                offset: 0,
                invoice_status: None,
                transfer_status: Some(TransferStatus::Requested),
                updated_before: Some(time::OffsetDateTime::now_utc() + time::Duration::seconds(1)),
            })
            .await
            .unwrap();
        assert_eq!(stuck.len(), 1);
        assert_eq!(stuck[0].transfer_id, "tr-0");
    }

    #[tokio::test]
    async fn test_processor_delegates_to_apply() {
        let h = harness(FakeProvider::default());
        seed(&h.store, InvoiceRecord::requested("123")).await;

        let outcome = h.reconciler.process(invoice_event("created", "123")).await.unwrap();
        assert!(matches!(outcome, ReconcileOutcome::InvoiceAdvanced { .. }));
    }
}
