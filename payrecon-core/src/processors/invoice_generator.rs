//! Scheduled creation of invoice batches.

use crate::config::GeneratorConfig;
use crate::entities::invoice_records::InvoiceRecord;
use crate::provider::{PaymentProvider, ProviderError, with_timeout};
use crate::store::RecordStore;
use crate::utils::fake_identity::fake_identity;
use payrecon_sdk::objects::InvoiceRequest;
use rand::Rng;
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;
use tokio::sync::{Mutex, watch};
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

const BATCH_SIZE: RangeInclusive<usize> = 8..=12;
/// Amounts are drawn in hundreds of minor units, 5000..=10000.
const AMOUNT_HUNDREDS: RangeInclusive<i64> = 50..=100;

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("a generation run is already in progress")]
    AlreadyRunning,
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationReport {
    /// Invoices submitted to the provider.
    pub requested: usize,
    /// Invoices the provider confirmed.
    pub created: usize,
    /// Records written to the store.
    pub persisted: usize,
}

pub struct InvoiceGenerator {
    provider: Arc<dyn PaymentProvider>,
    store: Arc<dyn RecordStore>,
    timeout: Duration,
    /// Held for the duration of a run.
    running: Mutex<()>,
}

impl InvoiceGenerator {
    pub fn new(
        provider: Arc<dyn PaymentProvider>,
        store: Arc<dyn RecordStore>,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            store,
            timeout,
            running: Mutex::new(()),
        }
    }

    /// Create one batch of invoices and seed a record for each one the
    /// provider confirmed.
    ///
    /// Records inserted before a store failure are kept; the failure is
    /// logged and the rest of the batch is still attempted.
    pub async fn generate_once(&self) -> Result<GenerationReport, GenerateError> {
        let _running = self
            .running
            .try_lock()
            .map_err(|_| GenerateError::AlreadyRunning)?;

        let batch = build_batch(OffsetDateTime::now_utc());
        let requested = batch.len();

        let created = with_timeout(self.timeout, self.provider.create_invoices(batch)).await?;
        if created.len() < requested {
            warn!(
                requested,
                created = created.len(),
                "Provider confirmed fewer invoices than requested"
            );
        }

        let mut persisted = 0;
        for invoice in &created {
            if invoice.id.is_empty() {
                warn!("Provider returned an invoice without id");
                continue;
            }
            match self.store.insert(InvoiceRecord::requested(&invoice.id)).await {
                Ok(true) => persisted += 1,
                Ok(false) => warn!(invoice_id = %invoice.id, "Invoice record already exists"),
                Err(e) => error!(invoice_id = %invoice.id, error = %e, "Failed to persist invoice record"),
            }
        }

        let report = GenerationReport {
            requested,
            created: created.len(),
            persisted,
        };
        info!(
            requested = report.requested,
            created = report.created,
            persisted = report.persisted,
            "Invoice batch generated"
        );
        Ok(report)
    }

    /// Run on a fixed schedule until shutdown is signaled.
    pub async fn run(self: Arc<Self>, config: GeneratorConfig, mut shutdown_rx: watch::Receiver<bool>) {
        if !config.enabled {
            info!("InvoiceGenerator disabled");
            return;
        }

        let start = tokio::time::Instant::now() + config.first_run_delay;
        let mut interval = tokio::time::interval_at(start, config.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(
            interval_secs = config.interval.as_secs(),
            first_run_delay_secs = config.first_run_delay.as_secs(),
            "InvoiceGenerator started"
        );

        loop {
            tokio::select! {
                biased;

                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("InvoiceGenerator received shutdown signal");
                        break;
                    }
                }

                _ = interval.tick() => {
                    match self.generate_once().await {
                        Ok(_) => {}
                        Err(GenerateError::AlreadyRunning) => {
                            info!("Skipping scheduled generation, a run is in progress");
                        }
                        Err(e) => error!(error = %e, "Invoice generation failed"),
                    }
                }
            }
        }

        info!("InvoiceGenerator shutdown complete");
    }
}

fn build_batch(now: OffsetDateTime) -> Vec<InvoiceRequest> {
    let mut rng = rand::rng();
    let count = rng.random_range(BATCH_SIZE);
    let due = now + time::Duration::days(1);
    (0..count)
        .map(|_| {
            let identity = fake_identity(&mut rng);
            InvoiceRequest {
                amount: rng.random_range(AMOUNT_HUNDREDS) * 100,
                tax_id: identity.tax_id,
                name: identity.name,
                due,
            }
        })
        .collect()
}
