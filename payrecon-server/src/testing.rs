//! Router-level test fixtures: in-memory store, fake provider, oneshot
//! request helpers.

use crate::server::build_router;
use crate::state::AppState;
use axum::{
    Router,
    body::Body,
    http::{Request, Response},
};
use payrecon_core::config::{AdminConfig, BeneficiaryConfig, SharedConfig, hash_secret};
use payrecon_core::entities::invoice_records::InvoiceRecord;
use payrecon_core::events::{ArchiveReceiver, archive_channel};
use payrecon_core::provider::{PaymentProvider, ProviderError};
use payrecon_core::store::{MemoryRecordStore, RecordStore};
use payrecon_sdk::objects::{CreatedInvoice, CreatedTransfer, InvoiceRequest, TransferRequest};
use payrecon_sdk::signature::ADMIN_AUTH_HEADER;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;
use tower::ServiceExt;

pub const ADMIN_SECRET: &str = "test-admin-secret";

#[derive(Default)]
pub struct FakeProvider {
    pub transfers: Mutex<Vec<TransferRequest>>,
    pub invoice_batches: AtomicUsize,
    pub fail: AtomicBool,
}

#[async_trait::async_trait]
impl PaymentProvider for FakeProvider {
    async fn create_invoices(
        &self,
        invoices: Vec<InvoiceRequest>,
    ) -> Result<Vec<CreatedInvoice>, ProviderError> {
        let batch = self.invoice_batches.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(ProviderError::EmptyResponse("invoices"));
        }
        Ok(invoices
            .into_iter()
            .enumerate()
            .map(|(i, invoice)| CreatedInvoice {
                id: format!("gen-{batch}-{i}"),
                amount: invoice.amount,
                tax_id: invoice.tax_id,
                name: invoice.name,
                status: "created".to_string(),
            })
            .collect())
    }

    async fn create_transfer(
        &self,
        transfer: TransferRequest,
    ) -> Result<CreatedTransfer, ProviderError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ProviderError::EmptyResponse("transfer"));
        }
        let mut transfers = self.transfers.lock().unwrap();
        transfers.push(transfer.clone());
        Ok(CreatedTransfer {
            id: format!("tr-{}", transfers.len()),
            external_id: transfer.external_id,
            amount: transfer.amount,
            status: "created".to_string(),
        })
    }
}

/// Hashing is slow in debug builds; share one hash across tests.
fn admin_hash() -> String {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| hash_secret(ADMIN_SECRET).unwrap()).clone()
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryRecordStore>,
    pub provider: Arc<FakeProvider>,
    pub archive_rx: ArchiveReceiver,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryRecordStore::new());
        let provider = Arc::new(FakeProvider::default());
        let (archive_tx, archive_rx) = archive_channel();
        let config = SharedConfig::new(
            AdminConfig::new(admin_hash()),
            BeneficiaryConfig::default(),
        );
        let state = AppState::new(
            store.clone(),
            provider.clone(),
            config,
            Duration::from_secs(5),
            archive_tx,
        );
        Self {
            router: build_router(state),
            store,
            provider,
            archive_rx,
        }
    }

    pub async fn seed(&self, record: InvoiceRecord) {
        assert!(self.store.insert(record).await.unwrap());
    }

    pub async fn record(&self, invoice_id: &str) -> InvoiceRecord {
        self.store
            .get_by_invoice_id(invoice_id)
            .await
            .unwrap()
            .unwrap()
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn post_callback(&self, body: &str) -> Response<Body> {
        self.send(
            Request::post("/callback")
                .header("content-type", "application/json")
                .body(Body::from(body.to_owned()))
                .unwrap(),
        )
        .await
    }

    pub async fn get(&self, uri: &str, secret: Option<&str>) -> Response<Body> {
        let mut builder = Request::get(uri);
        if let Some(secret) = secret {
            builder = builder.header(ADMIN_AUTH_HEADER, secret);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post(&self, uri: &str, secret: Option<&str>) -> Response<Body> {
        let mut builder = Request::post(uri);
        if let Some(secret) = secret {
            builder = builder.header(ADMIN_AUTH_HEADER, secret);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
