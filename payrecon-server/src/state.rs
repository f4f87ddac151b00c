//! Application state shared across all request handlers.

use payrecon_core::config::SharedConfig;
use payrecon_core::events::ArchiveSender;
use payrecon_core::processors::{InvoiceGenerator, Reconciler, TransferIssuer};
use payrecon_core::provider::PaymentProvider;
use payrecon_core::store::RecordStore;
use std::sync::Arc;
use std::time::Duration;

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub reconciler: Arc<Reconciler>,
    pub generator: Arc<InvoiceGenerator>,
    /// Feeds the webhook archive writer.
    pub archive_tx: ArchiveSender,
    /// Sections reloadable via SIGHUP.
    pub config: SharedConfig,
}

impl AppState {
    pub fn new(
        store: Arc<dyn RecordStore>,
        provider: Arc<dyn PaymentProvider>,
        config: SharedConfig,
        provider_timeout: Duration,
        archive_tx: ArchiveSender,
    ) -> Self {
        let issuer = TransferIssuer::new(
            provider.clone(),
            config.beneficiary.clone(),
            provider_timeout,
        );
        let reconciler = Arc::new(Reconciler::new(store.clone(), issuer));
        let generator = Arc::new(InvoiceGenerator::new(
            provider,
            store.clone(),
            provider_timeout,
        ));
        Self {
            store,
            reconciler,
            generator,
            archive_tx,
            config,
        }
    }
}
