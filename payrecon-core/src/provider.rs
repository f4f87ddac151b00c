//! Seam between the reconciler and the payment provider.

use crate::config::ProviderConfig;
use payrecon_sdk::client::{ClientError, ProviderClient};
use payrecon_sdk::objects::{CreatedInvoice, CreatedTransfer, InvoiceRequest, TransferRequest};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("provider call timed out after {0:?}")]
    Timeout(Duration),
    #[error("refusing to transfer non-positive amount {0}")]
    InvalidAmount(i64),
    #[error("provider returned no {0}")]
    EmptyResponse(&'static str),
}

/// Operations the reconciler needs from the payment provider.
#[async_trait::async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a batch of invoices. The response lists every invoice the
    /// provider accepted.
    async fn create_invoices(
        &self,
        invoices: Vec<InvoiceRequest>,
    ) -> Result<Vec<CreatedInvoice>, ProviderError>;

    /// Request one outbound transfer.
    async fn create_transfer(
        &self,
        transfer: TransferRequest,
    ) -> Result<CreatedTransfer, ProviderError>;
}

#[async_trait::async_trait]
impl PaymentProvider for ProviderClient {
    async fn create_invoices(
        &self,
        invoices: Vec<InvoiceRequest>,
    ) -> Result<Vec<CreatedInvoice>, ProviderError> {
        Ok(ProviderClient::create_invoices(self, invoices).await?)
    }

    async fn create_transfer(
        &self,
        transfer: TransferRequest,
    ) -> Result<CreatedTransfer, ProviderError> {
        self.create_transfers(vec![transfer])
            .await?
            .into_iter()
            .next()
            .ok_or(ProviderError::EmptyResponse("transfer"))
    }
}

/// Build the provider client from its config section.
///
/// The connect and whole-request timeouts of the HTTP client follow
/// `config.timeout`, so a stalled socket also ends the call.
pub fn client_from_config(config: &ProviderConfig) -> Result<ProviderClient, ProviderError> {
    let http = reqwest::Client::builder()
        .connect_timeout(config.timeout)
        .timeout(config.timeout)
        .build()
        .map_err(ClientError::from)?;
    Ok(ProviderClient::new(
        config.base_url.clone(),
        config.access_id.clone(),
        config.access_key.as_bytes().to_vec(),
    )
    .with_http_client(http))
}

/// Run a provider call with an upper bound on its duration.
pub async fn with_timeout<T>(
    timeout: Duration,
    call: impl Future<Output = Result<T, ProviderError>>,
) -> Result<T, ProviderError> {
    tokio::time::timeout(timeout, call)
        .await
        .map_err(|_| ProviderError::Timeout(timeout))?
}
