//! Payment provider API client (reconciler → provider).
//!
//! All requests are signed with the project access key via
//! [`sign_request`](crate::signature::sign_request).

use reqwest::Client;
use url::Url;

use super::ClientError;
use crate::objects::{
    CreatedInvoice, CreatedTransfer, InvoiceBatch, InvoiceRequest, TransferBatch,
    TransferRequest,
};
use crate::signature::{
    ACCESS_ID_HEADER, ACCESS_SIGNATURE_HEADER, ACCESS_TIME_HEADER, sign_request,
};

/// Typed HTTP client for the payment provider.
#[derive(Debug, Clone)]
pub struct ProviderClient {
    http: Client,
    base_url: Url,
    access_id: String,
    access_key: Vec<u8>,
}

impl ProviderClient {
    /// Create a new `ProviderClient`.
    ///
    /// * `base_url` – root URL of the provider API (e.g. `https://sandbox.api.example.com`).
    /// * `access_id` – the project identifier sent in `Access-Id`.
    /// * `access_key` – the shared HMAC key for request signing.
    pub fn new(base_url: Url, access_id: impl Into<String>, access_key: impl Into<Vec<u8>>) -> Self {
        Self {
            http: Client::new(),
            base_url,
            access_id: access_id.into(),
            access_key: access_key.into(),
        }
    }

    /// Replace the default `reqwest::Client` with a custom one (e.g. to
    /// configure timeouts or a proxy).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// `POST /v2/invoice` – create a batch of invoices.
    pub async fn create_invoices(
        &self,
        invoices: Vec<InvoiceRequest>,
    ) -> Result<Vec<CreatedInvoice>, ClientError> {
        let batch: InvoiceBatch<CreatedInvoice> =
            self.post_signed("/v2/invoice", &InvoiceBatch { invoices }).await?;
        Ok(batch.invoices)
    }

    /// `POST /v2/transfer` – create a batch of outbound transfers.
    pub async fn create_transfers(
        &self,
        transfers: Vec<TransferRequest>,
    ) -> Result<Vec<CreatedTransfer>, ClientError> {
        let batch: TransferBatch<CreatedTransfer> = self
            .post_signed("/v2/transfer", &TransferBatch { transfers })
            .await?;
        Ok(batch.transfers)
    }

    async fn post_signed<B: serde::Serialize, T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let json = serde_json::to_string(body)?;
        let headers = sign_request(&self.access_id, &json, &self.access_key);
        let url = self.base_url.join(path)?;

        let resp = self
            .http
            .post(url)
            .header(ACCESS_ID_HEADER, headers.access_id)
            .header(ACCESS_TIME_HEADER, headers.access_time.to_string())
            .header(ACCESS_SIGNATURE_HEADER, headers.signature)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(json)
            .send()
            .await?;

        parse_response(resp).await
    }
}

async fn parse_response<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, ClientError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ClientError::Api { status, body });
    }
    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).map_err(ClientError::Json)
}
