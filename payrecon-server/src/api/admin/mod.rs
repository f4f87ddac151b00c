//! Admin API handlers.
//!
//! These endpoints are called by operators and require the
//! `Payrecon-Admin-Authorization` header with the plaintext admin secret.
//!
//! # Endpoints
//!
//! - `GET  /invoices`                               – list records (paginated, filterable by status and last update)
//! - `GET  /invoices/{invoice_id}`                  – show one record
//! - `POST /invoices/{invoice_id}/reissue-transfer` – re-request a failed transfer
//! - `POST /invoices/generate`                      – run one generation batch now

use axum::{
    Router,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use payrecon_core::entities::invoice_records::InvoiceRecord;
use payrecon_core::processors::{GenerateError, ReconcileError};
use payrecon_core::store::StoreError;
use payrecon_sdk::objects::AdminInvoiceResponse;

use crate::api::error_response;
use crate::state::AppState;

mod generate;
mod get_invoice;
mod list_invoices;
mod reissue_transfer;

/// Build the Admin API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/invoices", get(list_invoices::list_invoices))
        .route("/invoices/generate", post(generate::generate))
        .route("/invoices/{invoice_id}", get(get_invoice::get_invoice))
        .route(
            "/invoices/{invoice_id}/reissue-transfer",
            post(reissue_transfer::reissue_transfer),
        )
}

// ---------------------------------------------------------------------------
// Shared error type
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub(crate) enum AdminApiError {
    Store(StoreError),
    BadRequest(String),
    NotFound,
    Conflict(String),
    Upstream(String),
}

impl From<StoreError> for AdminApiError {
    fn from(e: StoreError) -> Self {
        AdminApiError::Store(e)
    }
}

impl From<ReconcileError> for AdminApiError {
    fn from(e: ReconcileError) -> Self {
        match e {
            ReconcileError::Store(e) => AdminApiError::Store(e),
            ReconcileError::NotFound(_) => AdminApiError::NotFound,
            ReconcileError::NotEligible(_) | ReconcileError::IssuanceInFlight(_) => {
                AdminApiError::Conflict(e.to_string())
            }
            other => AdminApiError::Upstream(other.to_string()),
        }
    }
}

impl From<GenerateError> for AdminApiError {
    fn from(e: GenerateError) -> Self {
        match e {
            GenerateError::AlreadyRunning => AdminApiError::Conflict(e.to_string()),
            GenerateError::Provider(e) => AdminApiError::Upstream(e.to_string()),
        }
    }
}

impl IntoResponse for AdminApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            AdminApiError::Store(e) => {
                tracing::error!(error = %e, "Admin API store error");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
            }
            AdminApiError::BadRequest(message) => error_response(StatusCode::BAD_REQUEST, message),
            AdminApiError::NotFound => error_response(StatusCode::NOT_FOUND, "invoice not found"),
            AdminApiError::Conflict(message) => error_response(StatusCode::CONFLICT, message),
            AdminApiError::Upstream(message) => {
                tracing::error!(error = %message, "Admin API provider error");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

pub(crate) fn invoice_to_admin_response(r: &InvoiceRecord) -> AdminInvoiceResponse {
    AdminInvoiceResponse {
        invoice_id: r.invoice_id.clone(),
        invoice_status: r.invoice_status.into(),
        transfer_id: r.transfer_id.clone(),
        internal_transfer_id: r.internal_transfer_id.clone(),
        transfer_status: r.transfer_status.into(),
        transfer_amount: r.transfer_amount,
        created_at: r.created_at.unix_timestamp(),
        updated_at: r.updated_at.unix_timestamp(),
    }
}
