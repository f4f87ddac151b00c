use axum::{Json, extract::Path, response::IntoResponse};

use crate::api::extractors::AdminAuth;
use crate::state::AppState;

use super::{AdminApiError, invoice_to_admin_response};

/// `POST /invoices/{invoice_id}/reissue-transfer`: request the reserved
/// transfer of a paid invoice again after an earlier request failed.
///
/// The stored idempotency token and net amount are reused, so the provider
/// sees the same transfer it may already have rejected or accepted.
pub async fn reissue_transfer(
    state: axum::extract::State<AppState>,
    _auth: AdminAuth,
    Path(invoice_id): Path<String>,
) -> Result<impl IntoResponse, AdminApiError> {
    let record = state.reconciler.reissue_transfer(&invoice_id).await?;
    Ok(Json(invoice_to_admin_response(&record)))
}
