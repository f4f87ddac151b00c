use axum::{Json, extract::Path, response::IntoResponse};

use crate::api::extractors::AdminAuth;
use crate::state::AppState;

use super::{AdminApiError, invoice_to_admin_response};

/// `GET /invoices/{invoice_id}`
pub async fn get_invoice(
    state: axum::extract::State<AppState>,
    _auth: AdminAuth,
    Path(invoice_id): Path<String>,
) -> Result<impl IntoResponse, AdminApiError> {
    let record = state
        .store
        .get_by_invoice_id(&invoice_id)
        .await?
        .ok_or(AdminApiError::NotFound)?;

    Ok(Json(invoice_to_admin_response(&record)))
}
