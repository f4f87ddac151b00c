use axum::{Json, extract::Query, response::IntoResponse};
use payrecon_core::entities::invoice_records::ListInvoiceRecords;
use payrecon_sdk::objects::{ListInvoicesQuery, clamp_pagination};
use time::OffsetDateTime;

use crate::api::extractors::AdminAuth;
use crate::state::AppState;

use super::{AdminApiError, invoice_to_admin_response};

/// `GET /invoices`: list records, newest first, with optional status filters.
///
/// `transfer_status=requested&updated_before=<unix>` finds transfers whose
/// completion or failure webhook never matched the record.
pub async fn list_invoices(
    state: axum::extract::State<AppState>,
    _auth: AdminAuth,
    Query(query): Query<ListInvoicesQuery>,
) -> Result<impl IntoResponse, AdminApiError> {
    let (limit, offset) = clamp_pagination(query.limit, query.offset);
    let updated_before = query
        .updated_before
        .map(OffsetDateTime::from_unix_timestamp)
        .transpose()
        .map_err(|e| AdminApiError::BadRequest(format!("invalid updated_before: {e}")))?;

    let records = state
        .store
        .list(ListInvoiceRecords {
            limit,
            offset,
            invoice_status: query.invoice_status.map(Into::into),
            transfer_status: query.transfer_status.map(Into::into),
            updated_before,
        })
        .await?;

    let response: Vec<_> = records.iter().map(invoice_to_admin_response).collect();
    Ok(Json(response))
}
