use axum::{Json, response::IntoResponse};
use payrecon_sdk::objects::GenerateResponse;

use crate::api::extractors::AdminAuth;
use crate::state::AppState;

use super::AdminApiError;

/// `POST /invoices/generate`: run one generation batch now.
///
/// Shares the scheduler's run guard, so it fails with 409 while a scheduled
/// run is in progress.
pub async fn generate(
    state: axum::extract::State<AppState>,
    _auth: AdminAuth,
) -> Result<impl IntoResponse, AdminApiError> {
    let report = state.generator.generate_once().await?;
    Ok(Json(GenerateResponse {
        requested: report.requested,
        created: report.created,
        persisted: report.persisted,
    }))
}
