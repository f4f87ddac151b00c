//! `POST /callback` – payment provider webhooks.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use kanau::processor::Processor;
use payrecon_core::events::{ArchivedRequest, MalformedEvent, classify, forward_to_archive};
use payrecon_core::processors::ReconcileError;
use payrecon_sdk::objects::WebhookEnvelope;
use std::collections::BTreeMap;

use crate::api::{StatusBody, error_response};
use crate::state::AppState;

#[derive(Debug, thiserror::Error)]
pub enum CallbackError {
    #[error("invalid JSON body: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error(transparent)]
    Malformed(#[from] MalformedEvent),
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}

impl IntoResponse for CallbackError {
    fn into_response(self) -> Response {
        match &self {
            CallbackError::InvalidJson(_)
            | CallbackError::Malformed(_)
            | CallbackError::Reconcile(ReconcileError::MissingAmounts(_)) => {
                tracing::warn!(error = %self, "Rejected malformed webhook");
                error_response(StatusCode::BAD_REQUEST, self.to_string())
            }
            CallbackError::Reconcile(e) => {
                tracing::error!(error = %e, "Webhook processing failed");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        }
    }
}

/// Archive the raw request, classify it and apply it to the record store.
///
/// Events that match no rule or no record are acknowledged with 200.
pub async fn callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<StatusBody>, CallbackError> {
    forward_to_archive(
        &state.archive_tx,
        ArchivedRequest::new(header_map(&headers), &body),
    );

    let envelope: WebhookEnvelope = serde_json::from_slice(&body)?;
    let event = classify(&envelope)?;
    state.reconciler.process(event).await?;

    Ok(Json(StatusBody::ok()))
}

fn header_map(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_owned(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect()
}
