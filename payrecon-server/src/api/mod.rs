//! HTTP handlers.
//!
//! - `POST /callback` – provider webhooks
//! - `/admin/*` – operator endpoints, see [`admin`]

pub mod admin;
pub mod callback;
pub mod extractors;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// `{"status": "ok"}` or `{"status": "error", "message": ...}`.
#[derive(Debug, Serialize)]
pub struct StatusBody {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StatusBody {
    pub fn ok() -> Self {
        Self {
            status: "ok",
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            message: Some(message.into()),
        }
    }
}

/// Build an error response with a JSON body.
pub(crate) fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(StatusBody::error(message))).into_response()
}
