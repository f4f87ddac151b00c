//! Custom Axum extractors for request authentication.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use payrecon_sdk::signature::ADMIN_AUTH_HEADER;

use crate::api::error_response;
use crate::state::AppState;

/// Admin API authentication.
///
/// Requires the `Payrecon-Admin-Authorization` header to carry the plaintext
/// admin secret, verified against the argon2 hash from the config.
pub struct AdminAuth;

#[derive(Debug)]
pub enum AdminAuthError {
    MissingHeader,
    InvalidHeader,
    InvalidSecret,
}

impl IntoResponse for AdminAuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AdminAuthError::MissingHeader => (
                StatusCode::UNAUTHORIZED,
                "missing Payrecon-Admin-Authorization header",
            ),
            AdminAuthError::InvalidHeader => (
                StatusCode::BAD_REQUEST,
                "invalid Payrecon-Admin-Authorization header",
            ),
            AdminAuthError::InvalidSecret => (StatusCode::UNAUTHORIZED, "invalid admin secret"),
        };
        error_response(status, message)
    }
}

impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = AdminAuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let secret = parts
            .headers
            .get(ADMIN_AUTH_HEADER)
            .ok_or(AdminAuthError::MissingHeader)?
            .to_str()
            .map_err(|_| AdminAuthError::InvalidHeader)?
            .to_owned();

        // argon2 verification is CPU-bound.
        let admin = state.config.admin.snapshot().await;
        let verified = tokio::task::spawn_blocking(move || admin.verify_secret(&secret))
            .await
            .unwrap_or(false);

        if verified {
            Ok(AdminAuth)
        } else {
            tracing::warn!("Admin API request with invalid secret");
            Err(AdminAuthError::InvalidSecret)
        }
    }
}
