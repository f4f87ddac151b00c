//! Axum server setup and router configuration.

use crate::api::{self, StatusBody};
use crate::shutdown::shutdown_signal;
use crate::state::AppState;
use axum::{
    Json, Router,
    routing::{get, post},
};
use std::net::SocketAddr;
use tokio::net::TcpListener;

/// Build the main application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health-check", get(health_check))
        .route("/callback", post(api::callback::callback))
        .nest("/admin", api::admin::router())
        .with_state(state)
}

async fn health_check() -> Json<StatusBody> {
    Json(StatusBody::ok())
}

/// Run the server with graceful shutdown support.
pub async fn run_server(router: Router, addr: SocketAddr) -> Result<(), std::io::Error> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}
