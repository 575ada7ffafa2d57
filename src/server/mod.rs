//! HTTP surface for Kimi Agent
//!
//! Exposes the agent over a small JSON API built on axum. Errors are
//! returned as `{"detail": "..."}` with a status derived from the
//! underlying [`KimiError`](crate::error::KimiError).

pub mod error;
pub mod routes;

pub use error::ApiError;

use crate::agent::Agent;
use crate::error::{KimiError, Result};
use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Largest accepted request body (uploads included)
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// State shared by all handlers
#[derive(Clone)]
pub struct AppState {
    /// The agent serving every request
    pub agent: Arc<Agent>,
}

/// Build the application router
pub fn router(agent: Arc<Agent>) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/chat", post(routes::chat))
        .route("/chat/upload", post(routes::upload))
        .route("/sessions/new", get(routes::new_session))
        .route("/sessions/:session_id/history", get(routes::history))
        .route("/sessions/:session_id", delete(routes::delete_session))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { agent })
}

/// Bind `addr` and serve until Ctrl-C
///
/// # Errors
///
/// Returns error if the address cannot be bound or the server fails
pub async fn serve(agent: Arc<Agent>, addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| KimiError::Config(format!("Failed to bind {}: {}", addr, e)))?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(agent))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
