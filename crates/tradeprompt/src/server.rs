use std::any::Any;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::error::ApiError;
use crate::handler::{StrategyHandler, StrategyResponse};

/// Build the HTTP router.
pub fn router(handler: Arc<StrategyHandler>) -> Router {
    Router::new()
        .route("/strategy/ask", post(strategy_ask))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(panic_response))
        .with_state(handler)
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(handler: Arc<StrategyHandler>, addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(addr = %listener.local_addr()?, "Listening");

    axum::serve(listener, router(handler))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")
}

async fn strategy_ask(
    State(handler): State<Arc<StrategyHandler>>,
    body: Bytes,
) -> Result<Json<StrategyResponse>, ApiError> {
    handler.handle(&body).await.map(Json)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({"status": "ok"}))
}

fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = payload
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| payload.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(panic = message, "Request handler panicked");
    ApiError::internal("Internal server error").into_response()
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
