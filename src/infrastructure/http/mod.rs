//! HTTP surface.
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/process-csv` | Push trigger carrying a storage notification envelope |
//! | `GET`  | `/health` | Liveness check (returns version) |
//! | `GET`  | `/api/inventory/all_items` | Paged inventory listing |
//! | `GET`  | `/api/inventory/search_by_product_name` | Exact product-name filter |
//! | `GET`  | `/api/inventory/search_by_product_name_partial` | Substring product-name filter |
//!
//! Trigger responses are plain text. A panic anywhere in a handler becomes a
//! 500 with body `Error: <panic message>`.

pub mod inventory;
pub mod pubsub;

use std::any::Any;
use std::sync::Arc;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::{error, info};
use crate::application::ingestion_service::IngestionService;
use crate::domain::ports::InventoryQueries;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<IngestionService>,
    pub queries: Arc<dyn InventoryQueries>,
}

/// Builds the router (separated from [`serve`] for testing).
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/process-csv", post(pubsub::process_csv))
        .route("/health", get(health))
        .nest("/api/inventory", inventory::router())
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(
    state: AppState,
    bind_addr: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await.map_err(|e| {
        error!("Failed to bind {}: {}", bind_addr, e);
        e
    })?;
    info!("HTTP server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let details = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    error!("Request handler panicked: {}", details);
    (StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {}", details)).into_response()
}
