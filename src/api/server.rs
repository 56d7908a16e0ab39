//! API Server Module
//!
//! Application state, router assembly and server startup.

use axum::{middleware, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use super::middleware::{correlation_middleware, security_headers_middleware};
use super::routes::routes;
use crate::aggregator::BatchService;
use crate::common::{EventCategory, LogEvent, LogLevel};

/// Application state shared by all handlers
pub struct AppState {
    pub service: BatchService,
}

/// Shared application state type
pub type SharedAppState = Arc<AppState>;

impl AppState {
    pub fn new(service: BatchService) -> SharedAppState {
        Arc::new(Self { service })
    }
}

/// Create the API router with all endpoints
pub fn create_router(service: BatchService) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    routes()
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(correlation_middleware))
        .layer(cors)
        .with_state(AppState::new(service))
}

/// Start the API server
pub async fn start_server(service: BatchService, port: u16) -> Result<(), std::io::Error> {
    let app = create_router(service);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    let event = LogEvent::new(LogLevel::Info, EventCategory::System, "server started")
        .with_data(serde_json::json!({
            "addr": addr.to_string(),
            "routes": ["/utxos", "/data", "/baltxs", "/balances", "/txs", "/fees", "/tx", "/health"]
        }));
    tracing::info!(target: "addrbatch::system", "{}", event.to_json());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}
