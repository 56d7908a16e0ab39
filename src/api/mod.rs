//! API Layer Module
//!
//! HTTP server, batch routes and middleware.

pub mod middleware;
pub mod routes;
pub mod server;

// Re-exports for convenience
pub use middleware::{CorrelationId, CORRELATION_HEADER};
pub use routes::PARTIAL_FAILURES_HEADER;
pub use server::{create_router, start_server, AppState, SharedAppState};
