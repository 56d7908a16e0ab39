//! API Middleware - Correlation IDs and Security Headers
//!
//! - Correlation id per request (taken from `x-correlation-id` or generated)
//! - Request/response logging
//! - Security headers

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::time::Instant;

use crate::common::{generate_correlation_id, log_api_request, log_api_response};

pub const CORRELATION_HEADER: &str = "x-correlation-id";

/// Correlation id of the current request, available to handlers as an extension
#[derive(Debug, Clone)]
pub struct CorrelationId(pub String);

impl CorrelationId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Extract client IP from request headers
pub fn extract_client_ip(headers: &HeaderMap) -> Option<String> {
    // Try X-Forwarded-For first (for proxied requests)
    if let Some(forwarded) = headers.get("x-forwarded-for") {
        if let Ok(value) = forwarded.to_str() {
            // First hop is the client
            return Some(value.split(',').next()?.trim().to_string());
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(value) = real_ip.to_str() {
            return Some(value.to_string());
        }
    }

    None
}

/// Reuse a caller-supplied id when it is printable and short, else mint one
fn correlation_id(headers: &HeaderMap) -> String {
    headers
        .get(CORRELATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty() && v.len() <= 128)
        .map(str::to_string)
        .unwrap_or_else(generate_correlation_id)
}

/// Assign a correlation id and log the request/response pair
pub async fn correlation_middleware(mut request: Request, next: Next) -> Response {
    let started = Instant::now();
    let id = correlation_id(request.headers());
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let client_ip = extract_client_ip(request.headers());

    log_api_request(&method, &path, client_ip.as_deref(), &id);
    request.extensions_mut().insert(CorrelationId(id.clone()));

    let mut response = next.run(request).await;

    log_api_response(
        &method,
        &path,
        response.status().as_u16(),
        started.elapsed().as_millis() as u64,
        &id,
    );
    if let Ok(value) = HeaderValue::from_str(&id) {
        response.headers_mut().insert(CORRELATION_HEADER, value);
    }

    response
}

/// Security headers middleware
pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert("x-content-type-options", HeaderValue::from_static("nosniff"));
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert("cache-control", HeaderValue::from_static("no-store"));

    response
}
