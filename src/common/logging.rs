//! Structured Logging for addrbatch
//!
//! Provides structured logging with:
//! - JSON output for log aggregation services
//! - Correlation IDs for request tracing
//! - Fan-out timing and per-address failure events
//!
//! # Usage
//!
//! ```ignore
//! use addrbatch::common::logging::{init_logging, LogLevel};
//!
//! init_logging(LogLevel::Info, true)?;
//! tracing::info!(target: "addrbatch::api", request_id = %id, "Processing batch");
//! ```

use serde::Serialize;
use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

// ============================================================================
// Log Levels
// ============================================================================

/// Application log level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<&str> for LogLevel {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "trace" => LogLevel::Trace,
            "debug" => LogLevel::Debug,
            "info" => LogLevel::Info,
            "warn" | "warning" => LogLevel::Warn,
            "error" => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }
}

// ============================================================================
// Structured Event Types
// ============================================================================

/// Event categories for structured logging
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    /// API request/response events
    Api,
    /// Batch fan-out completion
    Fanout,
    /// Indexer call failures
    Upstream,
    /// System events (startup, shutdown)
    System,
}

/// Structured log event
#[derive(Debug, Serialize)]
pub struct LogEvent {
    /// Event timestamp (ISO 8601)
    pub timestamp: String,
    /// Log level
    pub level: String,
    /// Event category
    pub category: EventCategory,
    /// Human-readable message
    pub message: String,
    /// Correlation ID for request tracing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    /// Additional structured data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// Duration in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// Error details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetails>,
}

/// Error details for error events
#[derive(Debug, Serialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
}

impl LogEvent {
    /// Create a new log event
    pub fn new(level: LogLevel, category: EventCategory, message: impl Into<String>) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            level: format!("{:?}", level).to_uppercase(),
            category,
            message: message.into(),
            correlation_id: None,
            data: None,
            duration_ms: None,
            error: None,
        }
    }

    /// Add correlation ID
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Add structured data
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Add duration
    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Add error details
    pub fn with_error(mut self, code: impl Into<String>, message: impl Into<String>) -> Self {
        self.error = Some(ErrorDetails {
            code: code.into(),
            message: message.into(),
        });
        self
    }

    /// Serialize this event to JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(
                "{{\"error\": \"failed to serialize log\", \"message\": \"{}\"}}",
                self.message
            )
        })
    }
}

// ============================================================================
// Event Helpers
// ============================================================================

/// Log an API request
pub fn log_api_request(method: &str, path: &str, client_ip: Option<&str>, correlation_id: &str) {
    let event = LogEvent::new(LogLevel::Info, EventCategory::Api, format!("{} {}", method, path))
        .with_correlation_id(correlation_id)
        .with_data(serde_json::json!({
            "method": method,
            "path": path,
            "client_ip": client_ip
        }));

    tracing::info!(target: "addrbatch::api", "{}", event.to_json());
}

/// Log an API response
pub fn log_api_response(
    method: &str,
    path: &str,
    status: u16,
    duration_ms: u64,
    correlation_id: &str,
) {
    let level = if status >= 500 {
        LogLevel::Error
    } else if status >= 400 {
        LogLevel::Warn
    } else {
        LogLevel::Info
    };

    let event = LogEvent::new(level, EventCategory::Api, format!("{} {} -> {}", method, path, status))
        .with_correlation_id(correlation_id)
        .with_duration(duration_ms)
        .with_data(serde_json::json!({
            "method": method,
            "path": path,
            "status": status
        }));

    match level {
        LogLevel::Error => tracing::error!(target: "addrbatch::api", "{}", event.to_json()),
        LogLevel::Warn => tracing::warn!(target: "addrbatch::api", "{}", event.to_json()),
        _ => tracing::info!(target: "addrbatch::api", "{}", event.to_json()),
    }
}

/// Log the outcome of one fan-out
pub fn log_fanout_event(
    operation: &str,
    correlation_id: &str,
    addresses: usize,
    partial: Option<&super::error::AggregatorError>,
    duration_ms: u64,
) {
    let level = if partial.is_some() { LogLevel::Warn } else { LogLevel::Debug };
    let event = LogEvent::new(level, EventCategory::Fanout, operation)
        .with_correlation_id(correlation_id)
        .with_duration(duration_ms)
        .with_data(serde_json::json!({ "addresses": addresses }));

    match partial {
        Some(err) => {
            let event = event.with_error(err.error_code(), err.to_string());
            tracing::warn!(target: "addrbatch::fanout", "{}", event.to_json());
        }
        None => tracing::debug!(target: "addrbatch::fanout", "{}", event.to_json()),
    }
}

/// Log a failed indexer call for one address
pub fn log_upstream_failure(operation: &str, correlation_id: &str, address: &str, error: &str) {
    let event = LogEvent::new(LogLevel::Warn, EventCategory::Upstream, operation)
        .with_correlation_id(correlation_id)
        .with_data(serde_json::json!({ "address": address }))
        .with_error("UPSTREAM_ERROR", error);

    tracing::warn!(target: "addrbatch::upstream", "{}", event.to_json());
}

// ============================================================================
// Initialization
// ============================================================================

/// Filter used when `RUST_LOG` is unset: our crates plus the HTTP stack
fn default_directives(level: LogLevel) -> String {
    let level = format!("{:?}", level).to_lowercase();
    ["addrbatch", "addrbatch_api", "tower_http", "axum"]
        .iter()
        .map(|target| format!("{}={}", target, level))
        .collect::<Vec<_>>()
        .join(",")
}

/// Install the global subscriber, JSON lines or pretty text
pub fn init_logging(level: LogLevel, json_format: bool) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));
    let registry = tracing_subscriber::registry().with(filter);

    let installed = if json_format {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(true))
            .try_init()
    } else {
        registry
            .with(fmt::layer().pretty().with_file(true).with_line_number(true))
            .try_init()
    };

    installed.map_err(|e| LoggingError::InitFailed(e.to_string()))
}

/// Initialize logging from BatchConfig
pub fn init_from_config(config: &super::config::BatchConfig) -> Result<(), LoggingError> {
    init_logging(LogLevel::from(config.log_level.as_str()), config.log_json)
}

/// Logging errors
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("failed to initialize logging: {0}")]
    InitFailed(String),
}

/// Generate a unique correlation ID for request tracing
pub fn generate_correlation_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
