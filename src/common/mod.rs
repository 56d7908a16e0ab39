//! Common Infrastructure Module
//!
//! Shared utilities and configuration for the addrbatch service.
//!
//! This module contains:
//! - Configuration loading from environment variables
//! - Structured logging setup
//! - Common error types

pub mod config;
pub mod error;
pub mod logging;

// Re-exports for convenience
pub use config::{BatchConfig, ConfigError, Network};
pub use error::{AggregatorError, ErrorResponse, Result};
pub use logging::{
    generate_correlation_id, init_from_config, init_logging, log_api_request, log_api_response,
    log_fanout_event, log_upstream_failure, ErrorDetails, EventCategory, LogEvent, LogLevel,
    LoggingError,
};
