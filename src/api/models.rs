//! API Data Models
//!
//! Response bodies for the REST endpoints. Jobs themselves travel in their
//! own wire format (see [`crate::jobs::Job`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Response body for `GET /jobs?count`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountResponse {
    /// Number of jobs in the registry
    pub count: usize,
}

/// Service status response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStatus {
    /// Configured service name
    pub service_name: String,
    /// Service version
    pub version: String,
    /// Server uptime
    pub uptime_seconds: u64,
    /// Number of tracked jobs
    pub jobs: usize,
    /// Response timestamp
    pub timestamp: DateTime<Utc>,
}

/// API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code
    pub code: String,
    /// Error message
    pub message: String,
}

impl ApiError {
    /// Error body for an HTTP status
    pub fn for_status(status: u16, message: impl Into<String>) -> Self {
        let code = match status {
            400 => "BAD_REQUEST",
            404 => "NOT_FOUND",
            405 => "METHOD_NOT_ALLOWED",
            413 => "PAYLOAD_TOO_LARGE",
            431 => "HEADERS_TOO_LARGE",
            _ => "INTERNAL_ERROR",
        };

        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}
