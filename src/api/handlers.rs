//! API Request Handlers
//!
//! One function per endpoint. Handlers only talk to the shared
//! [`JobRegistry`]; status-code mapping lives in the server's router.

use crate::api::models::*;
use crate::error::{ReplicationError, Result};
use crate::jobs::{Job, JobRegistry};
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

/// Application state shared across handlers
pub struct AppState {
    /// Active replication jobs
    pub jobs: Arc<JobRegistry>,
    /// Configured service name
    pub service_name: String,
    /// Server start time
    pub start_time: Instant,
}

impl AppState {
    /// Create new application state around an existing registry
    pub fn new(jobs: Arc<JobRegistry>, service_name: impl Into<String>) -> Self {
        Self {
            jobs,
            service_name: service_name.into(),
            start_time: Instant::now(),
        }
    }
}

/// Handler for POST /jobs
pub fn handle_create_job(state: &AppState, body: Option<&[u8]>) -> Result<Job> {
    let body = body
        .filter(|b| !b.iter().all(u8::is_ascii_whitespace))
        .ok_or_else(|| ReplicationError::validation("request body required"))?;

    let payload: Value = serde_json::from_slice(body)?;
    let job = state.jobs.add_job_using_json(payload)?;

    tracing::info!(job_id = %job.id(), "Created job");
    Ok(job)
}

/// Handler for GET /jobs/{id}
pub fn handle_get_job(state: &AppState, job_id: &str) -> Option<Job> {
    state.jobs.get_job(job_id)
}

/// Handler for GET /jobs
pub fn handle_list_jobs(state: &AppState) -> Value {
    state.jobs.serialize_all()
}

/// Handler for GET /jobs?count
pub fn handle_count_jobs(state: &AppState) -> CountResponse {
    CountResponse {
        count: state.jobs.count(),
    }
}

/// Handler for DELETE /jobs/{id}
pub fn handle_delete_job(state: &AppState, job_id: &str) -> Option<Job> {
    let removed = state.jobs.remove_job(job_id);
    if removed.is_some() {
        tracing::info!(job_id = %job_id, "Deleted job");
    }
    removed
}

/// Handler for GET /status
pub fn handle_status(state: &AppState) -> ServiceStatus {
    ServiceStatus {
        service_name: state.service_name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        jobs: state.jobs.count(),
        timestamp: Utc::now(),
    }
}
