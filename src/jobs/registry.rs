//! In-memory job registry
//!
//! [`JobRegistry`] is the authoritative store of active replication jobs,
//! keyed by job ID. It is created once by the service and shared with every
//! request handler behind an `Arc`. Nothing is persisted.
//!
//! All mutations take the write lock and all reads take the read lock, so a
//! handler never observes a half-applied insert or removal. Job construction
//! happens before the lock is taken.

use crate::error::Result;
use crate::jobs::job::Job;
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::{Map, Value};

/// Keyed collection of active jobs
#[derive(Debug, Default)]
pub struct JobRegistry {
    /// job_id -> job, in insertion order
    jobs: RwLock<IndexMap<String, Job>>,
}

impl JobRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a raw payload, store the resulting job and return it.
    ///
    /// Validation errors leave the registry untouched.
    pub fn add_job_using_json(&self, payload: Value) -> Result<Job> {
        let job = Job::from_json(payload)?;
        self.add_job(job.clone());
        Ok(job)
    }

    /// Store a job under its ID, replacing any job with the same ID
    pub fn add_job(&self, job: Job) {
        let job_id = job.id().to_string();
        let replaced = self.jobs.write().insert(job_id.clone(), job);

        if replaced.is_some() {
            tracing::debug!(job_id = %job_id, "Replaced existing job");
        } else {
            tracing::debug!(job_id = %job_id, "Added job");
        }
    }

    /// Look up a job by ID
    pub fn get_job(&self, job_id: &str) -> Option<Job> {
        self.jobs.read().get(job_id).cloned()
    }

    /// Remove a job by ID and return it
    pub fn remove_job(&self, job_id: &str) -> Option<Job> {
        let removed = self.jobs.write().shift_remove(job_id);

        if removed.is_some() {
            tracing::debug!(job_id = %job_id, "Removed job");
        }

        removed
    }

    /// Number of jobs
    pub fn count(&self) -> usize {
        self.jobs.read().len()
    }

    /// IDs of all jobs, in insertion order
    pub fn ids(&self) -> Vec<String> {
        self.jobs.read().keys().cloned().collect()
    }

    /// Mapping of job_id to wire format for every job
    pub fn serialize_all(&self) -> Value {
        let jobs = self.jobs.read();
        let all: Map<String, Value> = jobs
            .iter()
            .map(|(id, job)| (id.clone(), job.to_wire_format()))
            .collect();
        Value::Object(all)
    }

    /// JSON text of [`serialize_all`](Self::serialize_all)
    pub fn dumps(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.serialize_all())?)
    }
}
