//! # Replication Manager
//!
//! Tracks replication jobs submitted to the manager service that coordinates
//! copying of objects between storage endpoints. The heart of the crate is
//! the [`JobRegistry`]: the in-memory, identifier-keyed store of every active
//! job. A small HTTP front end ([`api`]) exposes it as a REST resource.
//!
//! ## Quick Start
//!
//! ```no_run
//! use replication_manager::jobs::JobRegistry;
//! use serde_json::json;
//!
//! let registry = JobRegistry::new();
//! let job = registry.add_job_using_json(json!({"obj_name": "foo"})).unwrap();
//!
//! assert_eq!(registry.count(), 1);
//! assert!(registry.get_job(job.id()).is_some());
//! ```
//!
//! ## Running the Service
//!
//! ```no_run
//! use replication_manager::api::{ApiServer, ApiServerConfig, AppState};
//! use replication_manager::config::ManagerConfig;
//! use replication_manager::jobs::JobRegistry;
//! use std::sync::Arc;
//!
//! # async fn serve() -> replication_manager::Result<()> {
//! let config = ManagerConfig::load("config/config.yaml")?;
//! let state = Arc::new(AppState::new(Arc::new(JobRegistry::new()), &config.service_name));
//!
//! let server = ApiServer::bind(ApiServerConfig::from(&config), state).await?;
//! server.run().await
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod config;
pub mod error;
pub mod jobs;

// Re-export commonly used types
pub use config::ManagerConfig;
pub use error::{ReplicationError, Result};
pub use jobs::{Job, JobRegistry};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
