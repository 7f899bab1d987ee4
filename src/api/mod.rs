//! Replication Manager Job Service
//!
//! REST front end over the in-memory [`JobRegistry`](crate::jobs::JobRegistry).
//!
//! ## API Endpoints
//!
//! | Endpoint | Method | Description |
//! |----------|--------|-------------|
//! | `/jobs` | POST | Create a job from a JSON payload (201) |
//! | `/jobs` | GET | Mapping of job_id to job |
//! | `/jobs?count` | GET | `{"count": N}` |
//! | `/jobs/{id}` | GET | Job details (404 if unknown) |
//! | `/jobs/{id}` | DELETE | Remove job (204, 404 if unknown) |
//! | `/status` | GET | Service name, version, uptime and job count |
//! | `/health` | GET | Liveness probe |

mod server;
mod handlers;
mod models;

pub use server::*;
pub use handlers::*;
pub use models::*;
