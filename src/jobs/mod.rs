//! Replication job tracking
//!
//! [`Job`] describes one replication task; [`JobRegistry`] holds every
//! active job keyed by its ID.

mod job;
mod registry;

pub use job::*;
pub use registry::*;
