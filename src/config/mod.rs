//! Configuration module for the replication manager
//!
//! Provides CLI arguments and the YAML manager configuration.

mod settings;

pub use settings::*;
