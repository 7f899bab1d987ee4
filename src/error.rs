//! Error types for the replication manager
//!
//! Validation failures, configuration problems and transport errors all
//! surface through [`ReplicationError`]. Lookups of unknown jobs are not
//! errors: the registry reports them as `None`.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for replication manager operations
#[derive(Error, Debug)]
pub enum ReplicationError {
    /// Job payload was empty or malformed
    #[error("Invalid job payload: {0}")]
    Validation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error with path context
    #[error("I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Listener or socket error
    #[error("Connection error on '{addr}': {message}")]
    Connection { addr: String, message: String },

    /// Malformed HTTP request
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// JSON encoding/decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReplicationError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a connection error
    pub fn connection(addr: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connection {
            addr: addr.into(),
            message: message.into(),
        }
    }

    /// Create an HTTP protocol error carrying the status to answer with
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Whether the error was caused by the caller's input
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::Validation(_) | Self::Json(_) => true,
            Self::Http { status, .. } => (400..500).contains(status),
            _ => false,
        }
    }

    /// HTTP status the service answers with for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) | Self::Json(_) => 400,
            Self::Http { status, .. } => *status,
            _ => 500,
        }
    }
}

/// Result type alias for replication manager operations
pub type Result<T> = std::result::Result<T, ReplicationError>;

impl From<std::io::Error> for ReplicationError {
    fn from(err: std::io::Error) -> Self {
        ReplicationError::Io {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<serde_yaml::Error> for ReplicationError {
    fn from(err: serde_yaml::Error) -> Self {
        ReplicationError::Config(err.to_string())
    }
}

/// Extension trait for adding path context to std::io::Result
pub trait IoResultExt<T> {
    /// Add path context to an I/O error
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| ReplicationError::io(path, e))
    }
}
