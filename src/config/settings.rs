//! Configuration settings for the replication manager
//!
//! CLI arguments plus the YAML manager configuration. The config file
//! carries a single `manager` section:
//!
//! ```yaml
//! manager:
//!   host: 127.0.0.1
//!   port: 8080
//!   ssl: false
//!   service_name: s3-replication-manager
//! ```

use crate::error::{IoResultExt, ReplicationError, Result};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file location, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config/config.yaml";

/// Replication manager - tracks replication jobs over a REST API
#[derive(Parser, Debug, Clone)]
#[command(name = "replication-manager")]
#[command(author = "Replication Manager Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Job registry service for object replication")]
#[command(long_about = r#"
Replication manager keeps the in-memory registry of replication jobs and
exposes it over HTTP.

Endpoints:
  POST   /jobs          Create a job from a JSON payload
  GET    /jobs          List all jobs (add ?count for the job count)
  GET    /jobs/{id}     Fetch one job
  DELETE /jobs/{id}     Remove a job

Examples:
  replication-manager                               # Use config/config.yaml
  replication-manager --config /etc/manager.yaml    # Explicit config file
  replication-manager --port 9090 -v                # Override port, debug logs
"#)]
pub struct CliArgs {
    /// Path to the YAML config file
    #[arg(short = 'c', long, env = "REPLICATION_MANAGER_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the configured bind host
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Override the configured port
    #[arg(short = 'p', long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log output format
    #[arg(long, value_enum, default_value = "text")]
    pub log_format: LogFormat,
}

/// Log output format
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

impl CliArgs {
    /// Default tracing filter directive for the verbosity level
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }

    /// Resolve the manager configuration for these arguments.
    ///
    /// An explicit `--config` path must exist. Without one, the default path
    /// is used when present and built-in defaults otherwise.
    pub fn load_config(&self) -> Result<ManagerConfig> {
        let mut config = match &self.config {
            Some(path) => ManagerConfig::load(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_PATH);
                if default_path.exists() {
                    ManagerConfig::load(default_path)?
                } else {
                    tracing::info!(
                        "No config file at {}, using built-in defaults",
                        default_path.display()
                    );
                    ManagerConfig::default()
                }
            }
        };

        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }

        Ok(config)
    }
}

/// Layout of the YAML config file
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    manager: ManagerConfig,
}

/// Replication manager service configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// Bind host
    pub host: String,
    /// Listen port
    pub port: u16,
    /// Whether clients reach the service over TLS
    pub ssl: bool,
    /// Service name reported by the status endpoint
    pub service_name: String,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ssl: false,
            service_name: "s3-replication-manager".to_string(),
        }
    }
}

impl ManagerConfig {
    /// Load the configuration from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).with_path(path)?;

        Self::from_yaml(&contents).map_err(|e| {
            ReplicationError::config(format!("{}: {}", path.display(), e))
        })
    }

    /// Parse the configuration from YAML text
    pub fn from_yaml(contents: &str) -> Result<Self> {
        let file: ConfigFile = serde_yaml::from_str(contents)?;
        file.manager.validate()?;
        Ok(file.manager)
    }

    /// Check values that YAML typing alone does not catch
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(ReplicationError::config("manager.host must not be empty"));
        }
        if self.service_name.trim().is_empty() {
            return Err(ReplicationError::config(
                "manager.service_name must not be empty",
            ));
        }
        Ok(())
    }

    /// `host:port` listen address
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Base URL clients use to reach the service
    pub fn url(&self) -> String {
        let scheme = if self.ssl { "https" } else { "http" };
        format!("{}://{}", scheme, self.bind_addr())
    }

    /// Log the effective configuration
    pub fn log_with(&self) {
        tracing::info!("Using configuration:");
        tracing::info!("Host: {}", self.host);
        tracing::info!("Port: {}", self.port);
        tracing::info!("ssl: {}", self.ssl);
        tracing::info!("service_name: {}", self.service_name);
        tracing::info!("URL: {}", self.url());
    }
}
