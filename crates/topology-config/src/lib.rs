//! # Topology Configuration
//!
//! YAML configuration for the deployment topology CLI.
//!
//! A `topology.yaml` file names the platform API to talk to, default
//! organization and project, log settings and the environment names used to
//! break ordering ties. String values may reference environment variables as
//! `${VAR}` or `${VAR:-default}`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod parser;

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse YAML
    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    /// Environment variable not found
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Log levels accepted in `settings.log_level`
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// Platform API connection
    pub platform: PlatformConfig,

    /// Defaults for command-line scope options
    #[serde(default, skip_serializing_if = "Defaults::is_default")]
    pub defaults: Defaults,

    /// Global settings
    #[serde(default, skip_serializing_if = "Settings::is_default")]
    pub settings: Settings,

    /// Environment ordering
    #[serde(default, skip_serializing_if = "Ordering::is_default")]
    pub ordering: Ordering,
}

/// Platform API connection settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlatformConfig {
    /// Base URL of the platform API
    pub base_url: String,

    /// Bearer token; empty means none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Connect timeout in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    5
}

impl PlatformConfig {
    /// The bearer token, if one is set and non-blank
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.trim().is_empty())
    }
}

/// Defaults for scope options
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Defaults {
    /// Organization used when `--org` is not given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,

    /// Project used when `--project` is not given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
}

impl Defaults {
    fn is_default(&self) -> bool {
        self == &Defaults::default()
    }
}

/// Global settings
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Settings {
    /// Default log level
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

impl Settings {
    fn is_default(&self) -> bool {
        self == &Settings::default()
    }
}

/// Environment ordering settings
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Ordering {
    /// Environment names used to break ordering ties, most upstream first
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_environments: Option<Vec<String>>,
}

impl Ordering {
    fn is_default(&self) -> bool {
        self == &Ordering::default()
    }
}
