//! Configuration management for check-wildfly
//!
//! The probe is configured from command line flags, environment variables
//! and an optional YAML file. The resolved [`Config`] is built once and
//! passed by reference to every component of a run.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Error reading the configuration file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Error parsing the configuration file
    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// Configuration validation error
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Operating mode of the target server
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Single server, addressed directly
    #[default]
    Standalone,
    /// Managed domain, server addressed through node and instance
    Domain,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Standalone => write!(f, "standalone"),
            Mode::Domain => write!(f, "domain"),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Management endpoint configuration
    #[serde(default)]
    pub endpoint: EndpointConfig,

    /// Directory for the optional delta state store
    #[serde(default)]
    pub state_dir: Option<PathBuf>,
}

/// Management endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Management interface host
    #[serde(default = "default_host")]
    pub host: String,

    /// Management interface port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Optional username for digest auth
    pub username: Option<String>,

    /// Optional password for digest auth
    pub password: Option<String>,

    /// Standalone or domain mode
    #[serde(default)]
    pub mode: Mode,

    /// Host controller name (domain mode)
    pub node: Option<String>,

    /// Server config name (domain mode)
    pub instance: Option<String>,

    /// Request timeout in milliseconds
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
}

// Default value functions
fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    9990
}

fn default_timeout() -> u64 {
    10_000
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            username: None,
            password: None,
            mode: Mode::default(),
            node: None,
            instance: None,
            timeout_ms: default_timeout(),
        }
    }
}

impl EndpointConfig {
    /// Base URL of the HTTP management API
    pub fn base_url(&self) -> String {
        format!("http://{}:{}/management", self.host, self.port)
    }

    /// Path prefix addressing a managed server in domain mode
    pub fn server_prefix(&self) -> Option<String> {
        match (self.mode, &self.node, &self.instance) {
            (Mode::Domain, Some(node), Some(instance)) => {
                Some(format!("/host/{}/server/{}", node, instance))
            }
            _ => None,
        }
    }

    /// Username/password pair, if both are configured
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some((user.as_str(), pass.as_str())),
            (Some(user), None) => Some((user.as_str(), "")),
            _ => None,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if the
    /// resulting configuration is invalid
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Self::read(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a YAML file without validating it
    ///
    /// Used when command-line overrides are applied before validation.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_yaml::from_str(&contents)?)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let endpoint = &self.endpoint;

        if endpoint.host.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "Host must not be empty".to_string(),
            ));
        }

        if endpoint.port == 0 {
            return Err(ConfigError::ValidationError(
                "Port must be greater than 0".to_string(),
            ));
        }

        if endpoint.timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "Timeout must be greater than 0".to_string(),
            ));
        }

        if endpoint.mode == Mode::Domain {
            let missing = |v: &Option<String>| v.as_deref().map_or(true, |s| s.trim().is_empty());
            if missing(&endpoint.node) || missing(&endpoint.instance) {
                return Err(ConfigError::ValidationError(
                    "Domain mode requires both node and instance".to_string(),
                ));
            }
        }

        Ok(())
    }
}
