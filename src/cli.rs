//! CLI argument parsing for check_wildfly
//!
//! This module provides the command-line interface using clap derive macros.
//! Short flags follow the conventional Nagios plugin layout.
//!
//! # Options
//!
//! - `-H` / `--host`: Management host (default: 127.0.0.1, env: WILDFLY_HOST)
//! - `-P` / `--port`: Management port (default: 9990, env: WILDFLY_PORT)
//! - `-u` / `--user`, `-p` / `--pass`: Digest credentials (env: WILDFLY_USER, WILDFLY_PASS)
//! - `-M` / `--mode`: standalone or domain (env: WILDFLY_MODE)
//! - `-n` / `--node`, `-i` / `--instance`: Domain host and server (env: WILDFLY_NODE, WILDFLY_INSTANCE)
//! - `-W` / `--warning`, `-C` / `--critical`: Thresholds
//! - `-A` / `--action`: Check to run (default: server_status)
//! - `-D` / `--perf-data`: Append performance data
//! - `-m` / `--memorypool`: Memory pool or garbage collector name
//! - `-q` / `--queuename`: JMS queue name
//! - `-d` / `--datasource`: Datasource name
//! - `-s` / `--poolstats`: Datasource pool statistic
//! - `-t` / `--threadstats`: Thread statistic
//! - `--timeout`: Request timeout in milliseconds (env: WILDFLY_TIMEOUT)
//! - `--config`: Optional YAML configuration file (env: WILDFLY_CONFIG)
//! - `--state-dir`: Enable delta tracking in this directory (env: WILDFLY_STATE_DIR)
//! - `--log-level`: Log level written to stderr (default: warn, env: WILDFLY_LOG_LEVEL)
//!
//! # Precedence
//!
//! Configuration values are resolved in the following order (highest to lowest priority):
//! 1. CLI arguments
//! 2. Environment variables
//! 3. Configuration file
//! 4. Default values

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::check::{Action, CheckRequest};
use crate::config::{Config, ConfigError, Mode};

/// check_wildfly - Nagios probe for the WildFly management API
///
/// Queries the HTTP management interface of a WildFly server, evaluates one
/// metric against warning and critical thresholds and prints a single
/// status line. The exit code is 0 (OK), 1 (WARNING), 2 (CRITICAL) or
/// 3 (UNKNOWN).
#[derive(Parser, Debug)]
#[command(name = "check_wildfly")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Management host
    #[arg(short = 'H', long, value_name = "HOST", env = "WILDFLY_HOST")]
    pub host: Option<String>,

    /// Management port
    #[arg(short = 'P', long, value_name = "PORT", env = "WILDFLY_PORT")]
    pub port: Option<u16>,

    /// Management user for digest authentication
    #[arg(short = 'u', long, value_name = "USER", env = "WILDFLY_USER")]
    pub user: Option<String>,

    /// Management password for digest authentication
    #[arg(short = 'p', long, value_name = "PASSWORD", env = "WILDFLY_PASS")]
    pub pass: Option<String>,

    /// Server mode
    #[arg(short = 'M', long, value_enum, env = "WILDFLY_MODE")]
    pub mode: Option<Mode>,

    /// Domain host name (domain mode)
    #[arg(short = 'n', long, value_name = "NODE", env = "WILDFLY_NODE")]
    pub node: Option<String>,

    /// Server instance name (domain mode)
    #[arg(short = 'i', long, value_name = "INSTANCE", env = "WILDFLY_INSTANCE")]
    pub instance: Option<String>,

    /// Warning threshold (number, or comma-separated states)
    #[arg(short = 'W', long, value_name = "LEVEL", allow_hyphen_values = true)]
    pub warning: Option<String>,

    /// Critical threshold (number, or comma-separated states)
    #[arg(short = 'C', long, value_name = "LEVEL", allow_hyphen_values = true)]
    pub critical: Option<String>,

    /// Check to run
    #[arg(short = 'A', long, value_enum, default_value_t = Action::ServerStatus)]
    pub action: Action,

    /// Append performance data to the status line
    #[arg(short = 'D', long)]
    pub perf_data: bool,

    /// Memory pool or garbage collector name
    #[arg(short = 'm', long, value_name = "POOL")]
    pub memorypool: Option<String>,

    /// JMS queue name (queue_depth)
    #[arg(short = 'q', long, value_name = "QUEUE")]
    pub queuename: Option<String>,

    /// Datasource name (datasource, xa_datasource)
    #[arg(short = 'd', long, value_name = "NAME")]
    pub datasource: Option<String>,

    /// Datasource pool statistic, e.g. ActiveCount
    #[arg(short = 's', long, value_name = "STAT")]
    pub poolstats: Option<String>,

    /// Thread statistic, e.g. thread-count
    #[arg(short = 't', long, value_name = "STAT")]
    pub threadstats: Option<String>,

    /// Request timeout in milliseconds
    #[arg(long, value_name = "MS", env = "WILDFLY_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Path to an optional YAML configuration file
    #[arg(long, value_name = "FILE", env = "WILDFLY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory used to remember the previous sample
    #[arg(long, value_name = "DIR", env = "WILDFLY_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// Log level
    #[arg(long, value_enum, default_value = "warn", env = "WILDFLY_LOG_LEVEL")]
    pub log_level: LogLevel,
}

impl Cli {
    /// Resolve the run configuration
    ///
    /// Starts from the config file (or defaults), applies command-line and
    /// environment overrides and validates the result.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if the
    /// merged configuration is invalid
    pub fn load_config(&self) -> Result<Config, ConfigError> {
        let mut config = match &self.config {
            Some(path) => Config::read(path)?,
            None => Config::default(),
        };
        self.apply_overrides(&mut config);
        config.validate()?;
        Ok(config)
    }

    fn apply_overrides(&self, config: &mut Config) {
        let endpoint = &mut config.endpoint;

        if let Some(host) = &self.host {
            endpoint.host = host.clone();
        }
        if let Some(port) = self.port {
            endpoint.port = port;
        }
        if let Some(user) = &self.user {
            endpoint.username = Some(user.clone());
        }
        if let Some(pass) = &self.pass {
            endpoint.password = Some(pass.clone());
        }
        if let Some(mode) = self.mode {
            endpoint.mode = mode;
        }
        if let Some(node) = &self.node {
            endpoint.node = Some(node.clone());
        }
        if let Some(instance) = &self.instance {
            endpoint.instance = Some(instance.clone());
        }
        if let Some(timeout) = self.timeout {
            endpoint.timeout_ms = timeout;
        }
        if let Some(dir) = &self.state_dir {
            config.state_dir = Some(dir.clone());
        }
    }

    /// Check parameters of this invocation
    pub fn to_request(&self) -> CheckRequest {
        CheckRequest {
            action: self.action,
            warning: self.warning.clone(),
            critical: self.critical.clone(),
            memory_pool: self.memorypool.clone(),
            queue_name: self.queuename.clone(),
            datasource: self.datasource.clone(),
            ds_stat_type: self.poolstats.clone(),
            thread_stat_type: self.threadstats.clone(),
        }
    }
}

/// Log level options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Trace level - most verbose
    Trace,
    /// Debug level
    Debug,
    /// Info level
    Info,
    /// Warn level - default
    Warn,
    /// Error level - least verbose
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}
