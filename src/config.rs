//! Configuration management for beat-exporter
//!
//! Handles loading and validating configuration from YAML files.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
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

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Beat endpoint configuration
    #[serde(default)]
    pub beat: BeatConfig,

    /// Collection loop configuration
    #[serde(default)]
    pub agent: AgentConfig,
}

/// Beat endpoint configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeatConfig {
    /// Base URL of the Beat HTTP endpoint
    #[serde(default = "default_beat_url")]
    pub url: String,

    /// Collect the `beat` section
    #[serde(default = "default_true")]
    pub collect_beat_stats: bool,

    /// Collect the `libbeat` section
    #[serde(default = "default_true")]
    pub collect_libbeat_stats: bool,

    /// Collect the `system` section
    #[serde(default = "default_true")]
    pub collect_system_stats: bool,

    /// Collect the `filebeat` section
    #[serde(default = "default_true")]
    pub collect_filebeat_stats: bool,

    /// HTTP method used for both requests
    #[serde(default = "default_method")]
    pub method: String,

    /// Extra request headers
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Override for the HTTP `Host` header
    #[serde(default)]
    pub host_header: String,

    /// Request timeout
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    /// Basic auth username
    #[serde(default)]
    pub username: String,

    /// Basic auth password
    #[serde(default)]
    pub password: String,

    /// PEM CA bundle used to verify the server
    #[serde(default)]
    pub tls_ca: Option<PathBuf>,

    /// PEM client certificate
    #[serde(default)]
    pub tls_cert: Option<PathBuf>,

    /// PEM client private key
    #[serde(default)]
    pub tls_key: Option<PathBuf>,

    /// Use TLS but skip chain and host verification
    #[serde(default)]
    pub insecure_skip_verify: bool,

    /// Separator joining nested object keys in field names
    #[serde(default = "default_field_separator")]
    pub field_separator: String,
}

/// Collection loop configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Time between two collection cycles
    #[serde(default = "default_interval", with = "humantime_serde")]
    pub interval: Duration,
}

// Default value functions
fn default_beat_url() -> String {
    "http://127.0.0.1:5066".to_string()
}

fn default_true() -> bool {
    true
}

fn default_method() -> String {
    "GET".to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_field_separator() -> String {
    "_".to_string()
}

fn default_interval() -> Duration {
    Duration::from_secs(10)
}

impl Default for BeatConfig {
    fn default() -> Self {
        Self {
            url: default_beat_url(),
            collect_beat_stats: true,
            collect_libbeat_stats: true,
            collect_system_stats: true,
            collect_filebeat_stats: true,
            method: default_method(),
            headers: HashMap::new(),
            host_header: String::new(),
            timeout: default_timeout(),
            username: String::new(),
            password: String::new(),
            tls_ca: None,
            tls_cert: None,
            tls_key: None,
            insecure_skip_verify: false,
            field_separator: default_field_separator(),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed or validated
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&contents)
    }

    /// Parse and validate configuration from a YAML string
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file, falling back to defaults if not found
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!(
                path = %path.display(),
                "Config file not found, using defaults"
            );
            return Ok(Self::default());
        }

        Self::load(path)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.agent.interval.is_zero() {
            return Err(ConfigError::ValidationError(
                "Collection interval must be greater than 0".to_string(),
            ));
        }

        self.beat.validate()
    }
}

impl BeatConfig {
    /// Validate the Beat endpoint settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        url::Url::parse(&self.url).map_err(|e| {
            ConfigError::ValidationError(format!("Invalid Beat URL '{}': {}", self.url, e))
        })?;

        if self.timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "Timeout must be greater than 0".to_string(),
            ));
        }

        if self.tls_cert.is_some() != self.tls_key.is_some() {
            return Err(ConfigError::ValidationError(
                "tls_cert and tls_key must be set together".to_string(),
            ));
        }

        Ok(())
    }
}
