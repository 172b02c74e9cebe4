//! CLI argument parsing for beat-exporter
//!
//! This module provides the command-line interface using clap derive macros.
//!
//! # Options
//!
//! - `--config` / `-c`: Configuration file path (default: beat-exporter.yaml, env: BEAT_EXPORTER_CONFIG)
//! - `--url`: Beat endpoint URL (env: BEAT_EXPORTER_URL)
//! - `--timeout`: HTTP timeout, e.g. `5s` (env: BEAT_EXPORTER_TIMEOUT)
//! - `--username`: Basic auth username (env: BEAT_EXPORTER_USERNAME)
//! - `--password`: Basic auth password (env: BEAT_EXPORTER_PASSWORD)
//! - `--interval`: Time between collection cycles, e.g. `10s` (env: BEAT_EXPORTER_INTERVAL)
//! - `--once`: Run a single collection cycle and exit
//! - `--validate`: Validate configuration and exit
//! - `--sample-config`: Print a sample configuration and exit
//! - `--timestamps`: Append timestamps to line protocol output
//! - `--log-level` / `-l`: Log level (trace/debug/info/warn/error, env: BEAT_EXPORTER_LOG_LEVEL)
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
use std::time::Duration;

use crate::config::Config;

/// beat-exporter - Elastic Beat stats collector
///
/// Polls the HTTP monitoring endpoint of a Beat and writes its stats
/// to stdout in InfluxDB line protocol.
#[derive(Parser, Debug)]
#[command(name = "beat-exporter")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "beat-exporter.yaml",
        env = "BEAT_EXPORTER_CONFIG"
    )]
    pub config: PathBuf,

    /// Beat endpoint URL (overrides config file)
    #[arg(long, value_name = "URL", env = "BEAT_EXPORTER_URL")]
    pub url: Option<String>,

    /// HTTP timeout such as "5s" or "500ms" (overrides config file)
    #[arg(long, value_name = "DURATION", value_parser = parse_duration, env = "BEAT_EXPORTER_TIMEOUT")]
    pub timeout: Option<Duration>,

    /// Basic auth username (overrides config file)
    #[arg(long, value_name = "USERNAME", env = "BEAT_EXPORTER_USERNAME")]
    pub username: Option<String>,

    /// Basic auth password (overrides config file)
    #[arg(long, value_name = "PASSWORD", env = "BEAT_EXPORTER_PASSWORD")]
    pub password: Option<String>,

    /// Time between collection cycles (overrides config file)
    #[arg(long, value_name = "DURATION", value_parser = parse_duration, env = "BEAT_EXPORTER_INTERVAL")]
    pub interval: Option<Duration>,

    /// Run a single collection cycle and exit
    #[arg(long)]
    pub once: bool,

    /// Validate configuration and exit
    #[arg(long)]
    pub validate: bool,

    /// Print a sample configuration and exit
    #[arg(long)]
    pub sample_config: bool,

    /// Append timestamps to output lines
    #[arg(long)]
    pub timestamps: bool,

    /// Log level
    #[arg(
        short,
        long,
        value_enum,
        default_value = "info",
        env = "BEAT_EXPORTER_LOG_LEVEL"
    )]
    pub log_level: LogLevel,
}

fn parse_duration(value: &str) -> Result<Duration, String> {
    humantime_serde::re::humantime::parse_duration(value).map_err(|e| e.to_string())
}

impl Cli {
    /// Apply CLI/env overrides on top of a loaded configuration
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(url) = &self.url {
            config.beat.url = url.clone();
        }
        if let Some(timeout) = self.timeout {
            config.beat.timeout = timeout;
        }
        if let Some(username) = &self.username {
            config.beat.username = username.clone();
        }
        if let Some(password) = &self.password {
            config.beat.password = password.clone();
        }
        if let Some(interval) = self.interval {
            config.agent.interval = interval;
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
    /// Info level - default
    Info,
    /// Warn level
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

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}
