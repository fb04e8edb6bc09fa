//! Configuration for the synthetic metrics generator.
//!
//! Provides YAML-based configuration loading with documented defaults:
//! - Reporting endpoint identity (host, port)
//! - Synchronous update interval
//! - Per-metric bounds for synthetic value generation
//!
//! A missing, malformed, or invalid config file is never fatal: the loader
//! falls back to the default set and logs a warning.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Default reporting host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default reporting port.
pub const DEFAULT_PORT: &str = "4567";

/// Default synchronous update interval (1 second).
pub const DEFAULT_UPDATE_INTERVAL_SECONDS: i64 = 1;

/// Default per-tick increment for the time-alive counter.
pub const DEFAULT_TIME_ALIVE_INCREMENTER: i64 = 1;

/// Default upper bound for synthetic heap-size samples.
pub const DEFAULT_TOTAL_HEAP_SIZE_UPPER_BOUND: i64 = 100;

/// Default upper bound for the threads-active oscillator.
pub const DEFAULT_THREADS_ACTIVE_UPPER_BOUND: i64 = 10;

/// Default upper bound for synthetic CPU-usage samples.
pub const DEFAULT_CPU_USAGE_UPPER_BOUND: i64 = 100;

// =============================================================================
// Errors
// =============================================================================

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse YAML configuration.
    #[error("failed to parse YAML config: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Configuration validation failed.
    #[error("config validation error: {0}")]
    Validation(String),
}

// =============================================================================
// Configuration
// =============================================================================

/// Tunables for the synthetic metrics generator.
///
/// Constructed once before the scheduler starts and read-only for the
/// process lifetime. Callbacks snapshot the bounds they need at
/// registration time rather than holding a reference to this struct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Reporting host identity (default: "0.0.0.0").
    #[serde(rename = "Host")]
    pub host: String,

    /// Reporting port identity (default: "4567").
    #[serde(rename = "Port")]
    pub port: String,

    /// Interval between synchronous instrument updates, in seconds
    /// (default: 1, must be positive).
    #[serde(rename = "UpdateIntervalSeconds")]
    pub update_interval_seconds: i64,

    /// Amount added to the time-alive counter on each update tick
    /// (default: 1, must be non-negative).
    #[serde(rename = "RandomTimeAliveIncrementer")]
    pub time_alive_incrementer: i64,

    /// Exclusive upper bound for synthetic heap-size samples
    /// (default: 100, must be non-negative).
    #[serde(rename = "RandomTotalHeapSizeUpperBound")]
    pub total_heap_size_upper_bound: i64,

    /// Inclusive upper bound for the threads-active oscillator
    /// (default: 10, must be non-negative).
    #[serde(rename = "RandomThreadsActiveUpperBound")]
    pub threads_active_upper_bound: i64,

    /// Exclusive upper bound for synthetic CPU-usage samples
    /// (default: 100, must be non-negative).
    #[serde(rename = "RandomCpuUsageUpperBound")]
    pub cpu_usage_upper_bound: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT.to_string(),
            update_interval_seconds: DEFAULT_UPDATE_INTERVAL_SECONDS,
            time_alive_incrementer: DEFAULT_TIME_ALIVE_INCREMENTER,
            total_heap_size_upper_bound: DEFAULT_TOTAL_HEAP_SIZE_UPPER_BOUND,
            threads_active_upper_bound: DEFAULT_THREADS_ACTIVE_UPPER_BOUND,
            cpu_usage_upper_bound: DEFAULT_CPU_USAGE_UPPER_BOUND,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read, parsed, or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file, substituting the documented
    /// defaults on any failure.
    ///
    /// A missing file, a parse failure, and a validation failure all yield
    /// the identical default struct; the failure is logged but never
    /// surfaced to the caller.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path.as_ref()) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(
                    path = %path.as_ref().display(),
                    error = %e,
                    "Failed to load config, using defaults"
                );
                Self::default()
            }
        }
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns `ConfigError::Validation` if any field is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // A zero interval would busy-loop the scheduler.
        if self.update_interval_seconds <= 0 {
            return Err(ConfigError::Validation(format!(
                "UpdateIntervalSeconds must be positive, got {}",
                self.update_interval_seconds
            )));
        }

        // The counter is monotonic; a negative increment would violate that.
        if self.time_alive_incrementer < 0 {
            return Err(ConfigError::Validation(format!(
                "RandomTimeAliveIncrementer must be non-negative, got {}",
                self.time_alive_incrementer
            )));
        }

        for (key, value) in [
            (
                "RandomTotalHeapSizeUpperBound",
                self.total_heap_size_upper_bound,
            ),
            (
                "RandomThreadsActiveUpperBound",
                self.threads_active_upper_bound,
            ),
            ("RandomCpuUsageUpperBound", self.cpu_usage_upper_bound),
        ] {
            if value < 0 {
                return Err(ConfigError::Validation(format!(
                    "{} must be non-negative, got {}",
                    key, value
                )));
            }
        }

        Ok(())
    }

    /// The synchronous update interval as a [`Duration`].
    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval_seconds as u64)
    }
}
