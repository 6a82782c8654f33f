//! Configuration module
//!
//! This module handles the monitor configuration, including loading from
//! different sources (files, environment variables, command line arguments)
//! and validating the result.

pub mod defaults;
mod loader;
mod merger;
mod validator;

pub use self::defaults::{DEFAULT_CONFIG_FILE, ENV_PREFIX};
pub use self::merger::ConfigOverrides;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::common::MonitorError;

/// Retry backoff policy
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    /// Constant delay between attempts
    #[default]
    Fixed,
    /// Delay doubles after every attempt, up to `max_retry_delay_ms`
    Exponential,
}

impl fmt::Display for BackoffKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed => write!(f, "fixed"),
            Self::Exponential => write!(f, "exponential"),
        }
    }
}

impl FromStr for BackoffKind {
    type Err = MonitorError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fixed" => Ok(Self::Fixed),
            "exponential" => Ok(Self::Exponential),
            _ => Err(MonitorError::Config(format!(
                "Invalid backoff: {}. Valid values are: fixed, exponential",
                s
            ))),
        }
    }
}

/// Monitor configuration
///
/// Every option has a default, so an empty file or no file at all is a
/// valid configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
#[serde(default)]
pub struct MonitorConfig {
    // --- Probe settings ---

    /// Port used for hosts that do not carry one
    #[serde(default = "defaults::port")]
    pub port: u16,

    /// Per-connection timeout in milliseconds
    #[serde(default = "defaults::timeout_ms")]
    pub timeout_ms: u64,

    // --- Batch settings ---

    /// Maximum number of hosts probed at the same time
    #[serde(default = "defaults::batch_size")]
    pub batch_size: usize,

    /// Attempts per host before it is reported as failed
    #[serde(default = "defaults::max_retries")]
    pub max_retries: u32,

    /// Delay between attempts in milliseconds
    #[serde(default = "defaults::retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Retry backoff policy
    #[serde(default = "defaults::backoff")]
    pub backoff: BackoffKind,

    /// Cap on the exponential backoff delay in milliseconds
    #[serde(default = "defaults::max_retry_delay_ms")]
    pub max_retry_delay_ms: u64,

    // --- Monitoring settings ---

    /// Days before expiry a valid certificate is shown as expiring soon
    #[serde(default = "defaults::expiring_soon_window_days")]
    pub expiring_soon_window_days: i64,

    /// Hosts the monitoring cycle probes at the same time
    #[serde(default = "defaults::cycle_concurrency")]
    pub cycle_concurrency: usize,

    /// Also alert when a probe fails outright (unreachable host, bad handshake)
    #[serde(default = "defaults::notify_on_probe_failure")]
    pub notify_on_probe_failure: bool,

    // --- General settings ---

    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "defaults::log_level")]
    pub log_level: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            port: defaults::port(),
            timeout_ms: defaults::timeout_ms(),
            batch_size: defaults::batch_size(),
            max_retries: defaults::max_retries(),
            retry_delay_ms: defaults::retry_delay_ms(),
            backoff: defaults::backoff(),
            max_retry_delay_ms: defaults::max_retry_delay_ms(),
            expiring_soon_window_days: defaults::expiring_soon_window_days(),
            cycle_concurrency: defaults::cycle_concurrency(),
            notify_on_probe_failure: defaults::notify_on_probe_failure(),
            log_level: defaults::log_level(),
        }
    }
}

impl MonitorConfig {
    /// Per-connection timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Delay between attempts
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Cap on the exponential backoff delay
    pub fn max_retry_delay(&self) -> Duration {
        Duration::from_millis(self.max_retry_delay_ms)
    }

    /// Width of the expiring-soon window
    pub fn expiring_soon_window(&self) -> chrono::Duration {
        chrono::Duration::days(self.expiring_soon_window_days)
    }
}
