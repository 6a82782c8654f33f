//! Default configuration values
//!
//! This module provides default values for configuration options.
//! It is the single source of truth for defaults used by serde, the
//! loader and the command line.

use super::BackoffKind;

/// Environment variable prefix for all configuration options
///
/// `TLS_CERT_MONITOR_BATCH_SIZE=20` sets `batch_size`.
pub const ENV_PREFIX: &str = "TLS_CERT_MONITOR";

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "tls-cert-monitor.json";

/// Default log level as string
pub const LOG_LEVEL_STR: &str = "info";

/// Default TLS port
pub fn port() -> u16 {
    443
}

/// Default per-connection timeout in milliseconds
pub fn timeout_ms() -> u64 {
    5000
}

/// Default number of hosts probed concurrently by the batch orchestrator
pub fn batch_size() -> usize {
    10
}

/// Default number of attempts per host
pub fn max_retries() -> u32 {
    3
}

/// Default delay between attempts in milliseconds
pub fn retry_delay_ms() -> u64 {
    1000
}

/// Default backoff policy
pub fn backoff() -> BackoffKind {
    BackoffKind::Fixed
}

/// Default cap on the delay of the exponential backoff, in milliseconds
pub fn max_retry_delay_ms() -> u64 {
    30_000
}

/// Default width of the expiring-soon window in days
pub fn expiring_soon_window_days() -> i64 {
    30
}

/// Default number of hosts the monitoring cycle probes at once
pub fn cycle_concurrency() -> usize {
    1
}

/// By default a failed probe is recorded but not alerted on
pub fn notify_on_probe_failure() -> bool {
    false
}

/// Default log level
pub fn log_level() -> String {
    LOG_LEVEL_STR.to_string()
}
