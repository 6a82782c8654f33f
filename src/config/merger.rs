//! Configuration merging functionality
//!
//! Command line flags are optional; only the ones given override the loaded
//! configuration.

use super::{BackoffKind, MonitorConfig};

/// Values that override a loaded configuration when present
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub port: Option<u16>,
    pub timeout_ms: Option<u64>,
    pub batch_size: Option<usize>,
    pub max_retries: Option<u32>,
    pub retry_delay_ms: Option<u64>,
    pub backoff: Option<BackoffKind>,
    pub expiring_soon_window_days: Option<i64>,
    pub cycle_concurrency: Option<usize>,
    pub notify_on_probe_failure: Option<bool>,
    pub log_level: Option<String>,
}

impl MonitorConfig {
    /// Apply overrides, keeping current values where none is given
    pub fn merge(mut self, overrides: ConfigOverrides) -> Self {
        fn merge_field<T>(field: &mut T, value: Option<T>) {
            if let Some(value) = value {
                *field = value;
            }
        }

        merge_field(&mut self.port, overrides.port);
        merge_field(&mut self.timeout_ms, overrides.timeout_ms);
        merge_field(&mut self.batch_size, overrides.batch_size);
        merge_field(&mut self.max_retries, overrides.max_retries);
        merge_field(&mut self.retry_delay_ms, overrides.retry_delay_ms);
        merge_field(&mut self.backoff, overrides.backoff);
        merge_field(&mut self.expiring_soon_window_days, overrides.expiring_soon_window_days);
        merge_field(&mut self.cycle_concurrency, overrides.cycle_concurrency);
        merge_field(&mut self.notify_on_probe_failure, overrides.notify_on_probe_failure);
        merge_field(&mut self.log_level, overrides.log_level);

        self
    }
}
