//! Configuration validator

use log::warn;

use crate::common::{MonitorError, Result};
use super::MonitorConfig;

impl MonitorConfig {
    /// Validate the configuration
    ///
    /// Zero sizes, counts and timeouts are rejected. An unknown log level is
    /// only warned about.
    pub fn validate(&self) -> Result<()> {
        self.validate_probe_settings()?;
        self.validate_batch_settings()?;
        self.validate_monitoring_settings()?;
        self.validate_general_settings();
        Ok(())
    }

    fn validate_probe_settings(&self) -> Result<()> {
        if self.port == 0 {
            return Err(invalid("port", "Port must be greater than 0"));
        }
        if self.timeout_ms == 0 {
            return Err(invalid("timeout_ms", "Timeout must be greater than 0"));
        }
        Ok(())
    }

    fn validate_batch_settings(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(invalid("batch_size", "Batch size must be greater than 0"));
        }
        if self.max_retries == 0 {
            return Err(invalid("max_retries", "At least one attempt is required"));
        }
        if self.max_retry_delay_ms < self.retry_delay_ms {
            warn!(
                "max_retry_delay_ms ({}) is below retry_delay_ms ({}); delays will be capped",
                self.max_retry_delay_ms, self.retry_delay_ms
            );
        }
        Ok(())
    }

    fn validate_monitoring_settings(&self) -> Result<()> {
        if self.expiring_soon_window_days < 0 {
            return Err(invalid("expiring_soon_window_days", "Window must not be negative"));
        }
        if self.cycle_concurrency == 0 {
            return Err(invalid("cycle_concurrency", "Cycle concurrency must be greater than 0"));
        }
        Ok(())
    }

    fn validate_general_settings(&self) {
        match self.log_level.as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => {}
            level => warn!("Invalid log level: {}. Using default: info", level),
        }
    }
}

fn invalid(name: &str, msg: &str) -> MonitorError {
    MonitorError::Config(format!("Invalid value for '{}': {}", name, msg))
}
