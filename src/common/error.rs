//! Error handling module
//!
//! This module defines the crate-level error type and result alias. Expected
//! network failures of a single probe are not reported through this type;
//! see [`crate::tls::ProbeError`] for those.

use thiserror::Error;
use std::io;

/// TLS certificate monitor error type
#[derive(Error, Debug)]
pub enum MonitorError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// OpenSSL error
    #[error("OpenSSL error: {0}")]
    Ssl(#[from] openssl::error::ErrorStack),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Certificate content that cannot be interpreted
    #[error("Certificate error: {0}")]
    Certificate(String),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Inventory collaborator error
    #[error("Inventory error: {0}")]
    Inventory(String),

    /// Notification sink error
    #[error("Notification error: {0}")]
    Notification(String),
}

impl From<config::ConfigError> for MonitorError {
    fn from(err: config::ConfigError) -> Self {
        MonitorError::Config(err.to_string())
    }
}

/// Result type alias
///
/// This is a `Result` type alias that uses our custom `MonitorError`.
pub type Result<T> = std::result::Result<T, MonitorError>;
