//! Common module
//!
//! This module contains shared types, errors, and utility functions used throughout the application.

pub mod error;
pub mod log;
pub mod net;
pub mod types;

// Re-export commonly used types and functions
pub use error::{MonitorError, Result};
pub use log::{init_logger, set_log_level};
pub use net::{parse_target, ProbeTarget};
pub use types::{CertificateRecord, CertificateStatus, TlsConfigInfo};
