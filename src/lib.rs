//! TLS Certificate Monitor: certificate probing and expiry monitoring engine
//!
//! This library connects to TLS endpoints, reads the certificate each one
//! presents and turns it into a [`CertificateRecord`] with a validity status.
//! On top of the single probe it offers bounded-concurrency batch probing
//! with retries and a monitoring cycle that refreshes stored hosts and emits
//! alert events.
//!
//! Certificates are inspected, not trusted: chain and hostname verification
//! are disabled so expired, self-signed and mismatched certificates can be
//! reported instead of failing the handshake.
//!
//! # Main Features
//!
//! - Certificate probe with status classification, fingerprints and SANs
//! - Transport probe reporting the negotiated protocol version and cipher
//! - Batch probing in groups with per-host retries
//! - Monitoring cycle with status transitions and alert events
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tls_cert_monitor::config::MonitorConfig;
//! use tls_cert_monitor::monitor::{LogNotifier, MemoryInventory, Monitor, MonitoredHost};
//! use tls_cert_monitor::Result;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Arc::new(MonitorConfig::default());
//!     let inventory = Arc::new(MemoryInventory::new(vec![
//!         MonitoredHost::new("https://example.com"),
//!     ]));
//!
//!     let monitor = Monitor::from_config(config, inventory, Arc::new(LogNotifier))?;
//!     let report = monitor.refresh_all().await?;
//!
//!     for entry in &report.entries {
//!         println!("{}: {}", entry.url, entry.status);
//!     }
//!
//!     Ok(())
//! }
//! ```

// Public modules
pub mod common;
pub mod config;
pub mod monitor;
pub mod tls;

// Re-export commonly used structures and functions for convenience
pub use common::{CertificateRecord, CertificateStatus, MonitorError, Result, TlsConfigInfo};
pub use monitor::{Monitor, MonitoredHost};
pub use tls::{probe_certificate, probe_transport_config, ProbeError, TlsProber};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
