//! TLS handling module
//!
//! This module opens probe connections and extracts certificate and
//! transport metadata from the negotiated sessions.

pub mod cert;
mod connector;
mod error;
mod probe;

pub use cert::{certificate_record, certificate_to_hex, parse_subject_alt_names};
pub use connector::{build_probe_connector, probe_ssl};
pub use error::{ProbeError, ProbeErrorKind};
pub use probe::{
    probe_certificate, probe_transport_config, CertificateProber, ProbeOutcome, TlsProber,
    DEFAULT_PORT, DEFAULT_TIMEOUT,
};
