//! Probe failure taxonomy
//!
//! Every expected way a probe can fail. These are returned as values, never
//! raised past the probe boundary.

use serde::Serialize;
use thiserror::Error;

/// Failure of a single probe
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// DNS resolution or TCP connect failed
    #[error("Failed to connect to {host}: {reason}")]
    Connect { host: String, reason: String },

    /// TLS negotiation failed
    #[error("TLS handshake with {host} failed: {reason}")]
    Handshake { host: String, reason: String },

    /// The deadline elapsed before the probe completed
    #[error("Connection to {host} timed out after {timeout_ms}ms")]
    Timeout { host: String, timeout_ms: u64 },

    /// The handshake succeeded but the peer presented no certificate
    #[error("No certificate received from {host}")]
    NoCertificate { host: String },

    /// The input could not be turned into a connectable host
    #[error("Invalid host '{input}': {reason}")]
    MalformedHost { input: String, reason: String },
}

/// Discriminant of a [`ProbeError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeErrorKind {
    Connect,
    Handshake,
    Timeout,
    NoCertificate,
    MalformedHost,
}

impl ProbeError {
    /// The error class
    pub fn kind(&self) -> ProbeErrorKind {
        match self {
            Self::Connect { .. } => ProbeErrorKind::Connect,
            Self::Handshake { .. } => ProbeErrorKind::Handshake,
            Self::Timeout { .. } => ProbeErrorKind::Timeout,
            Self::NoCertificate { .. } => ProbeErrorKind::NoCertificate,
            Self::MalformedHost { .. } => ProbeErrorKind::MalformedHost,
        }
    }

    /// The host (or raw input, for malformed hosts) the failure concerns
    pub fn host(&self) -> &str {
        match self {
            Self::Connect { host, .. }
            | Self::Handshake { host, .. }
            | Self::Timeout { host, .. }
            | Self::NoCertificate { host } => host,
            Self::MalformedHost { input, .. } => input,
        }
    }

    /// Whether retrying can change the result
    ///
    /// A malformed host stays malformed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::MalformedHost { .. })
    }
}

/// Serialized as `{ "kind": ..., "host": ..., "message": ... }`
impl Serialize for ProbeError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("ProbeError", 3)?;
        state.serialize_field("kind", &self.kind())?;
        state.serialize_field("host", self.host())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}
