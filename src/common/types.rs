//! Shared types module
//!
//! This module contains the data produced by probes: certificate records,
//! their validity classification, and transport configuration reports.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::MonitorError;
use crate::tls::ProbeError;

/// Protocol version the monitor recommends as a minimum
pub const MINIMUM_RECOMMENDED_PROTOCOL: &str = "TLSv1.2";

/// Protocol versions reported as insecure
pub const INSECURE_PROTOCOLS: [&str; 3] = ["TLSv1", "TLSv1.1", "unknown"];

/// Validity classification of a certificate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CertificateStatus {
    /// Inside its validity window
    Valid,
    /// Past `valid_to`
    Expired,
    /// Before `valid_from`
    NotYetValid,
    /// The probe failed; no validity bound was read from the peer
    Error,
}

impl CertificateStatus {
    /// Classify a validity window against `now`
    ///
    /// Returns the status and, for anything but `Valid`, a human readable detail.
    pub fn classify(
        now: DateTime<Utc>,
        valid_from: DateTime<Utc>,
        valid_to: DateTime<Utc>,
    ) -> (Self, Option<String>) {
        if now > valid_to {
            (Self::Expired, Some("Certificate has expired".to_string()))
        } else if now < valid_from {
            (Self::NotYetValid, Some("Certificate not yet valid".to_string()))
        } else {
            (Self::Valid, None)
        }
    }

    /// Whether this status belongs to the error class
    ///
    /// A not-yet-valid certificate is reported as an error with its own detail.
    pub fn is_error_class(&self) -> bool {
        matches!(self, Self::Error | Self::NotYetValid)
    }

    /// Whether this status calls for an alert
    pub fn needs_attention(&self) -> bool {
        matches!(self, Self::Expired) || self.is_error_class()
    }
}

impl fmt::Display for CertificateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid => write!(f, "valid"),
            Self::Expired => write!(f, "expired"),
            Self::NotYetValid => write!(f, "not-yet-valid"),
            Self::Error => write!(f, "error"),
        }
    }
}

impl FromStr for CertificateStatus {
    type Err = MonitorError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "valid" => Ok(Self::Valid),
            "expired" => Ok(Self::Expired),
            "not-yet-valid" => Ok(Self::NotYetValid),
            "error" => Ok(Self::Error),
            _ => Err(MonitorError::Config(format!(
                "Invalid certificate status: {}. Valid values are: valid, expired, not-yet-valid, error",
                s
            ))),
        }
    }
}

/// Result of probing one host at one point in time
///
/// Records are never mutated after a probe; a new probe builds a new record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateRecord {
    /// Issuer distinguished name, `key=value` pairs joined by `, `
    #[serde(rename = "issuerDN")]
    pub issuer: String,
    /// Start of the validity window
    pub valid_from: Option<DateTime<Utc>>,
    /// End of the validity window
    pub valid_to: Option<DateTime<Utc>>,
    /// Validity classification
    pub status: CertificateStatus,
    /// Human readable detail for non-valid statuses
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub status_detail: Option<String>,
    /// Serial number, upper-case hex
    pub serial_number: String,
    /// SHA-1 fingerprint, upper-case colon separated
    pub fingerprint: String,
    /// SHA-256 fingerprint, upper-case colon separated
    #[serde(default)]
    pub fingerprint256: String,
    /// DER encoding of the leaf certificate
    #[serde(with = "raw_base64", default)]
    pub raw_certificate: Vec<u8>,
    /// DNS names from the subjectAltName extension, peer order
    #[serde(default)]
    pub subject_alt_names: Vec<String>,
    /// Subject attributes
    #[serde(default)]
    pub subject: BTreeMap<String, String>,
}

impl CertificateRecord {
    /// Build the record stored for a host whose probe failed
    ///
    /// The record carries `status = error` and the failure as detail, so callers
    /// always have something to display and persist.
    pub fn from_failure(err: &ProbeError) -> Self {
        Self {
            issuer: "Unknown".to_string(),
            valid_from: None,
            valid_to: None,
            status: CertificateStatus::Error,
            status_detail: Some(err.to_string()),
            serial_number: "Unknown".to_string(),
            fingerprint: "Unknown".to_string(),
            fingerprint256: "Unknown".to_string(),
            raw_certificate: Vec::new(),
            subject_alt_names: Vec::new(),
            subject: BTreeMap::new(),
        }
    }

    /// Common name of the subject, if present
    pub fn common_name(&self) -> Option<&str> {
        self.subject.get("CN").map(String::as_str)
    }
}

/// Result of probing the transport layer of a host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TlsConfigInfo {
    /// Negotiated protocol version as reported by the TLS layer
    pub protocol_version: String,
    /// Negotiated cipher suite name as reported by the TLS layer
    pub cipher_suite_name: String,
    /// Whether the protocol version is acceptable
    pub is_secure: bool,
    /// Advisory minimum protocol version
    pub minimum_recommended_protocol: String,
}

impl TlsConfigInfo {
    /// Build a report from the negotiated protocol and cipher
    pub fn new(protocol_version: impl Into<String>, cipher_suite_name: impl Into<String>) -> Self {
        let protocol_version = protocol_version.into();
        let is_secure = !INSECURE_PROTOCOLS.contains(&protocol_version.as_str());

        Self {
            protocol_version,
            cipher_suite_name: cipher_suite_name.into(),
            is_secure,
            minimum_recommended_protocol: MINIMUM_RECOMMENDED_PROTOCOL.to_string(),
        }
    }
}

/// Base64 (de)serialization of raw certificate bytes
mod raw_base64 {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if bytes.is_empty() {
            return serializer.serialize_str("");
        }
        serializer.serialize_str(&openssl::base64::encode_block(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        if encoded.is_empty() {
            return Ok(Vec::new());
        }
        openssl::base64::decode_block(&encoded).map_err(serde::de::Error::custom)
    }
}
