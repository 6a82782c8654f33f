//! Monitored hosts and their presentation state
//!
//! A `MonitoredHost` is owned by the inventory. The monitor reads it and
//! hands back refreshed copies; it never creates or deletes hosts.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::common::{CertificateRecord, CertificateStatus};
use crate::tls::ProbeError;

/// A host registered for monitoring, with its last known certificate state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoredHost {
    /// Host or URL as registered
    pub url: String,
    /// Issuer of the last seen certificate
    #[serde(default)]
    pub issuer: Option<String>,
    /// Start of the last seen validity window
    #[serde(default)]
    pub valid_from: Option<DateTime<Utc>>,
    /// End of the last seen validity window
    #[serde(default)]
    pub valid_to: Option<DateTime<Utc>>,
    /// Stored status; `None` until the first check
    #[serde(default)]
    pub status: Option<CertificateStatus>,
    /// Detail accompanying the stored status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_detail: Option<String>,
    /// When the host was last checked
    #[serde(default)]
    pub last_checked: Option<DateTime<Utc>>,
}

/// How a host is presented to users
///
/// `ExpiringSoon` is derived at read time from `valid_to` and is never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayState {
    Unknown,
    Valid,
    ExpiringSoon,
    Expired,
    Error,
}

impl MonitoredHost {
    /// A host that has never been checked
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            issuer: None,
            valid_from: None,
            valid_to: None,
            status: None,
            status_detail: None,
            last_checked: None,
        }
    }

    /// Copy of this host carrying the fields of a fresh probe
    pub fn refreshed(&self, record: &CertificateRecord, checked_at: DateTime<Utc>) -> Self {
        Self {
            url: self.url.clone(),
            issuer: Some(record.issuer.clone()),
            valid_from: record.valid_from,
            valid_to: record.valid_to,
            status: Some(record.status),
            status_detail: record.status_detail.clone(),
            last_checked: Some(checked_at),
        }
    }

    /// Copy of this host after a failed probe
    ///
    /// The previous validity window is kept as history; nothing new was read
    /// from the peer.
    pub fn failed(&self, err: &ProbeError, checked_at: DateTime<Utc>) -> Self {
        Self {
            status: Some(CertificateStatus::Error),
            status_detail: Some(err.to_string()),
            last_checked: Some(checked_at),
            ..self.clone()
        }
    }

    /// Whether the stored certificate expires within `window` of `now`
    pub fn is_expiring_soon(&self, now: DateTime<Utc>, window: Duration) -> bool {
        self.valid_to
            .map(|valid_to| is_expiring_soon(valid_to, now, window))
            .unwrap_or(false)
    }

    /// Presentation state at `now`
    ///
    /// Expired and error states win over expiring-soon. A stored `valid`
    /// whose window has since closed is shown as expired.
    pub fn display_state(&self, now: DateTime<Utc>, window: Duration) -> DisplayState {
        match self.status {
            None => DisplayState::Unknown,
            Some(CertificateStatus::Expired) => DisplayState::Expired,
            Some(status) if status.is_error_class() => DisplayState::Error,
            Some(_) => match self.valid_to {
                Some(valid_to) if now > valid_to => DisplayState::Expired,
                Some(valid_to) if is_expiring_soon(valid_to, now, window) => DisplayState::ExpiringSoon,
                _ => DisplayState::Valid,
            },
        }
    }

    /// Pair this host with its presentation state at `now`
    pub fn present(&self, now: DateTime<Utc>, window: Duration) -> PresentedHost {
        PresentedHost {
            host: self.clone(),
            display: self.display_state(now, window),
        }
    }
}

/// A host together with its presentation state at one moment
///
/// Only for output. The display state is never stored with the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresentedHost {
    #[serde(flatten)]
    pub host: MonitoredHost,
    pub display: DisplayState,
}

/// Whether a certificate ending at `valid_to` is still valid but ends within `window`
///
/// An already expired certificate is not "expiring".
pub fn is_expiring_soon(valid_to: DateTime<Utc>, now: DateTime<Utc>, window: Duration) -> bool {
    let remaining = valid_to - now;
    remaining > Duration::zero() && remaining <= window
}
