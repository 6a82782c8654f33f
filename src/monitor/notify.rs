//! Alert events and the notification sink seam
//!
//! Delivery (mail, chat webhooks) is done by sinks outside this crate.
//! Delivery is best effort: a failing sink never stops a monitoring cycle.

use futures::future::BoxFuture;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use crate::common::{CertificateStatus, Result};

/// Severity of an alert event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Valid,
    Expired,
    Error,
}

impl From<CertificateStatus> for Severity {
    fn from(status: CertificateStatus) -> Self {
        match status {
            CertificateStatus::Valid => Self::Valid,
            CertificateStatus::Expired => Self::Expired,
            CertificateStatus::NotYetValid | CertificateStatus::Error => Self::Error,
        }
    }
}

/// An alert event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub severity: Severity,
}

impl Notification {
    /// Alert for a host whose certificate needs attention
    pub fn certificate_issue(url: &str, status: CertificateStatus, detail: Option<&str>) -> Self {
        Self {
            title: format!("SSL Certificate Issue for {}", url),
            message: detail.unwrap_or("Certificate needs attention").to_string(),
            severity: status.into(),
        }
    }
}

/// Receiver of alert events
pub trait NotificationSink: Send + Sync {
    /// Deliver one event; an error means it was not delivered
    fn notify<'a>(&'a self, notification: &'a Notification) -> BoxFuture<'a, Result<()>>;
}

/// Sink that writes events to the log
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

impl NotificationSink for LogNotifier {
    fn notify<'a>(&'a self, notification: &'a Notification) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            match notification.severity {
                Severity::Expired => error!("{}: {}", notification.title, notification.message),
                Severity::Error => warn!("{}: {}", notification.title, notification.message),
                Severity::Valid => info!("{}: {}", notification.title, notification.message),
            }
            Ok(())
        })
    }
}
