//! Registration check
//!
//! A host being added to the inventory is probed once. A failed probe still
//! yields a usable host record, with `status = error` and the failure as
//! detail, so the host can be stored and shown instead of being rejected.

use chrono::Utc;
use log::{info, warn};

use crate::tls::CertificateProber;
use super::host::MonitoredHost;

/// Probe `url` once and build the host record to register
pub async fn check_new_host<P>(prober: &P, url: &str) -> MonitoredHost
where
    P: CertificateProber + ?Sized,
{
    let checked_at = Utc::now();
    let host = MonitoredHost::new(url);

    match prober.probe(url).await {
        Ok(record) => {
            info!("Registered {} with status {}", url, record.status);
            host.refreshed(&record, checked_at)
        }
        Err(e) => {
            warn!("Registered {} with a failed probe: {}", url, e);
            host.failed(&e, checked_at)
        }
    }
}
