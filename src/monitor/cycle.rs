//! Monitoring cycle
//!
//! One pass over the monitored hosts: re-probe each one, reconcile the new
//! status with the stored one, raise alerts, and hand back refreshed hosts
//! for the inventory to store. Hosts are isolated from each other; a failing
//! host or a failing notification sink never stops the pass.

use std::sync::Arc;

use chrono::{Duration, Utc};
use futures::stream::{self, StreamExt};
use log::{info, warn};
use serde::Serialize;

use crate::common::{CertificateRecord, CertificateStatus, Result};
use crate::config::{defaults, MonitorConfig};
use crate::tls::{CertificateProber, ProbeError, TlsProber};
use super::batch::{probe_many, BatchOptions, BatchReport};
use super::host::{DisplayState, MonitoredHost, PresentedHost};
use super::inventory::Inventory;
use super::notify::{Notification, NotificationSink};
use super::register::check_new_host;

/// Options of a monitoring cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleOptions {
    /// Hosts probed at the same time
    pub concurrency: usize,
    /// Alert on probe failures too, not only on error statuses read from a certificate
    pub notify_on_probe_failure: bool,
    /// Window for the expiring-soon display state
    pub expiring_soon_window: Duration,
}

impl Default for CycleOptions {
    fn default() -> Self {
        Self {
            concurrency: 1,
            notify_on_probe_failure: false,
            expiring_soon_window: Duration::days(defaults::expiring_soon_window_days()),
        }
    }
}

impl From<&MonitorConfig> for CycleOptions {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            concurrency: config.cycle_concurrency,
            notify_on_probe_failure: config.notify_on_probe_failure,
            expiring_soon_window: config.expiring_soon_window(),
        }
    }
}

/// What the probe of one host produced
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum HostOutcome {
    /// A certificate was read
    Refreshed { record: CertificateRecord },
    /// The probe failed
    Failed { error: ProbeError },
}

/// Alert handling for one host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertDelivery {
    /// No alert was due
    NotNeeded,
    /// An alert was emitted and the sink accepted it
    Delivered,
    /// An alert was emitted but the sink failed
    Failed,
}

impl AlertDelivery {
    /// Whether an alert event was emitted
    pub fn emitted(&self) -> bool {
        !matches!(self, Self::NotNeeded)
    }
}

/// Result of one host in a cycle
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleEntry {
    /// Host identity
    pub url: String,
    /// Status stored before this cycle
    pub previous_status: Option<CertificateStatus>,
    /// Status after this cycle
    pub status: CertificateStatus,
    /// Probe result
    pub outcome: HostOutcome,
    /// Refreshed host, ready to be written back
    pub host: MonitoredHost,
    /// Presentation state at check time; not part of the stored host
    pub display: DisplayState,
    /// Alert handling
    pub alert: AlertDelivery,
}

impl CycleEntry {
    /// Whether the status differs from the stored one
    pub fn status_changed(&self) -> bool {
        self.previous_status != Some(self.status)
    }
}

/// Run one monitoring cycle over `hosts`
///
/// Returns one entry per input host, in input order. Performs no storage I/O.
pub async fn run_cycle<P, N>(
    prober: &P,
    notifier: &N,
    hosts: &[MonitoredHost],
    options: &CycleOptions,
) -> Vec<CycleEntry>
where
    P: CertificateProber + ?Sized,
    N: NotificationSink + ?Sized,
{
    let entries: Vec<CycleEntry> = stream::iter(hosts)
        .map(|host| check_host(prober, notifier, host, options))
        .buffered(options.concurrency.max(1))
        .collect()
        .await;

    let failed = entries
        .iter()
        .filter(|entry| matches!(entry.outcome, HostOutcome::Failed { .. }))
        .count();
    let alerts = entries.iter().filter(|entry| entry.alert.emitted()).count();
    info!(
        "Monitoring cycle finished: {} hosts, {} probe failures, {} alerts",
        entries.len(),
        failed,
        alerts
    );

    entries
}

async fn check_host<P, N>(
    prober: &P,
    notifier: &N,
    host: &MonitoredHost,
    options: &CycleOptions,
) -> CycleEntry
where
    P: CertificateProber + ?Sized,
    N: NotificationSink + ?Sized,
{
    let checked_at = Utc::now();

    match prober.probe(&host.url).await {
        Ok(record) => {
            let refreshed = host.refreshed(&record, checked_at);
            if host.status != Some(record.status) {
                info!(
                    "{}: status {} -> {}",
                    host.url,
                    host.status.map(|s| s.to_string()).unwrap_or_else(|| "unknown".to_string()),
                    record.status
                );
            }

            let alert = if record.status.needs_attention() {
                let notification = Notification::certificate_issue(
                    &host.url,
                    record.status,
                    record.status_detail.as_deref(),
                );
                deliver(notifier, &notification).await
            } else {
                AlertDelivery::NotNeeded
            };

            CycleEntry {
                url: host.url.clone(),
                previous_status: host.status,
                status: record.status,
                outcome: HostOutcome::Refreshed { record },
                display: refreshed.display_state(checked_at, options.expiring_soon_window),
                host: refreshed,
                alert,
            }
        }
        Err(error) => {
            warn!("Error checking {}: {}", host.url, error);
            let refreshed = host.failed(&error, checked_at);

            let alert = if options.notify_on_probe_failure {
                let detail = error.to_string();
                let notification =
                    Notification::certificate_issue(&host.url, CertificateStatus::Error, Some(&detail));
                deliver(notifier, &notification).await
            } else {
                AlertDelivery::NotNeeded
            };

            CycleEntry {
                url: host.url.clone(),
                previous_status: host.status,
                status: CertificateStatus::Error,
                outcome: HostOutcome::Failed { error },
                display: refreshed.display_state(checked_at, options.expiring_soon_window),
                host: refreshed,
                alert,
            }
        }
    }
}

async fn deliver<N>(notifier: &N, notification: &Notification) -> AlertDelivery
where
    N: NotificationSink + ?Sized,
{
    match notifier.notify(notification).await {
        Ok(()) => AlertDelivery::Delivered,
        Err(e) => {
            warn!("Failed to deliver notification '{}': {}", notification.title, e);
            AlertDelivery::Failed
        }
    }
}

/// Result of [`Monitor::refresh_all`]
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    /// One entry per listed host
    pub entries: Vec<CycleEntry>,
    /// Hosts whose write-back failed, with the error message
    pub write_failures: Vec<(String, String)>,
}

impl CycleReport {
    /// Refreshed hosts in cycle order
    pub fn hosts(&self) -> Vec<MonitoredHost> {
        self.entries.iter().map(|entry| entry.host.clone()).collect()
    }
}

/// Monitoring engine with its collaborators injected
///
/// The monitor owns no global state: the prober, the inventory and the
/// notification sink are handed in by the caller.
pub struct Monitor {
    prober: Arc<dyn CertificateProber>,
    inventory: Arc<dyn Inventory>,
    notifier: Arc<dyn NotificationSink>,
    config: Arc<MonitorConfig>,
}

impl Monitor {
    /// Create a monitor from explicit collaborators
    pub fn new(
        prober: Arc<dyn CertificateProber>,
        inventory: Arc<dyn Inventory>,
        notifier: Arc<dyn NotificationSink>,
        config: Arc<MonitorConfig>,
    ) -> Self {
        Self {
            prober,
            inventory,
            notifier,
            config,
        }
    }

    /// Create a monitor probing over the network with settings from `config`
    pub fn from_config(
        config: Arc<MonitorConfig>,
        inventory: Arc<dyn Inventory>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Result<Self> {
        let prober = TlsProber::new(config.port, config.timeout())?;
        Ok(Self::new(Arc::new(prober), inventory, notifier, config))
    }

    /// Active configuration
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Run one cycle over `hosts` without touching the inventory
    pub async fn run_cycle(&self, hosts: &[MonitoredHost]) -> Vec<CycleEntry> {
        let options = CycleOptions::from(self.config.as_ref());
        run_cycle(self.prober.as_ref(), self.notifier.as_ref(), hosts, &options).await
    }

    /// List the inventory, run a cycle and write every refreshed host back
    ///
    /// Fails only when the inventory cannot be listed. Write-back failures
    /// are collected in the report.
    pub async fn refresh_all(&self) -> Result<CycleReport> {
        let hosts = self.inventory.list_hosts().await?;
        info!("Refreshing {} monitored hosts", hosts.len());

        let entries = self.run_cycle(&hosts).await;

        let mut write_failures = Vec::new();
        for entry in &entries {
            if let Err(e) = self.inventory.update_host(&entry.host).await {
                warn!("Failed to store result for {}: {}", entry.url, e);
                write_failures.push((entry.url.clone(), e.to_string()));
            }
        }

        Ok(CycleReport {
            entries,
            write_failures,
        })
    }

    /// Probe many hosts with the configured batch options
    pub async fn probe_many<S: AsRef<str>>(&self, hosts: &[S]) -> BatchReport {
        let options = BatchOptions::from(self.config.as_ref());
        probe_many(self.prober.as_ref(), hosts, &options).await
    }

    /// Check a host that is about to be registered
    pub async fn check_new_host(&self, url: &str) -> MonitoredHost {
        check_new_host(self.prober.as_ref(), url).await
    }

    /// Check a host about to be registered, with its presentation state
    pub async fn present_new_host(&self, url: &str) -> PresentedHost {
        let host = self.check_new_host(url).await;
        host.present(Utc::now(), self.config.expiring_soon_window())
    }
}
