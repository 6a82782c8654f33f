//! Monitoring cycle tests with in-memory collaborators

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use futures::future::BoxFuture;
use tls_cert_monitor::common::{CertificateRecord, MonitorError, Result};
use tls_cert_monitor::config::MonitorConfig;
use tls_cert_monitor::monitor::{
    run_cycle, AlertDelivery, CycleOptions, DisplayState, HostOutcome, Inventory, MemoryInventory,
    Monitor, MonitoredHost, Notification, NotificationSink, Severity,
};
use tls_cert_monitor::tls::{CertificateProber, ProbeError, ProbeOutcome};
use tls_cert_monitor::CertificateStatus;

/// Prober answering from a table that tests can change between cycles
#[derive(Default)]
struct TableProber {
    outcomes: Mutex<HashMap<String, ProbeOutcome>>,
}

impl TableProber {
    fn set(&self, host: &str, outcome: ProbeOutcome) {
        self.outcomes.lock().unwrap().insert(host.to_string(), outcome);
    }
}

impl CertificateProber for TableProber {
    fn probe<'a>(&'a self, host: &'a str) -> BoxFuture<'a, ProbeOutcome> {
        let outcome = self.outcomes.lock().unwrap().get(host).cloned().unwrap_or_else(|| {
            Err(ProbeError::Connect {
                host: host.to_string(),
                reason: "no route".to_string(),
            })
        });
        Box::pin(async move { outcome })
    }
}

#[derive(Default)]
struct RecordingSink {
    received: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    fn received(&self) -> Vec<Notification> {
        self.received.lock().unwrap().clone()
    }
}

impl NotificationSink for RecordingSink {
    fn notify<'a>(&'a self, notification: &'a Notification) -> BoxFuture<'a, Result<()>> {
        self.received.lock().unwrap().push(notification.clone());
        Box::pin(async { Ok(()) })
    }
}

struct FailingSink;

impl NotificationSink for FailingSink {
    fn notify<'a>(&'a self, _notification: &'a Notification) -> BoxFuture<'a, Result<()>> {
        Box::pin(async { Err(MonitorError::Notification("smtp unavailable".to_string())) })
    }
}

/// Inventory that lists hosts but refuses every write
struct ReadOnlyInventory(Vec<MonitoredHost>);

impl Inventory for ReadOnlyInventory {
    fn list_hosts(&self) -> BoxFuture<'_, Result<Vec<MonitoredHost>>> {
        Box::pin(async move { Ok(self.0.clone()) })
    }

    fn update_host<'a>(&'a self, host: &'a MonitoredHost) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move { Err(MonitorError::Inventory(format!("read only: {}", host.url))) })
    }
}

fn record(status: CertificateStatus, days_left: i64) -> CertificateRecord {
    let now = Utc::now();
    let mut record = CertificateRecord::from_failure(&ProbeError::NoCertificate {
        host: "unused".to_string(),
    });
    record.issuer = "C=US, CN=Test CA".to_string();
    record.valid_from = Some(now - chrono::Duration::days(365));
    record.valid_to = Some(now + chrono::Duration::days(days_left));
    record.status = status;
    record.status_detail = match status {
        CertificateStatus::Expired => Some("Certificate has expired".to_string()),
        _ => None,
    };
    record
}

fn stored(url: &str, status: CertificateStatus) -> MonitoredHost {
    let mut host = MonitoredHost::new(url);
    host.status = Some(status);
    host
}

#[tokio::test]
async fn test_transition_to_expired_alerts_once() {
    let prober = TableProber::default();
    prober.set("a.test", Ok(record(CertificateStatus::Expired, -1)));
    let sink = RecordingSink::default();

    let hosts = vec![stored("a.test", CertificateStatus::Valid)];
    let entries = run_cycle(&prober, &sink, &hosts, &CycleOptions::default()).await;

    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry.previous_status, Some(CertificateStatus::Valid));
    assert_eq!(entry.status, CertificateStatus::Expired);
    assert!(entry.status_changed());
    assert_eq!(entry.alert, AlertDelivery::Delivered);
    assert_eq!(entry.host.status, Some(CertificateStatus::Expired));
    assert!(entry.host.last_checked.is_some());

    let received = sink.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].severity, Severity::Expired);
    assert_eq!(received[0].title, "SSL Certificate Issue for a.test");
    assert_eq!(received[0].message, "Certificate has expired");
}

#[tokio::test]
async fn test_valid_host_raises_no_alert() {
    let prober = TableProber::default();
    prober.set("ok.test", Ok(record(CertificateStatus::Valid, 200)));
    let sink = RecordingSink::default();

    let hosts = vec![stored("ok.test", CertificateStatus::Valid)];
    let entries = run_cycle(&prober, &sink, &hosts, &CycleOptions::default()).await;

    assert!(!entries[0].status_changed());
    assert_eq!(entries[0].alert, AlertDelivery::NotNeeded);
    assert!(sink.received().is_empty());
}

#[tokio::test]
async fn test_expiring_soon_is_shown_not_stored() {
    let prober = Arc::new(TableProber::default());
    prober.set("soon.test", Ok(record(CertificateStatus::Valid, 10)));
    prober.set("later.test", Ok(record(CertificateStatus::Valid, 90)));
    let inventory = Arc::new(MemoryInventory::new(vec![
        stored("soon.test", CertificateStatus::Valid),
        stored("later.test", CertificateStatus::Valid),
    ]));
    let monitor = Monitor::new(
        prober,
        inventory.clone(),
        Arc::new(RecordingSink::default()),
        Arc::new(MonitorConfig::default()),
    );

    let report = monitor.refresh_all().await.unwrap();
    assert_eq!(report.entries[0].display, DisplayState::ExpiringSoon);
    assert_eq!(report.entries[0].host.status, Some(CertificateStatus::Valid));
    assert_eq!(report.entries[1].display, DisplayState::Valid);

    let json = serde_json::to_value(&report.entries[0]).unwrap();
    assert_eq!(json["display"], "expiring-soon");
    assert_eq!(json["status"], "valid");

    // The stored host keeps its status and carries no display state
    let stored_hosts = inventory.snapshot().await;
    assert_eq!(stored_hosts[0].status, Some(CertificateStatus::Valid));
    let json = serde_json::to_value(&stored_hosts[0]).unwrap();
    assert!(json.get("display").is_none());
    assert_eq!(json["status"], "valid");
}

#[tokio::test]
async fn test_present_new_host() {
    let prober = Arc::new(TableProber::default());
    prober.set("new.test", Ok(record(CertificateStatus::Valid, 10)));
    let monitor = Monitor::new(
        prober,
        Arc::new(MemoryInventory::default()),
        Arc::new(RecordingSink::default()),
        Arc::new(MonitorConfig::default()),
    );

    let presented = monitor.present_new_host("new.test").await;
    assert_eq!(presented.display, DisplayState::ExpiringSoon);
    assert_eq!(presented.host.status, Some(CertificateStatus::Valid));

    let presented = monitor.present_new_host("missing.test").await;
    assert_eq!(presented.display, DisplayState::Error);
}

#[tokio::test]
async fn test_probe_failure_is_isolated() {
    let prober = TableProber::default();
    prober.set("a.test", Ok(record(CertificateStatus::Valid, 100)));
    prober.set("c.test", Ok(record(CertificateStatus::Valid, 100)));
    let sink = RecordingSink::default();

    let mut previous = stored("b.test", CertificateStatus::Valid);
    previous.valid_to = Some(Utc::now() + chrono::Duration::days(50));
    let hosts = vec![
        stored("a.test", CertificateStatus::Valid),
        previous.clone(),
        stored("c.test", CertificateStatus::Valid),
    ];

    let entries = run_cycle(&prober, &sink, &hosts, &CycleOptions::default()).await;

    let urls: Vec<&str> = entries.iter().map(|e| e.url.as_str()).collect();
    assert_eq!(urls, vec!["a.test", "b.test", "c.test"]);

    assert!(matches!(entries[0].outcome, HostOutcome::Refreshed { .. }));
    assert!(matches!(entries[2].outcome, HostOutcome::Refreshed { .. }));

    let failed = &entries[1];
    assert!(matches!(failed.outcome, HostOutcome::Failed { .. }));
    assert_eq!(failed.status, CertificateStatus::Error);
    assert_eq!(failed.host.status, Some(CertificateStatus::Error));
    assert!(failed.host.status_detail.as_deref().unwrap().contains("no route"));
    // Dates from the last successful probe are kept
    assert_eq!(failed.host.valid_to, previous.valid_to);

    // Probe failures do not alert unless asked to
    assert_eq!(failed.alert, AlertDelivery::NotNeeded);
    assert!(sink.received().is_empty());
}

#[tokio::test]
async fn test_probe_failure_alerts_when_enabled() {
    let prober = TableProber::default();
    let sink = RecordingSink::default();
    let options = CycleOptions {
        concurrency: 2,
        notify_on_probe_failure: true,
        ..CycleOptions::default()
    };

    let hosts = vec![MonitoredHost::new("down.test")];
    let entries = run_cycle(&prober, &sink, &hosts, &options).await;

    assert_eq!(entries[0].alert, AlertDelivery::Delivered);
    let received = sink.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].severity, Severity::Error);
    assert!(received[0].message.contains("down.test"));
}

#[tokio::test]
async fn test_failing_sink_does_not_stop_cycle() {
    let prober = TableProber::default();
    prober.set("a.test", Ok(record(CertificateStatus::Expired, -3)));
    prober.set("b.test", Ok(record(CertificateStatus::NotYetValid, 30)));
    prober.set("c.test", Ok(record(CertificateStatus::Valid, 30)));

    let hosts = vec![
        MonitoredHost::new("a.test"),
        MonitoredHost::new("b.test"),
        MonitoredHost::new("c.test"),
    ];
    let entries = run_cycle(&prober, &FailingSink, &hosts, &CycleOptions::default()).await;

    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].alert, AlertDelivery::Failed);
    assert_eq!(entries[1].alert, AlertDelivery::Failed);
    assert_eq!(entries[2].alert, AlertDelivery::NotNeeded);
    assert_eq!(entries[2].host.status, Some(CertificateStatus::Valid));
}

#[tokio::test]
async fn test_refresh_all_writes_back() {
    let prober = Arc::new(TableProber::default());
    prober.set("a.test", Ok(record(CertificateStatus::Valid, 10)));
    prober.set("b.test", Ok(record(CertificateStatus::Expired, -10)));
    let sink = Arc::new(RecordingSink::default());
    let inventory = Arc::new(MemoryInventory::new(vec![
        MonitoredHost::new("a.test"),
        stored("b.test", CertificateStatus::Valid),
    ]));

    let monitor = Monitor::new(
        prober.clone(),
        inventory.clone(),
        sink.clone(),
        Arc::new(MonitorConfig::default()),
    );

    let report = monitor.refresh_all().await.unwrap();
    assert!(report.write_failures.is_empty());
    assert_eq!(report.entries.len(), 2);

    let stored_hosts = inventory.snapshot().await;
    assert_eq!(stored_hosts, report.hosts());
    assert_eq!(stored_hosts[0].status, Some(CertificateStatus::Valid));
    assert_eq!(stored_hosts[0].issuer.as_deref(), Some("C=US, CN=Test CA"));
    assert_eq!(stored_hosts[1].status, Some(CertificateStatus::Expired));

    // 10 days left is inside the default 30 day window
    let window = monitor.config().expiring_soon_window();
    assert!(stored_hosts[0].is_expiring_soon(Utc::now(), window));

    assert_eq!(sink.received().len(), 1);

    // A second cycle with an unchanged certificate alerts again for the expired host
    let report = monitor.refresh_all().await.unwrap();
    assert!(!report.entries[1].status_changed());
    assert_eq!(sink.received().len(), 2);
}

#[tokio::test]
async fn test_refresh_all_reports_write_failures() {
    let prober = Arc::new(TableProber::default());
    prober.set("a.test", Ok(record(CertificateStatus::Valid, 100)));
    let inventory = Arc::new(ReadOnlyInventory(vec![MonitoredHost::new("a.test")]));

    let monitor = Monitor::new(
        prober,
        inventory,
        Arc::new(RecordingSink::default()),
        Arc::new(MonitorConfig::default()),
    );

    let report = monitor.refresh_all().await.unwrap();
    assert_eq!(report.entries.len(), 1);
    assert_eq!(report.write_failures.len(), 1);
    assert_eq!(report.write_failures[0].0, "a.test");
}

#[tokio::test]
async fn test_check_new_host_keeps_failed_probe() {
    let prober = Arc::new(TableProber::default());
    prober.set("new.test", Ok(record(CertificateStatus::Valid, 60)));

    let monitor = Monitor::new(
        prober,
        Arc::new(MemoryInventory::default()),
        Arc::new(RecordingSink::default()),
        Arc::new(MonitorConfig::default()),
    );

    let host = monitor.check_new_host("new.test").await;
    assert_eq!(host.status, Some(CertificateStatus::Valid));
    assert!(host.valid_to.is_some());

    let host = monitor.check_new_host("missing.test").await;
    assert_eq!(host.url, "missing.test");
    assert_eq!(host.status, Some(CertificateStatus::Error));
    assert!(host.valid_to.is_none());
    assert!(host.last_checked.is_some());
}

#[tokio::test]
async fn test_cycle_concurrency_preserves_order() {
    struct SlowFirst;

    impl CertificateProber for SlowFirst {
        fn probe<'a>(&'a self, host: &'a str) -> BoxFuture<'a, ProbeOutcome> {
            Box::pin(async move {
                if host == "slow.test" {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                }
                Ok(record(CertificateStatus::Valid, 100))
            })
        }
    }

    let hosts = vec![MonitoredHost::new("slow.test"), MonitoredHost::new("fast.test")];
    let options = CycleOptions {
        concurrency: 4,
        notify_on_probe_failure: false,
        ..CycleOptions::default()
    };

    let entries = run_cycle(&SlowFirst, &RecordingSink::default(), &hosts, &options).await;
    assert_eq!(entries[0].url, "slow.test");
    assert_eq!(entries[1].url, "fast.test");
}
