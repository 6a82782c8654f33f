//! Batch orchestrator
//!
//! Probes a list of hosts in consecutive groups. Hosts inside a group run
//! concurrently; the next group starts only once every probe of the
//! current group, retries included, has settled. Peak concurrency is
//! therefore bounded by the group size.

use std::collections::HashMap;
use std::time::Duration;

use futures::future::join_all;
use log::{debug, info, warn};
use serde::Serialize;

use crate::common::CertificateRecord;
use crate::config::{BackoffKind, MonitorConfig};
use crate::tls::{CertificateProber, ProbeError, ProbeOutcome};

/// Delay growth between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backoff {
    /// Same delay before every retry
    #[default]
    Fixed,
    /// Delay doubles after every attempt, capped at `max_delay`
    Exponential { max_delay: Duration },
}

/// Bounded retry policy for a single host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included
    pub max_attempts: u32,
    /// Base delay between attempts
    pub delay: Duration,
    /// Delay growth
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(1000),
            backoff: Backoff::Fixed,
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after the failed attempt number `attempt` (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.delay,
            Backoff::Exponential { max_delay } => {
                let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
                self.delay.saturating_mul(factor).min(max_delay)
            }
        }
    }
}

/// Options of a batch run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOptions {
    /// Hosts probed concurrently per group
    pub batch_size: usize,
    /// Per-host retry policy
    pub retry: RetryPolicy,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            batch_size: 10,
            retry: RetryPolicy::default(),
        }
    }
}

impl From<&MonitorConfig> for BatchOptions {
    fn from(config: &MonitorConfig) -> Self {
        let backoff = match config.backoff {
            BackoffKind::Fixed => Backoff::Fixed,
            BackoffKind::Exponential => Backoff::Exponential {
                max_delay: config.max_retry_delay(),
            },
        };

        Self {
            batch_size: config.batch_size,
            retry: RetryPolicy {
                max_attempts: config.max_retries,
                delay: config.retry_delay(),
                backoff,
            },
        }
    }
}

/// Per-host results of a batch run
///
/// Every input host ends up in exactly one of the two maps.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    /// Hosts whose probe eventually succeeded
    pub succeeded: HashMap<String, CertificateRecord>,
    /// Hosts still failing after all attempts, with the last error
    pub failed: HashMap<String, ProbeError>,
}

impl BatchReport {
    /// Number of hosts in the report
    pub fn len(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// Whether the report is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether every host succeeded
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// The successful records keyed by host
    pub fn into_records(self) -> HashMap<String, CertificateRecord> {
        self.succeeded
    }

    fn record(&mut self, host: String, outcome: ProbeOutcome) {
        match outcome {
            Ok(record) => {
                self.failed.remove(&host);
                self.succeeded.insert(host, record);
            }
            Err(e) => {
                self.succeeded.remove(&host);
                self.failed.insert(host, e);
            }
        }
    }
}

/// Probe one host, retrying according to `policy`
///
/// Malformed hosts are not retried.
pub async fn probe_with_retry<P>(prober: &P, host: &str, policy: &RetryPolicy) -> ProbeOutcome
where
    P: CertificateProber + ?Sized,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match prober.probe(host).await {
            Ok(record) => {
                if attempt > 1 {
                    debug!("Probe of {} succeeded on attempt {}", host, attempt);
                }
                return Ok(record);
            }
            Err(e) if attempt >= max_attempts || !e.is_retryable() => {
                warn!("Giving up on {} after {} attempt(s): {}", host, attempt, e);
                return Err(e);
            }
            Err(e) => {
                let delay = policy.delay_after(attempt);
                warn!(
                    "Attempt {}/{} for {} failed: {}; retrying in {:?}",
                    attempt, max_attempts, host, e, delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// Probe many hosts
///
/// Never aborts: a host that exhausts its attempts is reported in
/// [`BatchReport::failed`] while the other hosts carry on. No state is kept
/// between calls.
pub async fn probe_many<P, S>(prober: &P, hosts: &[S], options: &BatchOptions) -> BatchReport
where
    P: CertificateProber + ?Sized,
    S: AsRef<str>,
{
    let batch_size = options.batch_size.max(1);
    let mut report = BatchReport::default();

    for (index, group) in hosts.chunks(batch_size).enumerate() {
        debug!("Probing group {} ({} hosts)", index + 1, group.len());

        let outcomes = join_all(group.iter().map(|host| async move {
            let host = host.as_ref();
            (host.to_string(), probe_with_retry(prober, host, &options.retry).await)
        }))
        .await;

        for (host, outcome) in outcomes {
            report.record(host, outcome);
        }
    }

    info!(
        "Batch finished: {} succeeded, {} failed",
        report.succeeded.len(),
        report.failed.len()
    );

    report
}
