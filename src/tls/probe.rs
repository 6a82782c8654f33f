//! TLS probes
//!
//! A probe opens one TLS client connection, reads what it needs from the
//! negotiated session and closes the connection again. Two probes exist:
//! the certificate probe and the transport configuration probe.

use std::pin::Pin;
use std::time::Duration;

use chrono::Utc;
use futures::future::BoxFuture;
use log::{debug, warn};
use openssl::ssl::{SslConnector, SslRef};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_openssl::SslStream;

use crate::common::{parse_target, CertificateRecord, ProbeTarget, Result, TlsConfigInfo};
use super::cert::certificate_record;
use super::connector::{build_probe_connector, probe_ssl};
use super::error::ProbeError;

/// Default TLS port
pub const DEFAULT_PORT: u16 = 443;

/// Default per-connection timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Upper bound on the close_notify exchange after a probe completed
const CLOSE_GRACE: Duration = Duration::from_millis(500);

/// Result of a certificate probe
pub type ProbeOutcome = std::result::Result<CertificateRecord, ProbeError>;

/// Something that can probe a host's certificate
///
/// This is the seam the batch orchestrator and the monitoring cycle work
/// against; [`TlsProber`] is the network implementation.
pub trait CertificateProber: Send + Sync {
    /// Probe the certificate of `host`
    fn probe<'a>(&'a self, host: &'a str) -> BoxFuture<'a, ProbeOutcome>;
}

/// Network certificate prober
///
/// Holds one connector shared by every probe it runs.
#[derive(Clone)]
pub struct TlsProber {
    connector: SslConnector,
    port: u16,
    timeout: Duration,
}

impl TlsProber {
    /// Create a prober using `port` for hosts without an explicit port
    pub fn new(port: u16, timeout: Duration) -> Result<Self> {
        Ok(Self {
            connector: build_probe_connector()?,
            port,
            timeout,
        })
    }

    /// Default port used for bare hosts
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Per-connection timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Probe the certificate of `host`
    pub async fn probe_certificate(&self, host: &str) -> ProbeOutcome {
        let outcome = run_probe(&self.connector, host, self.port, self.timeout, read_certificate).await;
        match &outcome {
            Ok(record) => debug!("Probed {}: status={}", host, record.status),
            Err(e) => debug!("Probe of {} failed: {}", host, e),
        }
        outcome
    }

    /// Probe the negotiated protocol version and cipher of `host`
    pub async fn probe_transport_config(&self, host: &str) -> std::result::Result<TlsConfigInfo, ProbeError> {
        let info = run_probe(&self.connector, host, self.port, self.timeout, read_transport_config).await?;
        if !info.is_secure {
            warn!(
                "{} negotiated {} (minimum recommended: {})",
                host, info.protocol_version, info.minimum_recommended_protocol
            );
        }
        Ok(info)
    }
}

impl CertificateProber for TlsProber {
    fn probe<'a>(&'a self, host: &'a str) -> BoxFuture<'a, ProbeOutcome> {
        Box::pin(self.probe_certificate(host))
    }
}

/// Probe the certificate of a single host
///
/// `host` may be a bare host name, `host:port`, or an `https://` URL. Every
/// failure is returned as a [`ProbeError`]; the connection is closed before
/// this function returns.
///
/// # Example
///
/// ```no_run
/// # use tls_cert_monitor::tls::{probe_certificate, DEFAULT_PORT, DEFAULT_TIMEOUT};
/// # #[tokio::main]
/// # async fn main() {
/// match probe_certificate("https://example.com/", DEFAULT_PORT, DEFAULT_TIMEOUT).await {
///     Ok(record) => println!("{} expires {:?}", record.status, record.valid_to),
///     Err(e) => println!("probe failed: {}", e),
/// }
/// # }
/// ```
pub async fn probe_certificate(host: &str, port: u16, timeout: Duration) -> ProbeOutcome {
    let connector = build_probe_connector().map_err(|e| ProbeError::Handshake {
        host: host.to_string(),
        reason: e.to_string(),
    })?;
    run_probe(&connector, host, port, timeout, read_certificate).await
}

/// Probe the transport configuration of a single host
///
/// Fails with the same error taxonomy as [`probe_certificate`].
pub async fn probe_transport_config(
    host: &str,
    port: u16,
    timeout: Duration,
) -> std::result::Result<TlsConfigInfo, ProbeError> {
    let connector = build_probe_connector().map_err(|e| ProbeError::Handshake {
        host: host.to_string(),
        reason: e.to_string(),
    })?;
    run_probe(&connector, host, port, timeout, read_transport_config).await
}

/// Connect, inspect the session, close
///
/// Connection establishment and handshake run under `deadline`. Dropping the
/// timed-out future drops the socket, which closes it. The inspection is
/// synchronous, so the result is decided exactly once.
async fn run_probe<T, F>(
    connector: &SslConnector,
    input: &str,
    port: u16,
    deadline: Duration,
    inspect: F,
) -> std::result::Result<T, ProbeError>
where
    F: FnOnce(&SslRef, &str) -> std::result::Result<T, ProbeError>,
{
    let target = parse_target(input, port)?;

    let mut stream = match timeout(deadline, open_session(connector, &target)).await {
        Ok(session) => session?,
        Err(_) => {
            return Err(ProbeError::Timeout {
                host: target.host,
                timeout_ms: deadline.as_millis() as u64,
            })
        }
    };

    let result = inspect(stream.ssl(), &target.host);

    // Best effort close_notify; the socket is closed on drop either way
    if let Err(e) = timeout(CLOSE_GRACE, stream.shutdown()).await.unwrap_or(Ok(())) {
        debug!("TLS shutdown with {} failed: {}", target, e);
    }
    drop(stream);

    result
}

/// Establish TCP and complete the TLS handshake
async fn open_session(
    connector: &SslConnector,
    target: &ProbeTarget,
) -> std::result::Result<SslStream<TcpStream>, ProbeError> {
    let handshake_error = |reason: String| ProbeError::Handshake {
        host: target.host.clone(),
        reason,
    };

    let tcp = TcpStream::connect((target.host.as_str(), target.port))
        .await
        .map_err(|e| ProbeError::Connect {
            host: target.host.clone(),
            reason: e.to_string(),
        })?;

    debug!("TCP connection to {} established", target);

    let ssl = probe_ssl(connector, target).map_err(|e| handshake_error(e.to_string()))?;
    let mut stream = SslStream::new(ssl, tcp).map_err(|e| handshake_error(e.to_string()))?;

    Pin::new(&mut stream)
        .connect()
        .await
        .map_err(|e| handshake_error(e.to_string()))?;

    debug!("TLS handshake with {} completed ({})", target, stream.ssl().version_str());

    Ok(stream)
}

fn read_certificate(ssl: &SslRef, host: &str) -> ProbeOutcome {
    let cert = ssl.peer_certificate().ok_or_else(|| ProbeError::NoCertificate {
        host: host.to_string(),
    })?;

    certificate_record(&cert, Utc::now()).map_err(|e| ProbeError::Handshake {
        host: host.to_string(),
        reason: format!("unreadable peer certificate: {}", e),
    })
}

fn read_transport_config(ssl: &SslRef, _host: &str) -> std::result::Result<TlsConfigInfo, ProbeError> {
    let protocol = ssl.version_str();
    let cipher = ssl.current_cipher().map(|c| c.name()).unwrap_or("unknown");

    Ok(TlsConfigInfo::new(protocol, cipher))
}
