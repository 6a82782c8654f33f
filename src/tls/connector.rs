//! TLS connector used by probes

use log::debug;
use openssl::ssl::{Ssl, SslConnector, SslMethod, SslVerifyMode};

use crate::common::{ProbeTarget, Result};

/// Create the TLS connector used for probing
///
/// Certificate chain and hostname verification are switched off on purpose:
/// probes must be able to read self-signed, expired and mismatched
/// certificates in order to classify them. A connector built here must never
/// be used to make a trust decision; callers that need one have to validate
/// the returned certificate themselves.
///
/// The minimum protocol version is unset and the security level lowered to 0
/// so that servers still speaking TLSv1 or TLSv1.1, with their SHA-1
/// signatures and legacy ciphers, can be probed and reported as insecure.
///
/// # Example
///
/// ```no_run
/// # use tls_cert_monitor::tls::build_probe_connector;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let connector = build_probe_connector()?;
/// # Ok(())
/// # }
/// ```
pub fn build_probe_connector() -> Result<SslConnector> {
    let mut builder = SslConnector::builder(SslMethod::tls_client())?;

    builder.set_verify(SslVerifyMode::NONE);
    builder.set_min_proto_version(None)?;
    builder.set_security_level(0);
    builder.set_cipher_list("ALL:@SECLEVEL=0")?;

    debug!("Probe connector created (peer verification disabled)");

    Ok(builder.build())
}

/// Create the per-connection SSL state for `target`
///
/// SNI is sent for DNS names only; IP literals are skipped by OpenSSL's
/// connector configuration.
pub fn probe_ssl(connector: &SslConnector, target: &ProbeTarget) -> Result<Ssl> {
    let mut config = connector.configure()?;
    config.set_verify_hostname(false);
    config.set_use_server_name_indication(!target.is_ip());

    Ok(config.into_ssl(&target.host)?)
}
