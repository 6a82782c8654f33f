//! Network utility functions
//!
//! This module turns user-supplied host strings into connectable targets.

use std::fmt;
use std::net::IpAddr;

use http::Uri;

use crate::tls::ProbeError;

/// A host and port a probe connects to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProbeTarget {
    /// Host name or IP literal, without brackets
    pub host: String,
    /// TCP port
    pub port: u16,
}

impl ProbeTarget {
    /// Whether the host is an IP literal (no SNI is sent for those)
    pub fn is_ip(&self) -> bool {
        self.host.parse::<IpAddr>().is_ok()
    }
}

impl fmt::Display for ProbeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// Parse a probe target
///
/// Accepts a bare host (`example.com`, `example.com:8443`) or a URL
/// (`https://example.com/path?q=1`). Scheme, path and query are ignored; an
/// explicit port in the input wins over `default_port`.
///
/// # Arguments
///
/// * `input` - The host or URL string to parse
/// * `default_port` - Port used when the input carries none
///
/// # Returns
///
/// The parsed `ProbeTarget`, or `ProbeError::MalformedHost`
pub fn parse_target(input: &str, default_port: u16) -> Result<ProbeTarget, ProbeError> {
    let trimmed = input.trim();
    let malformed = |reason: &str| ProbeError::MalformedHost {
        input: input.to_string(),
        reason: reason.to_string(),
    };

    if trimmed.is_empty() {
        return Err(malformed("empty host"));
    }

    let full = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let uri: Uri = full
        .parse()
        .map_err(|e: http::uri::InvalidUri| malformed(&e.to_string()))?;

    let host = uri
        .host()
        .map(|h| h.trim_start_matches('[').trim_end_matches(']'))
        .filter(|h| !h.is_empty())
        .ok_or_else(|| malformed("no host component"))?;

    let port = match authority_port(uri.authority().map(|a| a.as_str()).unwrap_or("")) {
        None => default_port,
        Some(text) => match text.parse::<u16>() {
            Ok(0) => return Err(malformed("port 0 is not connectable")),
            Ok(port) => port,
            Err(_) => return Err(malformed("invalid port")),
        },
    };

    Ok(ProbeTarget {
        host: host.to_string(),
        port,
    })
}

/// Port text of an authority, if one is written
///
/// `Uri::port_u16` yields `None` for ports outside the u16 range, which
/// cannot be told apart from an absent port.
fn authority_port(authority: &str) -> Option<&str> {
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, rest)| rest);
    let after_host = host_port.rfind(']').map_or(host_port, |end| &host_port[end + 1..]);
    after_host
        .rsplit_once(':')
        .map(|(_, port)| port)
        .filter(|port| !port.is_empty())
}
