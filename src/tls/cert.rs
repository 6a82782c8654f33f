//! Certificate handling module
//!
//! This module converts a peer's X.509 leaf certificate into a
//! [`CertificateRecord`]: distinguished names, validity window, serial,
//! fingerprints and subject alternative names.

use std::collections::BTreeMap;
use std::net::{Ipv4Addr, Ipv6Addr};

use chrono::{DateTime, Utc};
use log::debug;
use openssl::asn1::{Asn1Time, Asn1TimeRef};
use openssl::hash::MessageDigest;
use openssl::x509::{X509NameRef, X509Ref};

use crate::common::{CertificateRecord, CertificateStatus, MonitorError, Result};

/// Build a certificate record from a peer certificate
///
/// The validity window is classified against `now`.
///
/// # Errors
///
/// Returns an error if OpenSSL fails to encode or digest the certificate, or
/// if a validity bound cannot be represented as a timestamp.
pub fn certificate_record(cert: &X509Ref, now: DateTime<Utc>) -> Result<CertificateRecord> {
    let valid_from = asn1_to_datetime(cert.not_before())?;
    let valid_to = asn1_to_datetime(cert.not_after())?;
    let (status, status_detail) = CertificateStatus::classify(now, valid_from, valid_to);

    let subject_alt_names = render_subject_alt_names(cert)
        .map(|text| parse_subject_alt_names(&text))
        .unwrap_or_default();

    let serial_number = cert
        .serial_number()
        .to_bn()
        .and_then(|bn| bn.to_hex_str().map(|hex| hex.to_string()))
        .unwrap_or_else(|_| "Unknown".to_string());

    let record = CertificateRecord {
        issuer: format_distinguished_name(cert.issuer_name()),
        valid_from: Some(valid_from),
        valid_to: Some(valid_to),
        status,
        status_detail,
        serial_number,
        fingerprint: colon_hex(&cert.digest(MessageDigest::sha1())?),
        fingerprint256: colon_hex(&cert.digest(MessageDigest::sha256())?),
        raw_certificate: cert.to_der()?,
        subject_alt_names,
        subject: name_attributes(cert.subject_name()),
    };

    debug!(
        "Parsed certificate: issuer={}, valid_to={}, status={}",
        record.issuer, valid_to, record.status
    );

    Ok(record)
}

/// Attributes of a distinguished name in peer order
///
/// Attributes whose value cannot be decoded are dropped. Unknown attribute
/// types are keyed by their dotted OID.
fn name_entries(name: &X509NameRef) -> Vec<(String, String)> {
    name.entries()
        .filter_map(|entry| {
            let value = entry.data().as_utf8().ok()?.to_string();
            let key = entry
                .object()
                .nid()
                .short_name()
                .map(str::to_string)
                .unwrap_or_else(|_| entry.object().to_string());
            Some((key, value))
        })
        .collect()
}

/// Render a distinguished name as `key=value` pairs joined by `, `
///
/// Returns `"Unknown"` for an empty name.
pub fn format_distinguished_name(name: &X509NameRef) -> String {
    let formatted = join_attributes(&name_entries(name));
    if formatted.is_empty() {
        "Unknown".to_string()
    } else {
        formatted
    }
}

/// Join attribute pairs in order, skipping pairs without a value
pub fn join_attributes(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Subject attributes as a map
///
/// Repeated attributes (e.g. several `OU`) are joined with `,`.
fn name_attributes(name: &X509NameRef) -> BTreeMap<String, String> {
    let mut attributes: BTreeMap<String, String> = BTreeMap::new();
    for (key, value) in name_entries(name) {
        attributes
            .entry(key)
            .and_modify(|existing| {
                existing.push(',');
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    attributes
}

/// Render the subjectAltName extension in its textual form
///
/// Produces `DNS:a.com, DNS:b.com, IP Address:10.0.0.1`, or `None` when the
/// certificate has no such extension.
pub fn render_subject_alt_names(cert: &X509Ref) -> Option<String> {
    let names = cert.subject_alt_names()?;

    let rendered: Vec<String> = names
        .iter()
        .filter_map(|name| {
            if let Some(dns) = name.dnsname() {
                Some(format!("DNS:{}", dns))
            } else if let Some(ip) = name.ipaddress() {
                format_ip(ip).map(|ip| format!("IP Address:{}", ip))
            } else if let Some(email) = name.email() {
                Some(format!("email:{}", email))
            } else {
                name.uri().map(|uri| format!("URI:{}", uri))
            }
        })
        .collect();

    Some(rendered.join(", "))
}

fn format_ip(bytes: &[u8]) -> Option<String> {
    match bytes.len() {
        4 => {
            let octets: [u8; 4] = bytes.try_into().ok()?;
            Some(Ipv4Addr::from(octets).to_string())
        }
        16 => {
            let octets: [u8; 16] = bytes.try_into().ok()?;
            Some(Ipv6Addr::from(octets).to_string())
        }
        _ => None,
    }
}

/// Extract DNS names from a textual subjectAltName
///
/// Keeps `DNS:` entries only, strips the prefix, preserves order.
pub fn parse_subject_alt_names(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter_map(|entry| entry.strip_prefix("DNS:"))
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

/// Convert an ASN.1 time to a UTC timestamp
pub fn asn1_to_datetime(time: &Asn1TimeRef) -> Result<DateTime<Utc>> {
    let epoch = Asn1Time::from_unix(0)?;
    let diff = epoch.diff(time)?;
    datetime_from_epoch_offset(diff.days, diff.secs)
}

fn datetime_from_epoch_offset(days: i32, secs: i32) -> Result<DateTime<Utc>> {
    let total = i64::from(days) * 86_400 + i64::from(secs);

    DateTime::from_timestamp(total, 0).ok_or_else(|| {
        MonitorError::Certificate(format!("validity bound out of range: {} days from epoch", days))
    })
}

/// Upper-case hex bytes joined by `:`
pub fn colon_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<String>>()
        .join(":")
}

/// Render DER bytes as space separated lower-case hex pairs
pub fn certificate_to_hex(der: &[u8]) -> String {
    der.iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<String>>()
        .join(" ")
}
