//! Shared test helpers
//!
//! Certificates are minted on the fly with openssl and served from local
//! TLS servers bound to ephemeral ports.

#![allow(dead_code)]

use std::pin::Pin;

use chrono::Utc;
use openssl::asn1::{Asn1Integer, Asn1Time};
use openssl::bn::BigNum;
use openssl::ec::{EcGroup, EcKey};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private};
use openssl::ssl::{Ssl, SslAcceptor, SslAcceptorBuilder, SslMethod, SslVersion};
use openssl::x509::extension::SubjectAlternativeName;
use openssl::x509::{X509Builder, X509NameBuilder, X509};
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_openssl::SslStream;

const DAY: i64 = 24 * 60 * 60;

/// Certificate and key served by a test server
pub struct TestCert {
    pub cert: X509,
    pub key: PKey<Private>,
}

/// Mint a self-signed certificate
///
/// Validity bounds are given in days relative to now and may be negative.
pub fn mint_certificate(common_name: &str, not_before_days: i64, not_after_days: i64, sans: &[&str]) -> TestCert {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
    let key = PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap();

    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_text("C", "US").unwrap();
    name.append_entry_by_text("O", "Monitor Tests").unwrap();
    name.append_entry_by_text("CN", common_name).unwrap();
    let name = name.build();

    let now = Utc::now().timestamp();
    let not_before = Asn1Time::from_unix((now + not_before_days * DAY) as _).unwrap();
    let not_after = Asn1Time::from_unix((now + not_after_days * DAY) as _).unwrap();
    let serial = Asn1Integer::from_bn(&BigNum::from_u32(0x00C0FFEE).unwrap()).unwrap();

    let mut builder = X509Builder::new().unwrap();
    builder.set_version(2).unwrap();
    builder.set_serial_number(&serial).unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_issuer_name(&name).unwrap();
    builder.set_pubkey(&key).unwrap();
    builder.set_not_before(&not_before).unwrap();
    builder.set_not_after(&not_after).unwrap();

    if !sans.is_empty() {
        let mut san = SubjectAlternativeName::new();
        for dns in sans {
            san.dns(dns);
        }
        let extension = san.build(&builder.x509v3_context(None, None)).unwrap();
        builder.append_extension(extension).unwrap();
    }

    builder.sign(&key, MessageDigest::sha256()).unwrap();

    TestCert {
        cert: builder.build(),
        key,
    }
}

/// Certificate valid from yesterday for 90 days
pub fn valid_certificate(sans: &[&str]) -> TestCert {
    mint_certificate("localhost", -1, 90, sans)
}

/// Serve `cert` over TLS on an ephemeral local port and return the port
///
/// Every accepted connection completes the handshake and is held until the
/// client closes it.
pub async fn spawn_tls_server(cert: &TestCert) -> u16 {
    let acceptor = SslAcceptor::mozilla_intermediate_v5(SslMethod::tls()).unwrap();
    serve(acceptor, cert).await
}

/// Serve `cert` from a server that only speaks TLSv1.1
pub async fn spawn_tls11_server(cert: &TestCert) -> u16 {
    let mut acceptor = SslAcceptor::mozilla_intermediate(SslMethod::tls()).unwrap();
    acceptor.set_security_level(0);
    acceptor.set_cipher_list("DEFAULT:@SECLEVEL=0").unwrap();
    acceptor.set_min_proto_version(Some(SslVersion::TLS1_1)).unwrap();
    acceptor.set_max_proto_version(Some(SslVersion::TLS1_1)).unwrap();
    serve(acceptor, cert).await
}

async fn serve(mut acceptor: SslAcceptorBuilder, cert: &TestCert) -> u16 {
    acceptor.set_certificate(&cert.cert).unwrap();
    acceptor.set_private_key(&cert.key).unwrap();
    acceptor.check_private_key().unwrap();
    let acceptor = acceptor.build();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        loop {
            let Ok((tcp, _)) = listener.accept().await else {
                return;
            };
            let ssl = Ssl::new(acceptor.context()).unwrap();
            tokio::spawn(async move {
                let mut stream = SslStream::new(ssl, tcp).unwrap();
                if Pin::new(&mut stream).accept().await.is_err() {
                    return;
                }
                let mut buf = [0u8; 1024];
                while let Ok(n) = stream.read(&mut buf).await {
                    if n == 0 {
                        break;
                    }
                }
            });
        }
    });

    port
}

/// Accept TCP connections and never answer
///
/// Returns the port and a channel receiving one message per connection once
/// the client has closed it.
pub async fn spawn_silent_server() -> (u16, mpsc::UnboundedReceiver<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let (closed_tx, closed_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        loop {
            let Ok((mut tcp, _)) = listener.accept().await else {
                return;
            };
            let closed_tx = closed_tx.clone();
            tokio::spawn(async move {
                let mut buf = [0u8; 1024];
                loop {
                    match tcp.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(_) => {}
                    }
                }
                let _ = closed_tx.send(());
            });
        }
    });

    (port, closed_rx)
}
