//! Network stream for IMAP connections.

#![allow(clippy::missing_errors_doc)]

use std::sync::Arc;

use rustls::pki_types::ServerName;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;

use crate::Result;

/// TLS-encrypted TCP stream to an IMAP server.
pub type ImapStream = TlsStream<TcpStream>;

/// Creates a TLS connector trusting the webpki root certificates.
#[must_use]
pub fn create_tls_connector() -> TlsConnector {
    let root_store = rustls::RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };

    let config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    TlsConnector::from(Arc::new(config))
}

/// Connects to a server with TLS from the start (IMAPS, usually port 993).
///
/// The host name is validated before any network traffic happens.
pub async fn connect_tls(host: &str, port: u16) -> Result<ImapStream> {
    let server_name = ServerName::try_from(host.to_string())?;
    let tcp = TcpStream::connect((host, port)).await?;
    tracing::debug!(host, port, "TCP connected, starting TLS handshake");

    Ok(create_tls_connector().connect(server_name, tcp).await?)
}
