//! Session layer between the import pipeline and the IMAP server.
//!
//! [`Connector`] opens a session, [`MailSession`] is what the pipeline does
//! with it. [`ImapConnector`] and [`ImapSession`] are the real thing; tests
//! plug in scripted fakes.

use std::future::Future;

use emlimport_imap::connection::connect_tls;
use emlimport_imap::{Authenticated, Client, ImapStream};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

use crate::config::Credentials;
use crate::{Error, Result};

/// Opens authenticated sessions.
pub trait Connector {
    /// Session type produced on success.
    type Session: MailSession;

    /// Connects and logs in.
    ///
    /// Fails with [`Error::Connection`] when the server cannot be reached or
    /// greets badly, and with [`Error::Authentication`] when it rejects the
    /// login.
    fn connect(&self, credentials: &Credentials) -> impl Future<Output = Result<Self::Session>>;
}

/// Operations the pipeline performs on an open session.
pub trait MailSession {
    /// Returns the server's APPENDLIMIT for `mailbox`; 0 means none.
    fn append_limit(&mut self, mailbox: &str) -> impl Future<Output = emlimport_imap::Result<u32>>;

    /// Appends one CRLF-normalised message to `mailbox`.
    fn append(
        &mut self,
        mailbox: &str,
        message: &[u8],
    ) -> impl Future<Output = emlimport_imap::Result<()>>;

    /// Logs out and closes the session.
    ///
    /// Fails with [`Error::Connection`] if the server does not acknowledge
    /// the logout.
    fn logout(self) -> impl Future<Output = Result<()>>;
}

/// Returns the server's own text for a rejection, or the full error otherwise.
pub(crate) fn server_message(err: &emlimport_imap::Error) -> String {
    match err {
        emlimport_imap::Error::No(text) | emlimport_imap::Error::Bad(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Connects over implicit TLS.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImapConnector;

impl Connector for ImapConnector {
    type Session = ImapSession;

    async fn connect(&self, credentials: &Credentials) -> Result<ImapSession> {
        debug!(host = %credentials.host, port = credentials.port, "connecting");
        let stream = connect_tls(&credentials.host, credentials.port)
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;
        ImapSession::establish(stream, credentials).await
    }
}

/// An authenticated IMAP session.
#[derive(Debug)]
pub struct ImapSession<S = ImapStream> {
    client: Client<S, Authenticated>,
}

impl<S> ImapSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps an already authenticated client.
    pub const fn new(client: Client<S, Authenticated>) -> Self {
        Self { client }
    }

    /// Reads the greeting on `stream` and logs in.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Authentication`] with the server's text if the login
    /// is rejected, or [`Error::Connection`] for any other failure.
    pub async fn establish(stream: S, credentials: &Credentials) -> Result<Self> {
        let client = Client::from_stream(stream)
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;

        let client = client
            .login(&credentials.username, &credentials.password)
            .await
            .map_err(|e| {
                if e.is_rejection() {
                    Error::Authentication(server_message(&e))
                } else {
                    Error::Connection(e.to_string())
                }
            })?;

        Ok(Self::new(client))
    }
}

impl<S> MailSession for ImapSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    async fn append_limit(&mut self, mailbox: &str) -> emlimport_imap::Result<u32> {
        self.client.append_limit(mailbox).await
    }

    async fn append(&mut self, mailbox: &str, message: &[u8]) -> emlimport_imap::Result<()> {
        self.client.append(mailbox, message).await
    }

    async fn logout(self) -> Result<()> {
        self.client
            .logout()
            .await
            .map_err(|e| Error::Connection(e.to_string()))
    }
}
