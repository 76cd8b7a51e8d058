//! Error types for the IMAP client.

use thiserror::Error;

/// Errors that can occur during IMAP operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error during network operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TLS handshake or encryption error.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// Invalid DNS name for TLS.
    #[error("Invalid DNS name: {0}")]
    InvalidDnsName(#[from] rustls::pki_types::InvalidDnsNameError),

    /// Response could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Server returned NO.
    #[error("Server returned NO: {0}")]
    No(String),

    /// Server returned BAD.
    #[error("Server returned BAD: {0}")]
    Bad(String),

    /// Server sent BYE (disconnecting).
    #[error("Server sent BYE: {0}")]
    Bye(String),

    /// Protocol violation or unexpected data.
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl Error {
    /// Returns true if the server answered the command with NO or BAD.
    ///
    /// Any other variant means the exchange itself broke down.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::No(_) | Self::Bad(_))
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
