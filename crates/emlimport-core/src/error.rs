//! Error types for the import pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can end an import run.
#[derive(Debug, Error)]
pub enum Error {
    /// No candidate files were given.
    #[error("no .eml file found")]
    NoInput,

    /// Configuration is invalid (e.g. an unparsable size limit).
    #[error("Configuration error: {0}")]
    Config(String),

    /// The server could not be reached or the session broke down.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The server rejected the credentials.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The server answered a query in an unusable way.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The server did not accept a message.
    #[error("Failed to import {}: {message}", path.display())]
    Transfer {
        /// File being imported.
        path: PathBuf,
        /// Server or transport message.
        message: String,
    },

    /// A filesystem operation failed.
    #[error("{}: {source}", path.display())]
    Io {
        /// Path the operation was working on.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A message line is longer than the staging scanner accepts.
    #[error("{}: line {line} is longer than {max} bytes", path.display())]
    LineTooLong {
        /// File being read.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
        /// Maximum accepted line length.
        max: usize,
    },
}

impl Error {
    /// Builds an [`Error::Io`] for `path`.
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
