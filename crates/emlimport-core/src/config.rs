//! Import configuration.
//!
//! An [`ImportConfig`] is built once, validated, and then only read.

use std::fmt;
use std::path::PathBuf;

use crate::{Error, Result};

/// Default IMAPS port.
pub const DEFAULT_PORT: u16 = 993;
/// Default target mailbox.
pub const DEFAULT_MAILBOX: &str = "INBOX";
/// Default local size limit.
pub const DEFAULT_SIZE_LIMIT: &str = "20M";
/// Default archive directory.
pub const DEFAULT_ARCHIVE_DIR: &str = "imported";

/// Server address and login.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Server hostname.
    pub host: String,
    /// Server port (implicit TLS).
    pub port: u16,
    /// Login name.
    pub username: String,
    /// Login password.
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Everything an import run needs to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportConfig {
    /// Server address and login.
    pub credentials: Credentials,
    /// Mailbox messages are appended to.
    pub mailbox: String,
    /// Human-readable local size limit, e.g. `20M`; `0` disables it.
    pub size_limit: String,
    /// Directory imported files are moved into.
    pub archive_dir: PathBuf,
}

impl ImportConfig {
    /// Creates a configuration builder.
    #[must_use]
    pub fn builder(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> ConfigBuilder {
        ConfigBuilder::new(host, username, password)
    }
}

/// Builder for [`ImportConfig`].
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    credentials: Credentials,
    mailbox: String,
    size_limit: String,
    archive_dir: PathBuf,
}

impl ConfigBuilder {
    /// Creates a builder with the defaults for everything but the login.
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            credentials: Credentials {
                host: host.into(),
                port: DEFAULT_PORT,
                username: username.into(),
                password: password.into(),
            },
            mailbox: DEFAULT_MAILBOX.to_string(),
            size_limit: DEFAULT_SIZE_LIMIT.to_string(),
            archive_dir: PathBuf::from(DEFAULT_ARCHIVE_DIR),
        }
    }

    /// Sets the port.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.credentials.port = port;
        self
    }

    /// Sets the target mailbox.
    #[must_use]
    pub fn mailbox(mut self, mailbox: impl Into<String>) -> Self {
        self.mailbox = mailbox.into();
        self
    }

    /// Sets the local size limit string.
    #[must_use]
    pub fn size_limit(mut self, size_limit: impl Into<String>) -> Self {
        self.size_limit = size_limit.into();
        self
    }

    /// Sets the archive directory.
    #[must_use]
    pub fn archive_dir(mut self, archive_dir: impl Into<PathBuf>) -> Self {
        self.archive_dir = archive_dir.into();
        self
    }

    /// Validates and builds the configuration.
    ///
    /// The size limit string is checked later, when a run starts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an empty host, username, password,
    /// mailbox or archive directory, a NUL in any of the strings sent to the
    /// server, or a zero port.
    pub fn build(self) -> Result<ImportConfig> {
        let required = [
            ("host", &self.credentials.host),
            ("username", &self.credentials.username),
            ("password", &self.credentials.password),
            ("mailbox", &self.mailbox),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(Error::Config(format!("{name} must not be empty")));
            }
            // IMAP strings cannot carry NUL, not even as literals.
            if value.contains('\0') {
                return Err(Error::Config(format!("{name} must not contain NUL")));
            }
        }
        if self.credentials.port == 0 {
            return Err(Error::Config("port must not be 0".to_string()));
        }
        if self.archive_dir.as_os_str().is_empty() {
            return Err(Error::Config("archive directory must not be empty".to_string()));
        }

        Ok(ImportConfig {
            credentials: self.credentials,
            mailbox: self.mailbox,
            size_limit: self.size_limit,
            archive_dir: self.archive_dir,
        })
    }
}
