//! The import run.
//!
//! An [`Importer`] takes a list of candidate files and, over one session,
//! imports them strictly in order:
//!
//! 1. skip the file if it is larger than the effective limit
//! 2. read it into the staging buffer with CRLF line endings
//! 3. APPEND it to the target mailbox
//! 4. move it into the archive directory
//!
//! The first error stops the run. Files archived before that stay archived
//! and files after it are not touched. The session is logged out however
//! the run ends.

use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::BufReader;
use tracing::{debug, info, warn};

use crate::archive::Archive;
use crate::config::ImportConfig;
use crate::limit::{EffectiveLimit, resolve_effective_limit};
use crate::message::{MAX_LINE_LENGTH, MessageBuffer, NormalizeError};
use crate::session::{Connector, MailSession, server_message};
use crate::size::{format_size, parse_size};
use crate::{Error, Result};

/// Outcome for one candidate file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportRecord {
    /// Appended to the mailbox and archived.
    Imported {
        /// Original location.
        path: PathBuf,
        /// Location inside the archive directory.
        destination: PathBuf,
    },
    /// Left in place because it is over the limit.
    Skipped {
        /// File location.
        path: PathBuf,
        /// File size in bytes.
        size: u64,
        /// Limit it exceeded.
        limit: EffectiveLimit,
    },
}

impl ImportRecord {
    /// Returns the candidate path this record is about.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Imported { path, .. } | Self::Skipped { path, .. } => path,
        }
    }
}

/// Records of every file processed, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Effective limit the run used, once known.
    pub limit: Option<EffectiveLimit>,
    records: Vec<ImportRecord>,
}

impl ImportReport {
    /// Returns all records.
    #[must_use]
    pub fn records(&self) -> &[ImportRecord] {
        &self.records
    }

    /// Number of files imported.
    #[must_use]
    pub fn imported(&self) -> usize {
        self.records
            .iter()
            .filter(|r| matches!(r, ImportRecord::Imported { .. }))
            .count()
    }

    /// Number of files skipped for size.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.records
            .iter()
            .filter(|r| matches!(r, ImportRecord::Skipped { .. }))
            .count()
    }

    /// Number of files processed, imported or skipped.
    #[must_use]
    pub fn processed(&self) -> usize {
        self.records.len()
    }
}

/// A run that stopped on an error, with what it got done before.
#[derive(Debug)]
pub struct ImportFailure {
    /// Files processed before the error.
    pub report: ImportReport,
    /// The error that stopped the run.
    pub error: Error,
}

impl ImportFailure {
    fn new(report: ImportReport, error: Error) -> Self {
        Self { report, error }
    }

    /// Drops the partial report and returns the error.
    #[must_use]
    pub fn into_error(self) -> Error {
        self.error
    }
}

impl From<Error> for ImportFailure {
    fn from(error: Error) -> Self {
        Self::new(ImportReport::default(), error)
    }
}

/// Runs imports for one configuration.
///
/// The importer owns the staging buffer, so it can be reused for several
/// runs without reallocating.
#[derive(Debug)]
pub struct Importer<'a, C> {
    config: &'a ImportConfig,
    connector: C,
    archive: Archive,
    buffer: MessageBuffer,
}

impl<'a, C> Importer<'a, C>
where
    C: Connector,
{
    /// Creates an importer.
    pub fn new(config: &'a ImportConfig, connector: C) -> Self {
        Self {
            config,
            connector,
            archive: Archive::new(&config.archive_dir),
            buffer: MessageBuffer::new(),
        }
    }

    /// Imports `candidates` in order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoInput`] without connecting if `candidates` is
    /// empty. Otherwise returns the first error that stopped the run.
    pub async fn run(&mut self, candidates: &[PathBuf]) -> Result<ImportReport> {
        self.run_with_report(candidates)
            .await
            .map_err(ImportFailure::into_error)
    }

    /// Like [`run`](Self::run), but keeps the partial report on failure.
    ///
    /// # Errors
    ///
    /// Returns an [`ImportFailure`] holding the records produced before the
    /// error.
    pub async fn run_with_report(
        &mut self,
        candidates: &[PathBuf],
    ) -> std::result::Result<ImportReport, ImportFailure> {
        if candidates.is_empty() {
            return Err(Error::NoInput.into());
        }

        let credentials = &self.config.credentials;
        let mut session = self.connector.connect(credentials).await?;
        info!(host = %credentials.host, user = %credentials.username, "connected");

        let outcome = self.import_all(&mut session, candidates).await;

        if let Err(e) = session.logout().await {
            warn!(error = %e, "logout failed");
        } else {
            debug!("logged out");
        }

        outcome
    }

    async fn import_all<S>(
        &mut self,
        session: &mut S,
        candidates: &[PathBuf],
    ) -> std::result::Result<ImportReport, ImportFailure>
    where
        S: MailSession,
    {
        let local = parse_size(&self.config.size_limit).map_err(|e| {
            Error::Config(format!("invalid size limit {:?}: {e}", self.config.size_limit))
        })?;

        let mailbox = &self.config.mailbox;
        let remote = match session.append_limit(mailbox).await {
            Ok(remote) => Some(remote),
            Err(e) => {
                warn!(mailbox = %mailbox, error = %e, "could not query server size limit");
                None
            }
        };

        let limit = resolve_effective_limit(local, remote);
        info!(limit = %limit, bytes = limit.bytes(), "using size limit");

        let mut report = ImportReport {
            limit: Some(limit),
            records: Vec::with_capacity(candidates.len()),
        };
        for path in candidates {
            match self.import_one(session, path, limit).await {
                Ok(record) => report.records.push(record),
                Err(error) => return Err(ImportFailure::new(report, error)),
            }
        }
        Ok(report)
    }

    async fn import_one<S>(
        &mut self,
        session: &mut S,
        path: &Path,
        limit: EffectiveLimit,
    ) -> Result<ImportRecord>
    where
        S: MailSession,
    {
        if !limit.is_unlimited() {
            let size = fs::metadata(path)
                .await
                .map_err(|e| Error::io(path, e))?
                .len();
            if !limit.allows(size) {
                warn!(
                    path = %path.display(),
                    size = %format_size(size),
                    limit = %limit,
                    "skipping, file is over the size limit"
                );
                return Ok(ImportRecord::Skipped {
                    path: path.to_path_buf(),
                    size,
                    limit,
                });
            }
        }

        let file = fs::File::open(path).await.map_err(|e| Error::io(path, e))?;
        self.buffer
            .read_normalized(BufReader::new(file))
            .await
            .map_err(|e| match e {
                NormalizeError::Io(source) => Error::io(path, source),
                NormalizeError::LineTooLong { line } => Error::LineTooLong {
                    path: path.to_path_buf(),
                    line,
                    max: MAX_LINE_LENGTH,
                },
            })?;

        let size = self.buffer.len();
        let sent = session
            .append(&self.config.mailbox, self.buffer.as_bytes())
            .await;
        self.buffer.clear();
        sent.map_err(|e| Error::Transfer {
            path: path.to_path_buf(),
            message: server_message(&e),
        })?;

        let destination = self.archive.archive(path).await?;
        info!(
            path = %path.display(),
            size,
            archived = %destination.display(),
            "imported"
        );

        Ok(ImportRecord::Imported {
            path: path.to_path_buf(),
            destination,
        })
    }
}
