//! # emlimport-core
//!
//! The import pipeline behind `emlimport`:
//!
//! 1. resolve the effective size limit from the configured limit and the
//!    server's APPENDLIMIT
//! 2. for every candidate `.eml` file, in order: skip it if it is too large,
//!    otherwise read it with CRLF line endings, APPEND it to the target
//!    mailbox and move it into the archive directory
//! 3. stop at the first error; files already archived stay archived
//!
//! The session layer is abstracted behind [`Connector`] and [`MailSession`]
//! so the pipeline can run against the real IMAP client ([`ImapConnector`])
//! or a scripted fake.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod archive;
pub mod config;
mod error;
pub mod import;
pub mod limit;
pub mod message;
pub mod session;
pub mod size;

pub use archive::Archive;
pub use config::{ConfigBuilder, Credentials, ImportConfig};
pub use error::{Error, Result};
pub use import::{ImportFailure, ImportRecord, ImportReport, Importer};
pub use limit::{EffectiveLimit, resolve_effective_limit};
pub use message::{MAX_LINE_LENGTH, MessageBuffer, NormalizeError};
pub use session::{Connector, ImapConnector, ImapSession, MailSession};
pub use size::{ParseSizeError, format_size, parse_size};
