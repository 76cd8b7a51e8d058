//! # emlimport-imap
//!
//! A small IMAP client covering what a message importer needs from a server:
//!
//! - implicit-TLS connection via rustls
//! - `LOGIN` authentication
//! - `STATUS <mailbox> (APPENDLIMIT)` (RFC 7889) to learn the size cap
//! - `APPEND` with a synchronising literal
//! - `LOGOUT`
//!
//! Mailbox names are passed as UTF-8 and sent in modified UTF-7. Arguments
//! that cannot be quoted, such as a non-ASCII password, go out as
//! synchronising literals.
//!
//! ```ignore
//! use emlimport_imap::{Client, connection::connect_tls};
//!
//! let stream = connect_tls("imap.example.com", 993).await?;
//! let client = Client::from_stream(stream).await?;
//! let mut client = client.login("user@example.com", "password").await?;
//!
//! let limit = client.append_limit("INBOX").await?;
//! client.append("INBOX", b"Subject: hi\r\n\r\nbody\r\n").await?;
//! client.logout().await?;
//! ```
//!
//! The connection uses the type-state pattern: only a
//! `Client<_, Authenticated>` can query mailboxes or append, and `logout`
//! consumes the client so it cannot be used afterwards.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod parser;
pub mod types;

pub use command::{Command, StatusAttribute, TagGenerator};
pub use connection::{Authenticated, Client, FramedStream, ImapStream, NotAuthenticated};
pub use error::{Error, Result};
pub use parser::{Response, ResponseParser, StatusItem, UntaggedResponse};
pub use types::{Capability, ResponseCode, Status};
