//! IMAP connection management.
//!
//! - TLS stream setup
//! - Framed I/O for IMAP responses
//! - Type-state client wrapper

mod client;
mod framed;
mod stream;

pub use client::{Authenticated, Client, NotAuthenticated};
pub use framed::FramedStream;
pub use stream::{ImapStream, connect_tls, create_tls_connector};
