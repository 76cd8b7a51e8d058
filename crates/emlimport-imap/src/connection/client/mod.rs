//! Type-state IMAP client connection.
//!
//! The client starts `NotAuthenticated` and becomes `Authenticated` after a
//! successful LOGIN. Each state only exposes the commands valid in it, and
//! `logout` consumes the client.

#![allow(clippy::missing_errors_doc)]

mod authenticated;
mod not_authenticated;
mod states;

use std::io;
use std::marker::PhantomData;

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

pub use self::states::{Authenticated, NotAuthenticated};
use super::framed::FramedStream;
use crate::command::{Command, TagGenerator};
use crate::parser::{Response, ResponseParser, UntaggedResponse};
use crate::types::{Capability, ResponseCode, Status};
use crate::{Error, Result};

/// IMAP client connection with type-state.
///
/// The type parameter `State` tracks the connection state at compile time.
pub struct Client<S, State> {
    pub(crate) stream: FramedStream<S>,
    pub(crate) tag_gen: TagGenerator,
    pub(crate) capabilities: Vec<Capability>,
    _state: PhantomData<State>,
}

// FramedStream does not implement Debug
impl<S, State> std::fmt::Debug for Client<S, State> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("tag_gen", &self.tag_gen)
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

/// Shared implementation for all states.
impl<S, State> Client<S, State>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Moves the connection into another state.
    pub(crate) fn transition<Next>(self) -> Client<S, Next> {
        Client {
            stream: self.stream,
            tag_gen: self.tag_gen,
            capabilities: self.capabilities,
            _state: PhantomData,
        }
    }

    /// Returns the server capabilities seen so far.
    #[must_use]
    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    /// Checks if the server has a specific capability.
    #[must_use]
    pub fn has_capability(&self, cap: &Capability) -> bool {
        self.capabilities.contains(cap)
    }

    /// Returns true if LOGIN is disabled (e.g., before STARTTLS).
    #[must_use]
    pub fn login_disabled(&self) -> bool {
        self.has_capability(&Capability::LoginDisabled)
    }

    /// Returns the global limit from an `APPENDLIMIT=<n>` capability.
    #[must_use]
    pub fn advertised_append_limit(&self) -> Option<u32> {
        self.capabilities.iter().find_map(|cap| match cap {
            Capability::AppendLimit(limit) => *limit,
            _ => None,
        })
    }

    /// Sends a command, waits for its completion and checks it succeeded.
    ///
    /// Returns every response read, the tagged completion last.
    pub(crate) async fn execute(&mut self, command: &Command) -> Result<Vec<Vec<u8>>> {
        let tag = self.tag_gen.next();
        debug!(tag = %tag, command = command.name(), "sending command");
        self.send_command(command, &tag).await?;

        let responses = self.stream.read_until_tagged(&tag).await?;
        self.absorb_capabilities(&responses);
        check_tagged_ok(&responses, &tag)?;
        Ok(responses)
    }

    /// Writes a serialized command, pausing for a continuation before
    /// every chunk that follows a literal announcement.
    pub(crate) async fn send_command(&mut self, command: &Command, tag: &str) -> Result<()> {
        for (i, chunk) in command.serialize(tag).iter().enumerate() {
            if i > 0 {
                self.await_continuation(tag).await?;
            }
            self.stream.write_all(chunk).await?;
        }
        Ok(())
    }

    /// Reads responses until the server asks for literal data.
    ///
    /// A tagged completion for `tag` arriving first means the server
    /// refused the command before the literal was sent.
    pub(crate) async fn await_continuation(&mut self, tag: &str) -> Result<()> {
        loop {
            let response = self.stream.read_response().await?;
            match ResponseParser::parse(&response)? {
                Response::Continuation { .. } => return Ok(()),
                Response::Tagged {
                    tag: resp_tag,
                    status,
                    text,
                    ..
                } if resp_tag == tag => {
                    return match status {
                        Status::Ok => Err(Error::Protocol(
                            "command completed before its literal was sent".to_string(),
                        )),
                        _ => status_result(status, text),
                    };
                }
                _ => {}
            }
        }
    }

    /// Sends LOGOUT and waits for the server to acknowledge it.
    ///
    /// A server that hangs up right after its BYE is treated as a clean
    /// logout.
    pub(crate) async fn send_logout(&mut self) -> Result<()> {
        match self.execute(&Command::Logout).await {
            Err(Error::Io(e)) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(()),
            other => other.map(drop),
        }
    }

    /// Picks up capability lists from untagged data or response codes.
    fn absorb_capabilities(&mut self, responses: &[Vec<u8>]) {
        for bytes in responses {
            match ResponseParser::parse(bytes) {
                Ok(
                    Response::Untagged(UntaggedResponse::Capability(caps))
                    | Response::Tagged {
                        code: Some(ResponseCode::Capability(caps)),
                        ..
                    },
                ) => self.capabilities = caps,
                _ => {}
            }
        }
    }
}

/// Checks that the tagged completion for `tag` is OK.
pub(crate) fn check_tagged_ok(responses: &[Vec<u8>], tag: &str) -> Result<()> {
    for bytes in responses.iter().rev() {
        if let Ok(Response::Tagged {
            tag: resp_tag,
            status,
            text,
            ..
        }) = ResponseParser::parse(bytes)
            && resp_tag == tag
        {
            return status_result(status, text);
        }
    }

    Err(Error::Protocol("missing tagged response".to_string()))
}

/// Maps a completion status to a result.
pub(crate) fn status_result(status: Status, text: String) -> Result<()> {
    match status {
        Status::Ok | Status::PreAuth => Ok(()),
        Status::No => Err(Error::No(text)),
        Status::Bad => Err(Error::Bad(text)),
        Status::Bye => Err(Error::Bye(text)),
    }
}
