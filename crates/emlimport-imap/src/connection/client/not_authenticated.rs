//! Implementation for the not-authenticated state.

use std::marker::PhantomData;

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

use super::Client;
use super::states::{Authenticated, NotAuthenticated};
use crate::command::{Command, TagGenerator};
use crate::connection::framed::FramedStream;
use crate::parser::{Response, ResponseParser, UntaggedResponse};
use crate::types::{ResponseCode, Status};
use crate::{Error, Result};

impl<S> Client<S, NotAuthenticated>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a new client from a connected stream.
    ///
    /// Reads the server greeting and any capabilities it carries.
    pub async fn from_stream(stream: S) -> Result<Self> {
        let mut framed = FramedStream::new(stream);

        let greeting = framed.read_response().await?;
        let capabilities = match ResponseParser::parse(&greeting)? {
            Response::Untagged(UntaggedResponse::Condition {
                status: Status::Ok | Status::PreAuth,
                code,
                text,
            }) => {
                debug!(greeting = %text, "server ready");
                match code {
                    Some(ResponseCode::Capability(caps)) => caps,
                    _ => Vec::new(),
                }
            }
            Response::Untagged(UntaggedResponse::Condition {
                status: Status::Bye,
                text,
                ..
            }) => return Err(Error::Bye(text)),
            other => {
                return Err(Error::Protocol(format!("unexpected greeting: {other:?}")));
            }
        };

        Ok(Self {
            stream: framed,
            tag_gen: TagGenerator::default(),
            capabilities,
            _state: PhantomData,
        })
    }

    /// Authenticates with the server using LOGIN.
    ///
    /// Consumes self and returns an authenticated client on success. A
    /// rejected login comes back as [`Error::No`] with the server's text.
    pub async fn login(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Client<S, Authenticated>> {
        if self.login_disabled() {
            return Err(Error::No("server advertises LOGINDISABLED".to_string()));
        }

        self.execute(&Command::Login {
            username: username.to_string(),
            password: password.to_string(),
        })
        .await?;

        debug!(username, "logged in");
        Ok(self.transition())
    }

    /// Gracefully disconnects from the server.
    pub async fn logout(mut self) -> Result<()> {
        self.send_logout().await
    }
}
