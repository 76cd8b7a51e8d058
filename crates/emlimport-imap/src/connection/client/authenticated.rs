//! Implementation for the authenticated state.

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

use super::states::Authenticated;
use super::{Client, check_tagged_ok};
use crate::Result;
use crate::command::{Command, StatusAttribute};
use crate::parser::{Response, ResponseParser, StatusItem, UntaggedResponse};

impl<S> Client<S, Authenticated>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Gets the status of a mailbox without selecting it.
    pub async fn status(
        &mut self,
        mailbox: &str,
        items: &[StatusAttribute],
    ) -> Result<Vec<StatusItem>> {
        let responses = self
            .execute(&Command::Status {
                mailbox: mailbox.to_string(),
                items: items.to_vec(),
            })
            .await?;

        Ok(responses
            .iter()
            .filter_map(|bytes| match ResponseParser::parse(bytes) {
                Ok(Response::Untagged(UntaggedResponse::Status { items, .. })) => Some(items),
                _ => None,
            })
            .flatten()
            .collect())
    }

    /// Asks the server for the largest message it accepts in `mailbox`.
    ///
    /// Uses `STATUS mailbox (APPENDLIMIT)`. When the STATUS answer has no
    /// APPENDLIMIT item, or the server rejects the request, a global
    /// `APPENDLIMIT=<n>` capability is used instead. Returns 0 when the
    /// server does not state a limit.
    pub async fn append_limit(&mut self, mailbox: &str) -> Result<u32> {
        let items = match self.status(mailbox, &[StatusAttribute::AppendLimit]).await {
            Ok(items) => items,
            Err(e) if e.is_rejection() => match self.advertised_append_limit() {
                Some(limit) => return Ok(limit),
                None => return Err(e),
            },
            Err(e) => return Err(e),
        };

        let from_status = items.iter().find_map(|item| match item {
            StatusItem::AppendLimit(limit) => Some(*limit),
            _ => None,
        });

        Ok(match from_status {
            Some(limit) => limit.unwrap_or(0),
            None => self.advertised_append_limit().unwrap_or(0),
        })
    }

    /// Appends a message to a mailbox.
    ///
    /// The message is sent as-is in a synchronising literal, without flags
    /// or internal date, so the server assigns both. IMAP requires the
    /// message to use CRLF line endings.
    pub async fn append(&mut self, mailbox: &str, message: &[u8]) -> Result<()> {
        let tag = self.tag_gen.next();
        let command = Command::Append {
            mailbox: mailbox.to_string(),
            size: message.len(),
        };
        debug!(tag = %tag, mailbox, size = message.len(), "sending command");
        self.send_command(&command, &tag).await?;
        self.await_continuation(&tag).await?;

        self.stream.write_all(message).await?;
        self.stream.write_all(b"\r\n").await?;

        let responses = self.stream.read_until_tagged(&tag).await?;
        check_tagged_ok(&responses, &tag)
    }

    /// Gracefully disconnects from the server.
    pub async fn logout(mut self) -> Result<()> {
        self.send_logout().await
    }
}
