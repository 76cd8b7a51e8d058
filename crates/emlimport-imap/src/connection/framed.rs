//! Framed I/O for the IMAP protocol.
//!
//! Server responses are CRLF-terminated lines that may embed literals
//! (`{n}\r\n` followed by `n` raw bytes). [`FramedStream`] reassembles a
//! whole response, literals included, before handing it to the parser.

#![allow(clippy::missing_errors_doc)]

use std::io;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::{Error, Result};

/// Default buffer size for reading.
const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Maximum response line length.
const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Maximum literal size accepted from the server.
///
/// The importer only reads status lines and short mailbox names.
const MAX_LITERAL_SIZE: usize = 1024 * 1024;

/// Buffered IMAP stream.
pub struct FramedStream<S> {
    reader: BufReader<S>,
}

impl<S> FramedStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps a connected stream.
    pub fn new(stream: S) -> Self {
        Self {
            reader: BufReader::with_capacity(DEFAULT_BUFFER_SIZE, stream),
        }
    }

    /// Reads one complete response, following any literals it announces.
    pub async fn read_response(&mut self) -> Result<Vec<u8>> {
        let mut response = Vec::new();

        loop {
            let line_start = response.len();
            self.read_line_into(&mut response).await?;

            let Some(len) = literal_length(&response[line_start..]) else {
                return Ok(response);
            };
            if len > MAX_LITERAL_SIZE {
                return Err(Error::Protocol(format!(
                    "literal too large: {len} bytes (max {MAX_LITERAL_SIZE})"
                )));
            }

            let literal_start = response.len();
            response.resize(literal_start + len, 0);
            self.reader
                .read_exact(&mut response[literal_start..])
                .await?;
        }
    }

    /// Reads responses until the tagged completion for `tag` arrives.
    ///
    /// Returns every response read, the tagged one last.
    pub async fn read_until_tagged(&mut self, tag: &str) -> Result<Vec<Vec<u8>>> {
        let mut responses = Vec::new();

        loop {
            let response = self.read_response().await?;
            let done = is_tagged_with(&response, tag);
            responses.push(response);
            if done {
                return Ok(responses);
            }
        }
    }

    /// Appends one LF-terminated line (terminator included) to `out`.
    async fn read_line_into(&mut self, out: &mut Vec<u8>) -> Result<()> {
        let start = out.len();

        loop {
            let buf = self.reader.fill_buf().await?;
            if buf.is_empty() {
                return Err(Error::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed",
                )));
            }

            if let Some(pos) = buf.iter().position(|&b| b == b'\n') {
                out.extend_from_slice(&buf[..=pos]);
                self.reader.consume(pos + 1);
                return Ok(());
            }

            let len = buf.len();
            out.extend_from_slice(buf);
            self.reader.consume(len);

            if out.len() - start > MAX_LINE_LENGTH {
                return Err(Error::Protocol("line too long".to_string()));
            }
        }
    }

    /// Writes raw bytes and flushes.
    pub async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        let stream = self.reader.get_mut();
        stream.write_all(data).await?;
        stream.flush().await?;
        Ok(())
    }
}

/// Returns true if `response` starts with `tag` followed by a space.
fn is_tagged_with(response: &[u8], tag: &str) -> bool {
    response
        .strip_prefix(tag.as_bytes())
        .is_some_and(|rest| rest.first() == Some(&b' '))
}

/// Parses the literal length announced at the end of a line.
///
/// Matches `{123}\r\n` and the non-synchronising `{123+}\r\n`.
fn literal_length(line: &[u8]) -> Option<usize> {
    let line = line
        .strip_suffix(b"\r\n")
        .or_else(|| line.strip_suffix(b"\n"))?;
    let line = line.strip_suffix(b"}")?;
    let open = line.iter().rposition(|&b| b == b'{')?;
    let digits = &line[open + 1..];
    let digits = digits.strip_suffix(b"+").unwrap_or(digits);

    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(digits).ok()?.parse().ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tokio_test::io::Builder;

    #[test]
    fn test_literal_length() {
        assert_eq!(literal_length(b"* STATUS {5}\r\n"), Some(5));
        assert_eq!(literal_length(b"* STATUS {5+}\r\n"), Some(5));
        assert_eq!(literal_length(b"{0}\r\n"), Some(0));
        assert_eq!(literal_length(b"no literal\r\n"), None);
        assert_eq!(literal_length(b"incomplete {12"), None);
        assert_eq!(literal_length(b"wrong {abc}\r\n"), None);
        assert_eq!(literal_length(b"empty {}\r\n"), None);
    }

    #[test]
    fn test_is_tagged_with() {
        assert!(is_tagged_with(b"A0001 OK done\r\n", "A0001"));
        assert!(!is_tagged_with(b"A00011 OK done\r\n", "A0001"));
        assert!(!is_tagged_with(b"* OK done\r\n", "A0001"));
    }

    #[tokio::test]
    async fn test_read_simple_line() {
        let mock = Builder::new().read(b"* OK ready\r\n").build();
        let mut framed = FramedStream::new(mock);

        let response = framed.read_response().await.unwrap();
        assert_eq!(response, b"* OK ready\r\n");
    }

    #[tokio::test]
    async fn test_read_line_split_across_reads() {
        let mock = Builder::new().read(b"* OK re").read(b"ady\r\n").build();
        let mut framed = FramedStream::new(mock);

        assert_eq!(framed.read_response().await.unwrap(), b"* OK ready\r\n");
    }

    #[tokio::test]
    async fn test_read_with_literal() {
        let mock = Builder::new()
            .read(b"* STATUS {5}\r\n")
            .read(b"INBOX (APPENDLIMIT 10)\r\n")
            .build();
        let mut framed = FramedStream::new(mock);

        let response = framed.read_response().await.unwrap();
        assert_eq!(response, b"* STATUS {5}\r\nINBOX (APPENDLIMIT 10)\r\n");
    }

    #[tokio::test]
    async fn test_oversized_literal_rejected() {
        let header = format!("* STATUS {{{}}}\r\n", MAX_LITERAL_SIZE + 1);
        let mock = Builder::new().read(header.as_bytes()).build();
        let mut framed = FramedStream::new(mock);

        let err = framed.read_response().await.unwrap_err();
        assert!(err.to_string().contains("literal too large"));
    }

    #[tokio::test]
    async fn test_line_length_limit() {
        let long_line = "A".repeat(MAX_LINE_LENGTH + 100);
        let mock = Builder::new().read(long_line.as_bytes()).build();
        let mut framed = FramedStream::new(mock);

        let err = framed.read_response().await.unwrap_err();
        assert!(err.to_string().contains("line too long"));
    }

    #[tokio::test]
    async fn test_eof_is_io_error() {
        let mock = Builder::new().read(b"* OK par").build();
        let mut framed = FramedStream::new(mock);

        assert!(matches!(
            framed.read_response().await,
            Err(Error::Io(ref e)) if e.kind() == io::ErrorKind::UnexpectedEof
        ));
    }

    #[tokio::test]
    async fn test_read_until_tagged() {
        let mock = Builder::new()
            .read(b"* CAPABILITY IMAP4rev1\r\n")
            .read(b"A0001 OK done\r\n")
            .build();
        let mut framed = FramedStream::new(mock);

        let responses = framed.read_until_tagged("A0001").await.unwrap();
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[1], b"A0001 OK done\r\n");
    }

    #[tokio::test]
    async fn test_write_all() {
        let mock = Builder::new().write(b"A0000 CAPABILITY\r\n").build();
        let mut framed = FramedStream::new(mock);

        framed.write_all(b"A0000 CAPABILITY\r\n").await.unwrap();
    }
}
