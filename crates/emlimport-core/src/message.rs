//! Message staging with CRLF normalisation.
//!
//! IMAP expects every line of an appended message to end in CRLF, while
//! `.eml` files on disk are often LF-only or mixed. [`MessageBuffer`] reads
//! a file line by line and rewrites every terminator to CRLF.

use bytes::BytesMut;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

/// Longest accepted line, terminator excluded (2 MiB).
pub const MAX_LINE_LENGTH: usize = 2 * 1024 * 1024;

/// Bytes read per line at most: content plus a CRLF terminator.
const LINE_CAPACITY: u64 = MAX_LINE_LENGTH as u64 + 2;

/// Errors from [`MessageBuffer::read_normalized`].
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// Reading the source failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A line exceeds [`MAX_LINE_LENGTH`].
    #[error("line {line} is longer than {} bytes", MAX_LINE_LENGTH)]
    LineTooLong {
        /// 1-based line number.
        line: usize,
    },
}

/// Reusable staging buffer for one message at a time.
///
/// The buffer is cleared at the start of every read, so content from a
/// previous message never leaks into the next one. Callers clear it again
/// once the content has been sent.
#[derive(Debug, Default)]
pub struct MessageBuffer {
    buf: BytesMut,
}

impl MessageBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Discards the staged content, keeping the allocation.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Returns the staged content.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Returns the staged length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if nothing is staged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Replaces the staged content with `reader`'s lines, each ending in CRLF.
    ///
    /// A line ends at `\n`; one `\r` right before it is dropped. A last line
    /// without terminator still gets CRLF, and an empty source stages
    /// nothing. Returns the staged length.
    ///
    /// # Errors
    ///
    /// Returns [`NormalizeError::LineTooLong`] if a line is longer than
    /// [`MAX_LINE_LENGTH`], or [`NormalizeError::Io`] if reading fails.
    /// The buffer is left cleared on error.
    pub async fn read_normalized<R>(&mut self, reader: R) -> Result<usize, NormalizeError>
    where
        R: AsyncBufRead + Unpin,
    {
        self.clear();
        let result = self.fill(reader).await;
        if result.is_err() {
            self.clear();
        }
        result
    }

    async fn fill<R>(&mut self, reader: R) -> Result<usize, NormalizeError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut reader = reader.take(LINE_CAPACITY);
        let mut line = Vec::new();
        let mut number = 0;

        loop {
            line.clear();
            reader.set_limit(LINE_CAPACITY);
            if reader.read_until(b'\n', &mut line).await? == 0 {
                break;
            }
            number += 1;

            if line.last() == Some(&b'\n') {
                line.pop();
            }
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            if line.len() > MAX_LINE_LENGTH {
                return Err(NormalizeError::LineTooLong { line: number });
            }

            self.buf.extend_from_slice(&line);
            self.buf.extend_from_slice(b"\r\n");
        }

        Ok(self.buf.len())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tokio::io::BufReader;
    use tokio_test::io::Builder;

    async fn normalize(input: &[u8]) -> Vec<u8> {
        let mut buffer = MessageBuffer::new();
        buffer.read_normalized(input).await.unwrap();
        buffer.as_bytes().to_vec()
    }

    #[tokio::test]
    async fn test_lf_only() {
        assert_eq!(normalize(b"a\nb\n").await, b"a\r\nb\r\n");
    }

    #[tokio::test]
    async fn test_crlf_unchanged() {
        assert_eq!(normalize(b"a\r\nb\r\n").await, b"a\r\nb\r\n");
    }

    #[tokio::test]
    async fn test_mixed() {
        assert_eq!(normalize(b"a\r\nb\nc\r\n").await, b"a\r\nb\r\nc\r\n");
    }

    #[tokio::test]
    async fn test_missing_final_newline() {
        assert_eq!(normalize(b"x").await, b"x\r\n");
        assert_eq!(normalize(b"a\nlast").await, b"a\r\nlast\r\n");
    }

    #[tokio::test]
    async fn test_empty_input() {
        assert!(normalize(b"").await.is_empty());
    }

    #[tokio::test]
    async fn test_blank_lines_kept() {
        assert_eq!(
            normalize(b"Subject: x\n\nbody\n").await,
            b"Subject: x\r\n\r\nbody\r\n"
        );
    }

    #[tokio::test]
    async fn test_only_one_cr_dropped() {
        assert_eq!(normalize(b"a\r\r\n").await, b"a\r\r\n");
    }

    #[tokio::test]
    async fn test_lines_split_across_reads() {
        let mock = Builder::new()
            .read(b"Subj")
            .read(b"ect: x\r")
            .read(b"\nbo")
            .read(b"dy")
            .build();
        let mut buffer = MessageBuffer::new();

        let len = buffer.read_normalized(BufReader::new(mock)).await.unwrap();

        assert_eq!(buffer.as_bytes(), b"Subject: x\r\nbody\r\n");
        assert_eq!(len, buffer.len());
    }

    #[tokio::test]
    async fn test_line_at_max_length_accepted() {
        let mut input = vec![b'a'; MAX_LINE_LENGTH];
        input.extend_from_slice(b"\r\n");

        let mut buffer = MessageBuffer::new();
        let len = buffer.read_normalized(input.as_slice()).await.unwrap();

        assert_eq!(len, MAX_LINE_LENGTH + 2);
    }

    #[tokio::test]
    async fn test_overlong_line_rejected() {
        let mut input = b"ok\n".to_vec();
        input.extend(std::iter::repeat_n(b'a', MAX_LINE_LENGTH + 1));
        input.push(b'\n');

        let mut buffer = MessageBuffer::new();
        let err = buffer.read_normalized(input.as_slice()).await.unwrap_err();

        assert!(matches!(err, NormalizeError::LineTooLong { line: 2 }));
        assert!(buffer.is_empty());
    }

    #[tokio::test]
    async fn test_overlong_final_line_rejected() {
        let input = vec![b'a'; MAX_LINE_LENGTH + 1];

        let mut buffer = MessageBuffer::new();
        let err = buffer.read_normalized(input.as_slice()).await.unwrap_err();

        assert!(matches!(err, NormalizeError::LineTooLong { line: 1 }));
    }

    #[tokio::test]
    async fn test_read_replaces_previous_content() {
        let mut buffer = MessageBuffer::new();
        buffer.read_normalized(&b"first message\n"[..]).await.unwrap();
        buffer.read_normalized(&b"second\n"[..]).await.unwrap();

        assert_eq!(buffer.as_bytes(), b"second\r\n");
    }
}
