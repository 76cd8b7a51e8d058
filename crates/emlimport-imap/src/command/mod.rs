//! IMAP command builder.
//!
//! Only the commands an importer issues are modelled here.

mod tag_generator;

pub use tag_generator::TagGenerator;

/// STATUS attributes to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusAttribute {
    /// Maximum accepted APPEND size (RFC 7889).
    AppendLimit,
}

impl StatusAttribute {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::AppendLimit => "APPENDLIMIT",
        }
    }
}

/// IMAP command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// LOGOUT command.
    Logout,
    /// LOGIN command.
    Login {
        /// Username.
        username: String,
        /// Password.
        password: String,
    },
    /// STATUS command.
    Status {
        /// Mailbox name, as UTF-8.
        mailbox: String,
        /// Status items to request.
        items: Vec<StatusAttribute>,
    },
    /// APPEND command line, up to and including the literal announcement.
    ///
    /// The message itself is sent after the server's continuation request.
    Append {
        /// Target mailbox, as UTF-8.
        mailbox: String,
        /// Size of the message literal in bytes.
        size: usize,
    },
}

impl Command {
    /// Returns the command keyword, for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Logout => "LOGOUT",
            Self::Login { .. } => "LOGIN",
            Self::Status { .. } => "STATUS",
            Self::Append { .. } => "APPEND",
        }
    }

    /// Serializes the command with the given tag.
    ///
    /// Arguments that cannot travel as atoms or quoted strings become
    /// synchronising literals, which splits the command into chunks. Every
    /// chunk but the last ends with a `{n}` announcement, and the next one
    /// may only be sent after the server's `+` continuation. The last chunk
    /// is CRLF-terminated.
    #[must_use]
    pub fn serialize(&self, tag: &str) -> Vec<Vec<u8>> {
        let mut out = ChunkWriter::default();
        out.push(tag.as_bytes());
        out.push(b" ");

        match self {
            Self::Logout => out.push(b"LOGOUT"),

            Self::Login { username, password } => {
                out.push(b"LOGIN ");
                out.astring(username.as_bytes());
                out.push(b" ");
                out.astring(password.as_bytes());
            }

            Self::Status { mailbox, items } => {
                out.push(b"STATUS ");
                out.mailbox(mailbox);
                out.push(b" (");
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(b" ");
                    }
                    out.push(item.as_str().as_bytes());
                }
                out.push(b")");
            }

            Self::Append { mailbox, size } => {
                out.push(b"APPEND ");
                out.mailbox(mailbox);
                out.push(format!(" {{{size}}}").as_bytes());
            }
        }

        out.push(b"\r\n");
        out.finish()
    }
}

/// Accumulates command bytes, starting a new chunk after each literal.
#[derive(Debug, Default)]
struct ChunkWriter {
    done: Vec<Vec<u8>>,
    current: Vec<u8>,
}

impl ChunkWriter {
    fn push(&mut self, bytes: &[u8]) {
        self.current.extend_from_slice(bytes);
    }

    /// Writes a mailbox name in modified UTF-7 (RFC 3501 section 5.1.3).
    fn mailbox(&mut self, name: &str) {
        let encoded = utf7_imap::encode_utf7_imap(name.to_string());
        self.astring(encoded.as_bytes());
    }

    /// Writes an atom, a quoted string or a literal, whichever fits.
    fn astring(&mut self, s: &[u8]) {
        if s.iter().copied().any(needs_literal) {
            self.literal(s);
        } else if s.is_empty() || s.iter().copied().any(needs_quoting) {
            self.current.push(b'"');
            for &b in s {
                if b == b'"' || b == b'\\' {
                    self.current.push(b'\\');
                }
                self.current.push(b);
            }
            self.current.push(b'"');
        } else {
            self.push(s);
        }
    }

    fn literal(&mut self, data: &[u8]) {
        self.push(format!("{{{}}}\r\n", data.len()).as_bytes());
        self.done.push(std::mem::take(&mut self.current));
        self.push(data);
    }

    fn finish(mut self) -> Vec<Vec<u8>> {
        self.done.push(self.current);
        self.done
    }
}

/// Returns true if the byte cannot appear in a quoted string.
const fn needs_literal(b: u8) -> bool {
    matches!(b, b'\r' | b'\n' | 0) || b >= 0x80
}

/// Returns true if the byte cannot appear in an atom.
const fn needs_quoting(b: u8) -> bool {
    matches!(
        b,
        b' ' | b'"' | b'\\' | b'(' | b')' | b'{' | b'%' | b'*' | b']'
    ) || b < 0x20
        || b == 0x7F
}
