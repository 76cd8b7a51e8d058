//! Byte cursor over a single response.

use crate::{Error, Result};

pub(super) struct Cursor<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub(super) const fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    pub(super) fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    pub(super) fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.input.len());
    }

    pub(super) fn skip_spaces(&mut self) {
        while self.peek() == Some(b' ') {
            self.pos += 1;
        }
    }

    pub(super) fn expect(&mut self, byte: u8) -> Result<()> {
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(&format!("expected {:?}", char::from(byte))))
        }
    }

    pub(super) fn expect_space(&mut self) -> Result<()> {
        self.expect(b' ')
    }

    /// Reads a non-empty run of atom characters.
    pub(super) fn atom(&mut self) -> Result<&'a str> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if matches!(b, b' ' | b'(' | b')' | b'[' | b']' | b'{' | b'"' | b'\r' | b'\n') {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.error("expected atom"));
        }
        let input = self.input;
        std::str::from_utf8(&input[start..self.pos]).map_err(|_| self.error("atom is not UTF-8"))
    }

    /// Reads an atom, a quoted string or a literal.
    pub(super) fn astring(&mut self) -> Result<String> {
        match self.peek() {
            Some(b'"') => self.quoted(),
            Some(b'{') => self.literal(),
            _ => self.atom().map(str::to_string),
        }
    }

    fn quoted(&mut self) -> Result<String> {
        self.expect(b'"')?;
        let mut out = Vec::new();
        loop {
            match self.peek() {
                Some(b'"') => {
                    self.pos += 1;
                    break;
                }
                Some(b'\\') => {
                    self.pos += 1;
                    let escaped = self.peek().ok_or_else(|| self.error("unterminated escape"))?;
                    out.push(escaped);
                    self.pos += 1;
                }
                Some(b'\r' | b'\n') | None => return Err(self.error("unterminated quoted string")),
                Some(b) => {
                    out.push(b);
                    self.pos += 1;
                }
            }
        }
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    /// Reads `{n}\r\n` followed by `n` bytes.
    fn literal(&mut self) -> Result<String> {
        self.expect(b'{')?;
        let len: usize = self
            .until(b'}')?
            .trim_end_matches('+')
            .parse()
            .map_err(|_| self.error("invalid literal length"))?;
        self.expect(b'\r')?;
        self.expect(b'\n')?;
        let input = self.input;
        let end = self.pos.saturating_add(len);
        let data = input
            .get(self.pos..end)
            .ok_or_else(|| self.error("literal runs past end of response"))?;
        self.pos = end;
        Ok(String::from_utf8_lossy(data).into_owned())
    }

    /// Reads up to (not including) `delim` and steps over it.
    pub(super) fn until(&mut self, delim: u8) -> Result<String> {
        let input = self.input;
        let rest = &input[self.pos..];
        let offset = rest
            .iter()
            .position(|&b| b == delim)
            .ok_or_else(|| self.error(&format!("missing {:?}", char::from(delim))))?;
        let text = String::from_utf8_lossy(&rest[..offset]).into_owned();
        self.pos += offset + 1;
        Ok(text)
    }

    /// Consumes the remainder of the current line.
    pub(super) fn rest_text(&mut self) -> String {
        let input = self.input;
        let rest = &input[self.pos..];
        let end = rest
            .iter()
            .position(|&b| b == b'\r' || b == b'\n')
            .unwrap_or(rest.len());
        self.pos += end;
        String::from_utf8_lossy(&rest[..end]).trim_end().to_string()
    }

    fn error(&self, message: &str) -> Error {
        Error::Parse(format!("{message} at position {}", self.pos))
    }
}
