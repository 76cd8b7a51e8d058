//! IMAP command tag generator.
//!
//! Tags are used to match commands with their responses.

/// Tag generator for IMAP commands.
///
/// Generates sequential tags in the format "A0000", "A0001", etc.
#[derive(Debug, Clone)]
pub struct TagGenerator {
    counter: u32,
    prefix: char,
}

impl TagGenerator {
    /// Creates a new tag generator with the given prefix.
    #[must_use]
    pub const fn new(prefix: char) -> Self {
        Self { counter: 0, prefix }
    }

    /// Generates the next tag.
    ///
    /// The counter wraps instead of overflowing; a single import session
    /// never issues anywhere near `u32::MAX` commands.
    pub fn next(&mut self) -> String {
        let n = self.counter;
        self.counter = self.counter.wrapping_add(1);
        format!("{}{:04}", self.prefix, n)
    }
}

impl Default for TagGenerator {
    fn default() -> Self {
        Self::new('A')
    }
}
