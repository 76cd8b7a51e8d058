//! Effective size limit for an import run.

use std::fmt;

use crate::size::format_size;

/// Byte threshold enforced for every file of a run; 0 means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct EffectiveLimit(u64);

impl EffectiveLimit {
    /// No limit at all.
    pub const UNLIMITED: Self = Self(0);

    /// Creates a limit of `bytes`; 0 means unlimited.
    #[must_use]
    pub const fn new(bytes: u64) -> Self {
        Self(bytes)
    }

    /// Returns the limit in bytes (0 when unlimited).
    #[must_use]
    pub const fn bytes(self) -> u64 {
        self.0
    }

    /// Returns true if no limit applies.
    #[must_use]
    pub const fn is_unlimited(self) -> bool {
        self.0 == 0
    }

    /// Returns true if a file of `size` bytes may be imported.
    ///
    /// A file exactly at the limit is allowed.
    #[must_use]
    pub const fn allows(self, size: u64) -> bool {
        self.is_unlimited() || size <= self.0
    }
}

impl fmt::Display for EffectiveLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unlimited() {
            f.write_str("unlimited")
        } else {
            f.write_str(&format_size(self.0))
        }
    }
}

/// Combines the local limit with what the server advertised.
///
/// A nonzero server limit wins, whether it is smaller or larger than the
/// local one. A zero or missing server limit leaves the local limit in
/// place. Both values are plain byte counts.
#[must_use]
pub fn resolve_effective_limit(local: u64, remote: Option<u32>) -> EffectiveLimit {
    match remote {
        Some(remote) if remote != 0 => EffectiveLimit(u64::from(remote)),
        _ => EffectiveLimit(local),
    }
}
