//! Human-readable byte sizes.
//!
//! Units follow the usual split between SI and IEC prefixes:
//!
//! | Suffix | Multiplier |
//! |---|---|
//! | none, `B` | 1 |
//! | `k`, `kB` | 1000 |
//! | `M`, `MB` | 1000² |
//! | `G`, `T`, `P`, `E` (optionally with `B`) | 1000³ … 1000⁶ |
//! | `Ki`, `KiB` | 1024 |
//! | `Mi`, `MiB` | 1024² |
//! | `Gi`, `Ti`, `Pi`, `Ei` (optionally with `B`) | 1024³ … 1024⁶ |
//!
//! Suffixes are case-insensitive, whitespace between number and unit is
//! allowed, and the number may have a fractional part (`1.5M`). Fractions
//! of a byte are truncated.

use thiserror::Error;

/// Errors from [`parse_size`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseSizeError {
    /// The input was empty.
    #[error("empty size")]
    Empty,
    /// The numeric part is missing or malformed.
    #[error("invalid number in size {0:?}")]
    InvalidNumber(String),
    /// The unit suffix is not recognised.
    #[error("unknown size unit {0:?}")]
    UnknownUnit(String),
    /// The value does not fit in 64 bits.
    #[error("size {0:?} is too large")]
    Overflow(String),
}

/// Digits of a fraction that still matter for a 64-bit result.
const MAX_FRACTION_DIGITS: usize = 18;

/// Parses a human-readable size such as `20M`, `1.5 GiB` or `4096`.
///
/// # Errors
///
/// Returns a [`ParseSizeError`] when the string is not a valid size.
pub fn parse_size(input: &str) -> Result<u64, ParseSizeError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(ParseSizeError::Empty);
    }

    let split = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(s.len());
    let (number, unit) = s.split_at(split);
    let multiplier = unit_multiplier(unit.trim_start())
        .ok_or_else(|| ParseSizeError::UnknownUnit(unit.trim().to_string()))?;

    let invalid = || ParseSizeError::InvalidNumber(s.to_string());
    let (whole, fraction) = match number.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (number, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }
    if fraction.contains('.') {
        return Err(invalid());
    }

    let overflow = || ParseSizeError::Overflow(s.to_string());
    let whole: u128 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| overflow())?
    };
    let mut bytes = whole.checked_mul(multiplier).ok_or_else(overflow)?;

    let fraction = &fraction[..fraction.len().min(MAX_FRACTION_DIGITS)];
    if !fraction.is_empty() {
        let numerator: u128 = fraction.parse().map_err(|_| invalid())?;
        let exponent = u32::try_from(fraction.len()).map_err(|_| invalid())?;
        let denominator = 10u128.pow(exponent);
        bytes = bytes
            .checked_add(numerator * multiplier / denominator)
            .ok_or_else(overflow)?;
    }

    u64::try_from(bytes).map_err(|_| overflow())
}

/// Returns the multiplier for a unit suffix.
fn unit_multiplier(unit: &str) -> Option<u128> {
    let unit = unit.to_ascii_lowercase();
    let unit = unit.strip_suffix('b').unwrap_or(&unit);

    let (prefix, base) = match unit.strip_suffix('i') {
        Some(prefix) if !prefix.is_empty() => (prefix, 1024u128),
        Some(_) => return None,
        None => (unit, 1000u128),
    };

    let exponent = match prefix {
        "" => 0,
        "k" => 1,
        "m" => 2,
        "g" => 3,
        "t" => 4,
        "p" => 5,
        "e" => 6,
        _ => return None,
    };
    Some(base.pow(exponent))
}

/// Formats a byte count with SI units, e.g. `20 MB` or `5.0 kB`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["kB", "MB", "GB", "TB", "PB", "EB"];

    if bytes < 1000 {
        return format!("{bytes} B");
    }

    let mut value = bytes as f64 / 1000.0;
    let mut unit = UNITS[0];
    for next in &UNITS[1..] {
        if value < 1000.0 {
            break;
        }
        value /= 1000.0;
        unit = next;
    }

    if value < 10.0 {
        format!("{value:.1} {unit}")
    } else {
        format!("{value:.0} {unit}")
    }
}
