//! Byte-size option values (`--limit-memory`, `--reserve-memory`).

use std::fmt;

use super::FlagValue;
use crate::error::OptionError;

/// Binary unit suffixes used when rendering, smallest first.
const UNITS: &[&str] = &["B", "KiB", "MiB", "GiB", "TiB", "PiB"];

/// A memory size in bytes, parsed from human-readable text such as `512m`
/// or `1.5GiB`. Zero means unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemBytes(i64);

impl MemBytes {
    /// Creates a value from a byte count.
    #[must_use]
    pub const fn new(bytes: i64) -> Self {
        Self(bytes)
    }

    /// Returns the byte count.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

/// Parses `<number>[ ]<unit>[i][b]` where unit is one of `k m g t p`
/// (binary multipliers, case-insensitive) or absent for plain bytes.
#[allow(clippy::cast_possible_truncation)]
fn parse_ram_in_bytes(input: &str) -> Result<i64, OptionError> {
    let invalid = || OptionError::InvalidSize {
        input: input.to_string(),
    };

    let number_len = input
        .bytes()
        .take_while(|c| c.is_ascii_digit() || *c == b'.')
        .count();
    let (number, suffix) = input.split_at(number_len);
    if number.is_empty()
        || number.starts_with('.')
        || number.ends_with('.')
        || number.matches('.').count() > 1
    {
        return Err(invalid());
    }

    let lowered = suffix.strip_prefix(' ').unwrap_or(suffix).to_ascii_lowercase();
    let unit = lowered.strip_suffix('b').unwrap_or(lowered.as_str());
    let multiplier: i32 = match unit {
        "" => 0,
        "k" | "ki" => 1,
        "m" | "mi" => 2,
        "g" | "gi" => 3,
        "t" | "ti" => 4,
        "p" | "pi" => 5,
        _ => return Err(invalid()),
    };

    let magnitude: f64 = number.parse().map_err(|_| invalid())?;
    let bytes = magnitude * 1024f64.powi(multiplier);
    if !bytes.is_finite() || bytes >= 9.223_372_036_854_776e18 {
        return Err(OptionError::OutOfRange {
            input: input.to_string(),
        });
    }

    Ok(bytes as i64)
}

impl FlagValue for MemBytes {
    fn set(&mut self, value: &str) -> Result<(), OptionError> {
        self.0 = parse_ram_in_bytes(value)?;
        Ok(())
    }

    fn value_type(&self) -> &'static str {
        "bytes"
    }
}

impl fmt::Display for MemBytes {
    #[allow(clippy::cast_precision_loss)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let bytes = self.0.unsigned_abs();

        let mut index = 0;
        while index + 1 < UNITS.len() && bytes >= 1u64 << (10 * (index + 1)) {
            index += 1;
        }

        let scaled = bytes as f64 / (1u64 << (10 * index)) as f64;
        write!(f, "{sign}{scaled}{}", UNITS[index])
    }
}
