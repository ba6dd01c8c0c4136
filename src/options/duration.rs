//! Duration option values.
//!
//! Durations are signed nanosecond counts written as a sequence of decimal
//! numbers with unit suffixes, such as `300ms`, `-1.5h` or `2h45m`. Valid
//! units are `ns`, `us` (or `µs`), `ms`, `s`, `m` and `h`.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::FlagValue;
use crate::error::OptionError;

const NANOSECOND: u64 = 1;
const MICROSECOND: u64 = 1_000 * NANOSECOND;
const MILLISECOND: u64 = 1_000 * MICROSECOND;
const SECOND: u64 = 1_000 * MILLISECOND;
const MINUTE: u64 = 60 * SECOND;
const HOUR: u64 = 60 * MINUTE;

/// Digits of a fraction beyond this are ignored.
const MAX_FRACTION_DIGITS: u32 = 20;

/// A signed span of time with nanosecond resolution.
///
/// Serializes as an integer count of nanoseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Duration(i64);

impl Duration {
    /// The zero duration.
    pub const ZERO: Self = Self(0);

    /// Creates a duration from a nanosecond count.
    #[must_use]
    pub const fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    /// Creates a duration from whole seconds.
    #[must_use]
    pub const fn from_secs(secs: i64) -> Self {
        Self(secs * SECOND as i64)
    }

    /// Returns the nanosecond count.
    #[must_use]
    pub const fn as_nanos(self) -> i64 {
        self.0
    }

    /// Returns true if the duration is below zero.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut u = self.0.unsigned_abs();
        if u == 0 {
            return f.write_str("0s");
        }

        let sign = if self.0 < 0 { "-" } else { "" };

        if u < SECOND {
            let (prec, unit) = if u < MICROSECOND {
                (0, "ns")
            } else if u < MILLISECOND {
                (3, "µs")
            } else {
                (6, "ms")
            };
            let (frac, int) = format_fraction(u, prec);
            return write!(f, "{sign}{int}{frac}{unit}");
        }

        let (frac, secs) = format_fraction(u, 9);
        let mut out = format!("{}{frac}s", secs % 60);
        u = secs / 60;
        if u > 0 {
            out = format!("{}m{out}", u % 60);
            u /= 60;
            if u > 0 {
                out = format!("{u}h{out}");
            }
        }
        write!(f, "{sign}{out}")
    }
}

/// Splits `v` into its integer part and a `.ddd` fraction of `prec` digits,
/// with trailing zeros (and an empty fraction) dropped.
fn format_fraction(v: u64, prec: u32) -> (String, u64) {
    let pow = 10u64.pow(prec);
    let frac = v % pow;
    if frac == 0 {
        return (String::new(), v / pow);
    }
    let digits = format!("{frac:0width$}", width = prec as usize);
    (format!(".{}", digits.trim_end_matches('0')), v / pow)
}

fn unit_nanos(unit: &str) -> Option<u64> {
    match unit {
        "ns" => Some(NANOSECOND),
        "us" | "µs" | "μs" => Some(MICROSECOND),
        "ms" => Some(MILLISECOND),
        "s" => Some(SECOND),
        "m" => Some(MINUTE),
        "h" => Some(HOUR),
        _ => None,
    }
}

/// Parses a duration string such as `1h30m` or `-2.5s`.
///
/// # Errors
///
/// Returns an error if the string is empty, a number has no unit, a unit is
/// unknown, or the value does not fit in a signed 64-bit nanosecond count.
pub fn parse_duration(input: &str) -> Result<Duration, OptionError> {
    let invalid = || OptionError::InvalidDuration {
        input: input.to_string(),
    };

    let mut s = input;
    let mut negative = false;
    if let Some(rest) = s.strip_prefix('-') {
        negative = true;
        s = rest;
    } else if let Some(rest) = s.strip_prefix('+') {
        s = rest;
    }

    if s == "0" {
        return Ok(Duration::ZERO);
    }
    if s.is_empty() {
        return Err(invalid());
    }

    let limit = u128::from(i64::MAX.unsigned_abs()) + 1;
    let mut total: u128 = 0;

    while !s.is_empty() {
        let int_len = s.bytes().take_while(u8::is_ascii_digit).count();
        let (int_digits, rest) = s.split_at(int_len);
        s = rest;

        let mut frac_digits = "";
        if let Some(rest) = s.strip_prefix('.') {
            let frac_len = rest.bytes().take_while(u8::is_ascii_digit).count();
            frac_digits = &rest[..frac_len];
            s = &rest[frac_len..];
            if int_digits.is_empty() && frac_digits.is_empty() {
                return Err(invalid());
            }
        } else if int_digits.is_empty() {
            return Err(invalid());
        }

        let unit_len = s
            .bytes()
            .take_while(|c| *c != b'.' && !c.is_ascii_digit())
            .count();
        if unit_len == 0 {
            return Err(OptionError::MissingDurationUnit {
                input: input.to_string(),
            });
        }
        let (unit_text, rest) = s.split_at(unit_len);
        s = rest;
        let unit = unit_nanos(unit_text).ok_or_else(|| OptionError::UnknownDurationUnit {
            unit: unit_text.to_string(),
            input: input.to_string(),
        })?;

        let mut whole: u128 = 0;
        for digit in int_digits.bytes() {
            whole = whole * 10 + u128::from(digit - b'0');
            if whole > limit {
                return Err(invalid());
            }
        }
        let mut value = whole * u128::from(unit);

        if !frac_digits.is_empty() {
            let mut numerator: u128 = 0;
            let mut scale: u128 = 1;
            for digit in frac_digits.bytes().take(MAX_FRACTION_DIGITS as usize) {
                numerator = numerator * 10 + u128::from(digit - b'0');
                scale *= 10;
            }
            value += numerator * u128::from(unit) / scale;
        }

        total += value;
        if total > limit {
            return Err(invalid());
        }
    }

    if negative {
        let nanos = i128::try_from(total).map_err(|_| invalid())?;
        i64::try_from(-nanos).map(Duration).map_err(|_| invalid())
    } else {
        i64::try_from(total).map(Duration).map_err(|_| invalid())
    }
}

/// Duration option that distinguishes "not given" from `0s`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DurationOpt {
    value: Option<Duration>,
}

impl DurationOpt {
    /// Creates an unset duration option.
    #[must_use]
    pub const fn new() -> Self {
        Self { value: None }
    }

    /// Returns the parsed duration, if one was given.
    #[must_use]
    pub const fn value(&self) -> Option<Duration> {
        self.value
    }
}

impl FlagValue for DurationOpt {
    fn set(&mut self, value: &str) -> Result<(), OptionError> {
        self.value = Some(parse_duration(value)?);
        Ok(())
    }

    fn value_type(&self) -> &'static str {
        "duration"
    }
}

impl fmt::Display for DurationOpt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Some(d) => fmt::Display::fmt(&d, f),
            None => f.write_str("none"),
        }
    }
}

/// Duration option that only accepts values of zero or more.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PositiveDurationOpt {
    inner: DurationOpt,
}

impl PositiveDurationOpt {
    /// Creates an unset option.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            inner: DurationOpt::new(),
        }
    }

    /// Returns the parsed duration, if one was given.
    #[must_use]
    pub const fn value(&self) -> Option<Duration> {
        self.inner.value()
    }
}

impl FlagValue for PositiveDurationOpt {
    fn set(&mut self, value: &str) -> Result<(), OptionError> {
        let mut candidate = self.inner;
        candidate.set(value)?;
        if candidate.value().is_some_and(Duration::is_negative) {
            return Err(OptionError::NegativeDuration);
        }
        self.inner = candidate;
        Ok(())
    }

    fn value_type(&self) -> &'static str {
        self.inner.value_type()
    }
}

impl fmt::Display for PositiveDurationOpt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_units() {
        assert_eq!(parse_duration("10ns").unwrap().as_nanos(), 10);
        assert_eq!(parse_duration("3us").unwrap().as_nanos(), 3_000);
        assert_eq!(parse_duration("3µs").unwrap().as_nanos(), 3_000);
        assert_eq!(parse_duration("5ms").unwrap().as_nanos(), 5_000_000);
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("1m").unwrap(), Duration::from_secs(60));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
    }

    #[test]
    fn test_parse_compound_and_fraction() {
        assert_eq!(parse_duration("1h30m").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_duration("1.5s").unwrap().as_nanos(), 1_500_000_000);
        assert_eq!(parse_duration(".5m").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("-2m3s").unwrap(), Duration::from_secs(-123));
        assert_eq!(parse_duration("+4s").unwrap(), Duration::from_secs(4));
        assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse_duration(""), Err(OptionError::InvalidDuration { .. })));
        assert!(matches!(parse_duration("-"), Err(OptionError::InvalidDuration { .. })));
        assert!(matches!(parse_duration("."), Err(OptionError::InvalidDuration { .. })));
        assert!(matches!(parse_duration("10"), Err(OptionError::MissingDurationUnit { .. })));
        assert!(matches!(parse_duration("3d"), Err(OptionError::UnknownDurationUnit { .. })));
        assert!(matches!(parse_duration("s"), Err(OptionError::InvalidDuration { .. })));
        assert!(matches!(
            parse_duration("9999999999999999999h"),
            Err(OptionError::InvalidDuration { .. })
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(Duration::ZERO.to_string(), "0s");
        assert_eq!(Duration::from_nanos(250).to_string(), "250ns");
        assert_eq!(Duration::from_nanos(1_500).to_string(), "1.5µs");
        assert_eq!(Duration::from_nanos(1_500_000).to_string(), "1.5ms");
        assert_eq!(Duration::from_secs(1).to_string(), "1s");
        assert_eq!(Duration::from_secs(90).to_string(), "1m30s");
        assert_eq!(Duration::from_secs(3600).to_string(), "1h0m0s");
        assert_eq!(Duration::from_nanos(5_400_500_000_000).to_string(), "1h30m0.5s");
        assert_eq!(Duration::from_secs(-90).to_string(), "-1m30s");
    }

    #[test]
    fn test_round_trip() {
        for text in ["0s", "1ns", "999us", "12.5ms", "59s", "61m", "100h", "-3.25s", "1h1m1.000000001s"] {
            let parsed = parse_duration(text).unwrap();
            assert_eq!(parse_duration(&parsed.to_string()).unwrap(), parsed, "{text}");
        }
    }

    #[test]
    fn test_duration_opt_unset() {
        let opt = DurationOpt::new();
        assert_eq!(opt.value(), None);
        assert_eq!(opt.to_string(), "none");
        assert_eq!(opt.value_type(), "duration");
    }

    #[test]
    fn test_duration_opt_zero_is_set() {
        let mut opt = DurationOpt::new();
        opt.set("0s").unwrap();
        assert_eq!(opt.value(), Some(Duration::ZERO));
        assert_eq!(opt.to_string(), "0s");
    }

    #[test]
    fn test_duration_opt_keeps_value_on_error() {
        let mut opt = DurationOpt::new();
        opt.set("5s").unwrap();
        assert!(opt.set("bogus").is_err());
        assert_eq!(opt.value(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_positive_duration_rejects_negative() {
        let mut opt = PositiveDurationOpt::new();
        let err = opt.set("-1s").unwrap_err();
        assert_eq!(err, OptionError::NegativeDuration);
        assert_eq!(err.to_string(), "duration cannot be negative");
        assert_eq!(opt.value(), None);
    }

    #[test]
    fn test_positive_duration_accepts_non_negative() {
        for text in ["0s", "1ns", "30s", "2h"] {
            let mut positive = PositiveDurationOpt::new();
            let mut general = DurationOpt::new();
            positive.set(text).unwrap();
            general.set(text).unwrap();
            assert_eq!(positive.value(), general.value());
        }
    }
}
