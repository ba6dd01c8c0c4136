//! Numeric option values: unsigned integers, floats and CPU quantities.

use std::fmt;
use std::num::IntErrorKind;

use super::FlagValue;
use crate::error::OptionError;

const NANOS_PER_CPU: i64 = 1_000_000_000;

/// Parses an unsigned integer whose base is taken from its prefix:
/// `0x` hexadecimal, `0o` or a bare leading `0` octal, `0b` binary, decimal
/// otherwise. Underscores may separate digits.
///
/// # Errors
///
/// Returns an error if the text is not a well-formed number or does not fit
/// in 64 bits.
pub fn parse_uint(input: &str) -> Result<u64, OptionError> {
    let invalid = || OptionError::number("uint", input);

    let lower = input.get(..2).map(str::to_ascii_lowercase);
    let (radix, digits, prefixed) = match lower.as_deref() {
        Some("0x") => (16, &input[2..], true),
        Some("0o") => (8, &input[2..], true),
        Some("0b") => (2, &input[2..], true),
        _ if input.len() > 1 && input.starts_with('0') => (8, &input[1..], true),
        _ => (10, input, false),
    };

    if digits.is_empty()
        || digits.ends_with('_')
        || digits.contains("__")
        || (!prefixed && digits.starts_with('_'))
        || !digits.chars().all(|c| c == '_' || c.is_ascii_alphanumeric())
    {
        return Err(invalid());
    }

    let cleaned: String = digits.chars().filter(|c| *c != '_').collect();
    if cleaned.is_empty() {
        return Err(invalid());
    }

    u64::from_str_radix(&cleaned, radix).map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow => OptionError::OutOfRange {
            input: input.to_string(),
        },
        _ => invalid(),
    })
}

/// Unsigned integer option that distinguishes "not given" from zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Uint64Opt {
    value: Option<u64>,
}

impl Uint64Opt {
    /// Creates an unset option.
    #[must_use]
    pub const fn new() -> Self {
        Self { value: None }
    }

    /// Returns the parsed number, if one was given.
    #[must_use]
    pub const fn value(&self) -> Option<u64> {
        self.value
    }
}

impl FlagValue for Uint64Opt {
    fn set(&mut self, value: &str) -> Result<(), OptionError> {
        self.value = Some(parse_uint(value)?);
        Ok(())
    }

    fn value_type(&self) -> &'static str {
        "uint"
    }
}

impl fmt::Display for Uint64Opt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Some(v) => write!(f, "{v}"),
            None => f.write_str("none"),
        }
    }
}

/// 32-bit float option that distinguishes "not given" from zero.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FloatOpt {
    value: Option<f32>,
}

impl FloatOpt {
    /// Creates an unset option.
    #[must_use]
    pub const fn new() -> Self {
        Self { value: None }
    }

    /// Returns the parsed number, if one was given.
    #[must_use]
    pub const fn value(&self) -> Option<f32> {
        self.value
    }
}

impl FlagValue for FloatOpt {
    fn set(&mut self, value: &str) -> Result<(), OptionError> {
        let parsed = value
            .parse::<f32>()
            .map_err(|_| OptionError::number("float", value))?;
        self.value = Some(parsed);
        Ok(())
    }

    fn value_type(&self) -> &'static str {
        "float"
    }
}

impl fmt::Display for FloatOpt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Some(v) => write!(f, "{v}"),
            None => f.write_str("none"),
        }
    }
}

/// CPU quantity stored as nano-CPUs (`1.5` CPUs is `1_500_000_000`).
/// Zero means unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NanoCpus(i64);

impl NanoCpus {
    /// Creates a value from a nano-CPU count.
    #[must_use]
    pub const fn new(nanos: i64) -> Self {
        Self(nanos)
    }

    /// Returns the nano-CPU count.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

fn parse_cpus(input: &str) -> Result<i64, OptionError> {
    let invalid = || OptionError::number("rational number", input);
    let out_of_range = || OptionError::OutOfRange {
        input: input.to_string(),
    };

    let (whole, fraction) = input.split_once('.').unwrap_or((input, ""));
    if (whole.is_empty() && fraction.is_empty())
        || !whole.bytes().all(|c| c.is_ascii_digit())
        || !fraction.bytes().all(|c| c.is_ascii_digit())
    {
        return Err(invalid());
    }

    // Digits past nano precision must all be zero.
    let (significant, excess) = fraction.split_at(fraction.len().min(9));
    if excess.bytes().any(|c| c != b'0') {
        return Err(OptionError::TooPrecise);
    }

    let whole: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| out_of_range())?
    };
    let fraction: i64 = if significant.is_empty() {
        0
    } else {
        format!("{significant:0<9}").parse().map_err(|_| invalid())?
    };

    whole
        .checked_mul(NANOS_PER_CPU)
        .and_then(|n| n.checked_add(fraction))
        .ok_or_else(out_of_range)
}

impl FlagValue for NanoCpus {
    fn set(&mut self, value: &str) -> Result<(), OptionError> {
        self.0 = parse_cpus(value)?;
        Ok(())
    }

    fn value_type(&self) -> &'static str {
        "decimal"
    }
}

impl fmt::Display for NanoCpus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let millis = (self.0.unsigned_abs() + 500_000) / 1_000_000;
        write!(f, "{sign}{}.{:03}", millis / 1_000, millis % 1_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_uint_bases() {
        assert_eq!(parse_uint("0").unwrap(), 0);
        assert_eq!(parse_uint("42").unwrap(), 42);
        assert_eq!(parse_uint("0x1F").unwrap(), 31);
        assert_eq!(parse_uint("0X1f").unwrap(), 31);
        assert_eq!(parse_uint("0o17").unwrap(), 15);
        assert_eq!(parse_uint("0444").unwrap(), 0o444);
        assert_eq!(parse_uint("0b101").unwrap(), 5);
        assert_eq!(parse_uint("1_000").unwrap(), 1000);
        assert_eq!(parse_uint("0x_ff").unwrap(), 255);
    }

    #[test]
    fn test_parse_uint_errors() {
        for text in ["", "-1", "+1", "abc", "0x", "08", "1__0", "_1", "1_", "1.5", " 1"] {
            assert!(
                matches!(parse_uint(text), Err(OptionError::InvalidNumber { .. })),
                "{text}"
            );
        }
        assert!(matches!(
            parse_uint("18446744073709551616"),
            Err(OptionError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_uint_opt() {
        let mut opt = Uint64Opt::new();
        assert_eq!(opt.to_string(), "none");
        opt.set("0").unwrap();
        assert_eq!(opt.value(), Some(0));
        assert_eq!(opt.to_string(), "0");
        assert!(opt.set("x").is_err());
        assert_eq!(opt.value(), Some(0));
        assert_eq!(opt.value_type(), "uint");
    }

    #[test]
    fn test_float_opt() {
        let mut opt = FloatOpt::new();
        assert_eq!(opt.to_string(), "none");
        opt.set("0.25").unwrap();
        assert_eq!(opt.value(), Some(0.25));
        assert_eq!(opt.to_string(), "0.25");
        assert!(matches!(opt.set("quarter"), Err(OptionError::InvalidNumber { .. })));
        assert_eq!(opt.value(), Some(0.25));
        assert_eq!(opt.value_type(), "float");
    }

    #[test]
    fn test_float_opt_round_trip() {
        for text in ["0.1", "1", "0.3333", "1e-7"] {
            let mut first = FloatOpt::new();
            first.set(text).unwrap();
            let mut second = FloatOpt::new();
            second.set(&first.to_string()).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_nano_cpus() {
        let mut cpus = NanoCpus::default();
        cpus.set("1.5").unwrap();
        assert_eq!(cpus.value(), 1_500_000_000);
        assert_eq!(cpus.to_string(), "1.500");

        cpus.set(".25").unwrap();
        assert_eq!(cpus.value(), 250_000_000);

        cpus.set("2").unwrap();
        assert_eq!(cpus.value(), 2 * NANOS_PER_CPU);

        cpus.set("0.0000000010").unwrap();
        assert_eq!(cpus.value(), 1);
        assert_eq!(cpus.value_type(), "decimal");
    }

    #[test]
    fn test_nano_cpus_errors() {
        let mut cpus = NanoCpus::default();
        assert_eq!(cpus.set("0.0000000001"), Err(OptionError::TooPrecise));
        assert!(matches!(cpus.set("one"), Err(OptionError::InvalidNumber { .. })));
        assert!(matches!(cpus.set("."), Err(OptionError::InvalidNumber { .. })));
        assert_eq!(cpus.value(), 0);
    }

    #[test]
    fn test_nano_cpus_display_rounds() {
        assert_eq!(NanoCpus::new(0).to_string(), "0.000");
        assert_eq!(NanoCpus::new(1_234_500_000).to_string(), "1.235");
        assert_eq!(NanoCpus::new(999_999_999).to_string(), "1.000");
    }
}
