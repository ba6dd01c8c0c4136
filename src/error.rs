//! Error types for the service option compiler.
//!
//! Errors are split the same way the work is split: [`OptionError`] covers a
//! single flag value that failed to parse, [`CompileError`] covers conflicts
//! that only show up once all options are combined, and [`ServiceError`] is
//! the top-level type returned to callers.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the service option compiler.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A flag value could not be parsed.
    #[error(transparent)]
    Option(#[from] OptionError),

    /// A flag value was rejected, with the flag it was given for.
    #[error("invalid argument \"{value}\" for \"--{flag}\" flag (type {value_type}): {source}")]
    Flag {
        /// Flag name without the leading dashes.
        flag: String,
        /// Raw value given on the command line.
        value: String,
        /// Type tag of the option value.
        value_type: &'static str,
        /// Underlying parse error.
        source: OptionError,
    },

    /// Options were individually valid but conflict with each other.
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// An environment file could not be read.
    #[error("failed to read env file {}: {source}", path.display())]
    EnvFile {
        /// Path of the env file.
        path: PathBuf,
        /// Error reported by the env file reader.
        source: dotenvy::Error,
    },

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The compiled specification could not be rendered.
    #[error("Serialization error: {message}")]
    Serialize {
        /// Description of the serialization error.
        message: String,
    },
}

/// Errors raised while parsing a single option value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionError {
    /// Malformed duration text.
    #[error("time: invalid duration \"{input}\"")]
    InvalidDuration {
        /// The rejected input.
        input: String,
    },

    /// Duration text without a unit suffix.
    #[error("time: missing unit in duration \"{input}\"")]
    MissingDurationUnit {
        /// The rejected input.
        input: String,
    },

    /// Unknown duration unit.
    #[error("time: unknown unit \"{unit}\" in duration \"{input}\"")]
    UnknownDurationUnit {
        /// The unrecognized unit.
        unit: String,
        /// The rejected input.
        input: String,
    },

    /// A negative duration was given where only positive ones are allowed.
    #[error("duration cannot be negative")]
    NegativeDuration,

    /// Malformed byte size.
    #[error("invalid size: '{input}'")]
    InvalidSize {
        /// The rejected input.
        input: String,
    },

    /// Malformed number.
    #[error("invalid syntax for {kind}: \"{input}\"")]
    InvalidNumber {
        /// Kind of number expected (uint, float, ...).
        kind: &'static str,
        /// The rejected input.
        input: String,
    },

    /// Number out of the representable range.
    #[error("value out of range: \"{input}\"")]
    OutOfRange {
        /// The rejected input.
        input: String,
    },

    /// CPU quantity with more precision than nano-CPUs can hold.
    #[error("value is too precise")]
    TooPrecise,

    /// Value outside an enumerated set.
    #[error("invalid {kind} \"{input}\": expected one of {expected}")]
    InvalidChoice {
        /// What was being parsed.
        kind: &'static str,
        /// The rejected input.
        input: String,
        /// Accepted values, for the message.
        expected: &'static str,
    },

    /// The CSV field list could not be read.
    #[error("invalid field list: {message}")]
    Csv {
        /// Description of the CSV error.
        message: String,
    },

    /// A field of a CSV option is not a `key=value` pair.
    #[error("invalid field '{field}' must be a key=value pair")]
    InvalidField {
        /// The offending field.
        field: String,
    },

    /// Unknown key in a secret request.
    #[error("invalid field in secret request: {key}")]
    UnknownSecretField {
        /// The offending key.
        key: String,
    },

    /// Unknown key in a structured option other than a secret.
    #[error("unexpected key '{key}' in '{field}'")]
    UnknownField {
        /// The offending key.
        key: String,
        /// The whole field.
        field: String,
    },

    /// Secret target with a directory component.
    #[error("target must not have a path")]
    TargetHasPath,

    /// Secret mode that is not an unsigned integer.
    #[error("invalid mode specified: {reason}")]
    InvalidMode {
        /// Why the mode was rejected.
        reason: String,
    },

    /// Secret request without a source.
    #[error("source is required")]
    MissingSource,

    /// Required field missing from a structured option.
    #[error("{field} is required")]
    MissingField {
        /// Name of the missing field.
        field: &'static str,
    },

    /// Malformed port specification.
    #[error("{message}")]
    InvalidPort {
        /// Description of the port error.
        message: String,
    },

    /// Port binding scoped to a host IP.
    #[error("HostIP is not supported by a service.")]
    PortHostIpUnsupported,

    /// Generic validator rejection for list values.
    #[error("{message}")]
    InvalidValue {
        /// Description of the validation error.
        message: String,
    },
}

/// Errors raised while compiling the option aggregate into a specification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// `--no-healthcheck` combined with any `--health-*` setting.
    #[error("--no-healthcheck conflicts with --health-* options")]
    HealthCheckConflict,

    /// Replica count given for a global service.
    #[error("replicas can only be used with replicated mode")]
    ReplicasUnderGlobalMode,

    /// Service mode other than `global` or `replicated`.
    #[error("Unknown mode: {mode}")]
    InvalidMode {
        /// The unrecognized mode.
        mode: String,
    },

    /// Extra host entry without the `host:ip` separator.
    #[error("bad format for extra host: {entry:?}")]
    MalformedExtraHost {
        /// The offending entry.
        entry: String,
    },
}

/// Result type alias for service compiler operations.
pub type Result<T> = std::result::Result<T, ServiceError>;

impl ServiceError {
    /// Wraps an option error with the flag and value it was raised for.
    #[must_use]
    pub fn flag(
        flag: impl Into<String>,
        value: impl Into<String>,
        value_type: &'static str,
        source: OptionError,
    ) -> Self {
        Self::Flag {
            flag: flag.into(),
            value: value.into(),
            value_type,
            source,
        }
    }

    /// Creates a serialization error with the given message.
    #[must_use]
    pub fn serialize(message: impl Into<String>) -> Self {
        Self::Serialize {
            message: message.into(),
        }
    }

    /// Returns the compile error behind this error, if any.
    #[must_use]
    pub const fn as_compile(&self) -> Option<&CompileError> {
        match self {
            Self::Compile(e) => Some(e),
            _ => None,
        }
    }
}

impl OptionError {
    /// Creates an invalid number error.
    #[must_use]
    pub fn number(kind: &'static str, input: impl Into<String>) -> Self {
        Self::InvalidNumber {
            kind,
            input: input.into(),
        }
    }

    /// Creates a generic validation error with the given message.
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidValue {
            message: message.into(),
        }
    }

    /// Creates a port specification error with the given message.
    #[must_use]
    pub fn port(message: impl Into<String>) -> Self {
        Self::InvalidPort {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_error_message() {
        let err = ServiceError::flag(
            "limit-memory",
            "12x",
            "bytes",
            OptionError::InvalidSize {
                input: String::from("12x"),
            },
        );
        assert_eq!(
            err.to_string(),
            "invalid argument \"12x\" for \"--limit-memory\" flag (type bytes): invalid size: '12x'"
        );
    }

    #[test]
    fn test_compile_error_messages() {
        let err = CompileError::InvalidMode {
            mode: String::from("bogus"),
        };
        assert_eq!(err.to_string(), "Unknown mode: bogus");
        assert_eq!(
            CompileError::HealthCheckConflict.to_string(),
            "--no-healthcheck conflicts with --health-* options"
        );
    }

    #[test]
    fn test_as_compile() {
        let err = ServiceError::from(CompileError::ReplicasUnderGlobalMode);
        assert_eq!(err.as_compile(), Some(&CompileError::ReplicasUnderGlobalMode));
        assert!(ServiceError::serialize("x").as_compile().is_none());
    }
}
