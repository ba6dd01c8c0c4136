//! Typed option values.
//!
//! Every option that can be given on the command line is backed by a type
//! implementing [`FlagValue`]. A value knows how to parse one textual
//! occurrence, how to render itself back to text and which type tag to show
//! in diagnostics. Nothing in this module depends on the rest of the crate
//! other than the error types.

mod bytes;
mod choice;
mod duration;
mod list;
mod mount;
mod numeric;
mod port;
mod secret;

use std::fmt;

use crate::error::OptionError;

pub use bytes::MemBytes;
pub use choice::ChoiceOpt;
pub use duration::{Duration, DurationOpt, PositiveDurationOpt, parse_duration};
pub use list::{
    ListOpts, Validator, validate_dns_search, validate_env, validate_extra_host,
    validate_ip_address, validate_label,
};
pub use mount::MountOpt;
pub use numeric::{FloatOpt, NanoCpus, Uint64Opt, parse_uint};
pub use port::{
    Port, PortBinding, PortMapping, PortOpt, PortSpecs, convert_port_to_port_config,
    parse_port_spec, parse_port_specs, validate_port,
};
pub use secret::{SecretOpt, SecretRequestSpec};

/// Common capability set of every option value.
///
/// Rendering goes through [`fmt::Display`]; for values that were never set the
/// rendering is a sentinel such as `none`.
pub trait FlagValue: fmt::Display {
    /// Parses one occurrence of the option and stores it.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is malformed. Scalar values keep their
    /// previous state when this happens.
    fn set(&mut self, value: &str) -> Result<(), OptionError>;

    /// Type tag shown in diagnostics.
    fn value_type(&self) -> &'static str;
}

/// Reads a single CSV record, as used by the structured options
/// (`--secret`, `--mount`, `--port`).
pub(crate) fn read_csv_fields(value: &str) -> Result<Vec<String>, OptionError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(value.as_bytes());

    let mut record = csv::StringRecord::new();
    match reader.read_record(&mut record) {
        Ok(true) => Ok(record.iter().map(str::to_string).collect()),
        Ok(false) => Err(OptionError::Csv {
            message: String::from("empty value"),
        }),
        Err(e) => Err(OptionError::Csv {
            message: e.to_string(),
        }),
    }
}

/// Splits a `key=value` field, lower-casing the key.
pub(crate) fn split_field(field: &str) -> Result<(String, &str), OptionError> {
    field
        .split_once('=')
        .map(|(key, value)| (key.to_lowercase(), value))
        .ok_or_else(|| OptionError::InvalidField {
            field: field.to_string(),
        })
}
