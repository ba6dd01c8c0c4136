//! Secret request option (`--secret source=db_pass,target=pass,mode=0400`).

use std::fmt;

use super::{FlagValue, parse_uint, read_csv_fields, split_field};
use crate::error::OptionError;

const DEFAULT_MODE: u32 = 0o444;

/// One requested secret, before its identifier is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretRequestSpec {
    source: String,
    target: String,
    uid: String,
    gid: String,
    mode: u32,
}

impl SecretRequestSpec {
    /// Name of the secret in the store.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// File name inside the container; defaults to the source.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Owner user id.
    #[must_use]
    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// Owner group id.
    #[must_use]
    pub fn gid(&self) -> &str {
        &self.gid
    }

    /// File mode bits.
    #[must_use]
    pub const fn mode(&self) -> u32 {
        self.mode
    }
}

impl Default for SecretRequestSpec {
    fn default() -> Self {
        Self {
            source: String::new(),
            target: String::new(),
            uid: String::from("0"),
            gid: String::from("0"),
            mode: DEFAULT_MODE,
        }
    }
}

/// Accumulates secret requests, one per occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecretOpt {
    values: Vec<SecretRequestSpec>,
}

impl SecretOpt {
    /// Creates an empty option.
    #[must_use]
    pub const fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Returns the requests in the order they were given.
    #[must_use]
    pub fn value(&self) -> &[SecretRequestSpec] {
        &self.values
    }
}

fn parse_mode(value: &str) -> Result<u32, OptionError> {
    let mode = parse_uint(value).map_err(|e| OptionError::InvalidMode {
        reason: e.to_string(),
    })?;
    u32::try_from(mode).map_err(|_| OptionError::InvalidMode {
        reason: format!("value out of range: \"{value}\""),
    })
}

impl FlagValue for SecretOpt {
    fn set(&mut self, value: &str) -> Result<(), OptionError> {
        let mut spec = SecretRequestSpec::default();

        for field in read_csv_fields(value)? {
            let (key, val) = split_field(&field)?;
            match key.as_str() {
                "source" => spec.source = val.to_string(),
                "target" => {
                    if val.chars().any(std::path::is_separator) {
                        return Err(OptionError::TargetHasPath);
                    }
                    spec.target = val.to_string();
                }
                "uid" => spec.uid = val.to_string(),
                "gid" => spec.gid = val.to_string(),
                "mode" => spec.mode = parse_mode(val)?,
                _ => return Err(OptionError::UnknownSecretField { key }),
            }
        }

        if spec.source.is_empty() {
            return Err(OptionError::MissingSource);
        }
        if spec.target.is_empty() {
            spec.target.clone_from(&spec.source);
        }

        self.values.push(spec);
        Ok(())
    }

    fn value_type(&self) -> &'static str {
        "secret"
    }
}

impl fmt::Display for SecretOpt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .values
            .iter()
            .map(|s| format!("{} -> {}", s.source, s.target))
            .collect();
        f.write_str(&rendered.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_full_request() {
        let mut opt = SecretOpt::new();
        opt.set("source=mysecret,target=app.cfg,mode=0400").unwrap();

        let spec = &opt.value()[0];
        assert_eq!(spec.source(), "mysecret");
        assert_eq!(spec.target(), "app.cfg");
        assert_eq!(spec.uid(), "0");
        assert_eq!(spec.gid(), "0");
        assert_eq!(spec.mode(), 0o400);
        assert_eq!(opt.to_string(), "mysecret -> app.cfg");
    }

    #[test]
    fn test_secret_target_defaults_to_source() {
        let mut opt = SecretOpt::new();
        opt.set("source=db_pass,uid=1000,gid=1001").unwrap();
        opt.set("Source=api_key,MODE=0x1ff").unwrap();

        assert_eq!(opt.value().len(), 2);
        assert_eq!(opt.value()[0].target(), "db_pass");
        assert_eq!(opt.value()[0].uid(), "1000");
        assert_eq!(opt.value()[0].mode(), 0o444);
        assert_eq!(opt.value()[1].mode(), 0o777);
        assert_eq!(opt.to_string(), "db_pass -> db_pass, api_key -> api_key");
        assert_eq!(opt.value_type(), "secret");
    }

    #[test]
    fn test_secret_target_with_path_rejected() {
        let mut opt = SecretOpt::new();
        assert_eq!(
            opt.set("target=sub/app.cfg,source=x"),
            Err(OptionError::TargetHasPath)
        );
        assert!(opt.value().is_empty());
    }

    #[test]
    fn test_secret_errors() {
        let mut opt = SecretOpt::new();
        assert_eq!(opt.set("target=app.cfg"), Err(OptionError::MissingSource));
        assert_eq!(
            opt.set("source=x,owner=me"),
            Err(OptionError::UnknownSecretField {
                key: String::from("owner")
            })
        );
        assert!(matches!(opt.set("source=x,mode=rw"), Err(OptionError::InvalidMode { .. })));
        assert!(matches!(
            opt.set("source=x,mode=0x1ffffffff"),
            Err(OptionError::InvalidMode { .. })
        ));
        assert!(matches!(opt.set("source"), Err(OptionError::InvalidField { .. })));
        assert!(opt.value().is_empty());
    }
}
