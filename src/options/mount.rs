//! Mount option (`--mount type=bind,source=/srv,target=/data,readonly`).

use std::fmt;

use super::{FlagValue, read_csv_fields, split_field};
use crate::error::OptionError;
use crate::swarm::{Mount, MountType};

/// Accumulates mounts, one per occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MountOpt {
    values: Vec<Mount>,
}

impl MountOpt {
    /// Creates an empty option.
    #[must_use]
    pub const fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Returns the mounts in the order they were given.
    #[must_use]
    pub fn value(&self) -> &[Mount] {
        &self.values
    }
}

fn parse_bool(value: &str) -> Result<bool, OptionError> {
    match value {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
        _ => Err(OptionError::InvalidChoice {
            kind: "boolean",
            input: value.to_string(),
            expected: "true, false",
        }),
    }
}

impl FlagValue for MountOpt {
    fn set(&mut self, value: &str) -> Result<(), OptionError> {
        let mut mount = Mount {
            kind: MountType::Volume,
            source: String::new(),
            target: String::new(),
            read_only: false,
        };

        for field in read_csv_fields(value)? {
            let lowered = field.to_lowercase();
            if lowered == "readonly" || lowered == "ro" {
                mount.read_only = true;
                continue;
            }

            let (key, val) = split_field(&field)?;
            match key.as_str() {
                "type" => mount.kind = val.parse()?,
                "source" | "src" => mount.source = val.to_string(),
                "target" | "dst" | "destination" => mount.target = val.to_string(),
                "readonly" | "ro" => mount.read_only = parse_bool(val)?,
                _ => {
                    return Err(OptionError::UnknownField {
                        key,
                        field: field.clone(),
                    });
                }
            }
        }

        if mount.target.is_empty() {
            return Err(OptionError::MissingField { field: "target" });
        }

        self.values.push(mount);
        Ok(())
    }

    fn value_type(&self) -> &'static str {
        "mount"
    }
}

impl fmt::Display for MountOpt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .values
            .iter()
            .map(|m| format!("{} {} {}", m.kind, m.source, m.target))
            .collect();
        f.write_str(&rendered.join(", "))
    }
}
