//! Repeatable list options with optional per-entry validation.

use std::fmt;
use std::net::IpAddr;

use super::FlagValue;
use crate::error::OptionError;

/// Validates one list entry, returning the (possibly normalized) text to
/// store.
pub type Validator = fn(&str) -> Result<String, OptionError>;

/// Longest accepted DNS search domain.
const MAX_DOMAIN_LEN: usize = 254;

/// Ordered accumulator for options that may be given several times.
#[derive(Debug, Clone, Default)]
pub struct ListOpts {
    values: Vec<String>,
    validator: Option<Validator>,
}

impl ListOpts {
    /// Creates an empty list that accepts any entry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            values: Vec::new(),
            validator: None,
        }
    }

    /// Creates an empty list that runs `validator` on every entry.
    #[must_use]
    pub const fn with_validator(validator: Validator) -> Self {
        Self {
            values: Vec::new(),
            validator: Some(validator),
        }
    }

    /// Returns the accumulated entries in the order they were given.
    #[must_use]
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Returns an owned copy of the accumulated entries.
    #[must_use]
    pub fn to_vec(&self) -> Vec<String> {
        self.values.clone()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no entry was given.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FlagValue for ListOpts {
    fn set(&mut self, value: &str) -> Result<(), OptionError> {
        let entry = match self.validator {
            Some(validate) => validate(value)?,
            None => value.to_string(),
        };
        self.values.push(entry);
        Ok(())
    }

    fn value_type(&self) -> &'static str {
        "list"
    }
}

impl fmt::Display for ListOpts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.values.join(" "))
    }
}

/// Validates a `KEY=VALUE` environment entry. A bare `KEY` picks up the
/// value of the variable from the current process environment if it is set.
///
/// # Errors
///
/// Returns an error if the key is empty or contains whitespace.
pub fn validate_env(value: &str) -> Result<String, OptionError> {
    let (key, assigned) = match value.split_once('=') {
        Some((key, _)) => (key, true),
        None => (value, false),
    };
    if key.is_empty() {
        return Err(OptionError::invalid(format!(
            "invalid environment variable: {value}"
        )));
    }
    if key.chars().any(char::is_whitespace) {
        return Err(OptionError::invalid(format!(
            "variable '{key}' has white spaces"
        )));
    }
    if assigned {
        return Ok(value.to_string());
    }
    Ok(std::env::var(key).map_or_else(|_| value.to_string(), |v| format!("{key}={v}")))
}

/// Validates a `KEY[=VALUE]` label entry.
///
/// # Errors
///
/// Returns an error if the label name is empty.
pub fn validate_label(value: &str) -> Result<String, OptionError> {
    let key = value.split_once('=').map_or(value, |(key, _)| key);
    if key.trim().is_empty() {
        return Err(OptionError::invalid(format!(
            "invalid label '{value}': empty name"
        )));
    }
    Ok(value.to_string())
}

/// Validates an IPv4 or IPv6 address, returning its canonical form.
///
/// # Errors
///
/// Returns an error if the text is not an IP address.
pub fn validate_ip_address(value: &str) -> Result<String, OptionError> {
    value
        .trim()
        .parse::<IpAddr>()
        .map(|ip| ip.to_string())
        .map_err(|_| OptionError::invalid(format!("{value} is not an ip address")))
}

/// Validates a DNS search domain. A single `.` is accepted as-is; a trailing
/// dot on a domain is dropped.
///
/// # Errors
///
/// Returns an error if the text is not a valid domain name.
pub fn validate_dns_search(value: &str) -> Result<String, OptionError> {
    let trimmed = value.trim();
    if trimmed == "." {
        return Ok(trimmed.to_string());
    }

    let domain = trimmed.strip_suffix('.').unwrap_or(trimmed);
    if domain.is_empty() || domain.len() > MAX_DOMAIN_LEN || !domain.split('.').all(is_domain_label) {
        return Err(OptionError::invalid(format!("{value} is not a valid domain")));
    }
    Ok(domain.to_string())
}

fn is_domain_label(label: &str) -> bool {
    !label.is_empty()
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Validates a `host:ip` extra host entry.
///
/// # Errors
///
/// Returns an error if the separator or the host name is missing, or the
/// address is not an IP address.
pub fn validate_extra_host(value: &str) -> Result<String, OptionError> {
    let Some((host, ip)) = value.split_once(':') else {
        return Err(OptionError::invalid(format!("bad format for add-host: {value:?}")));
    };
    if host.is_empty() {
        return Err(OptionError::invalid(format!("bad format for add-host: {value:?}")));
    }
    if validate_ip_address(ip).is_err() {
        return Err(OptionError::invalid(format!(
            "invalid IP address in add-host: {ip:?}"
        )));
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_accumulates_in_order() {
        let mut list = ListOpts::new();
        list.set("b").unwrap();
        list.set("a").unwrap();
        assert_eq!(list.values(), ["b", "a"]);
        assert_eq!(list.to_string(), "[b a]");
        assert_eq!(list.len(), 2);
        assert_eq!(list.value_type(), "list");
    }

    #[test]
    fn test_list_validator_rejects_and_normalizes() {
        let mut dns = ListOpts::with_validator(validate_ip_address);
        dns.set(" 8.8.8.8 ").unwrap();
        assert!(dns.set("not-an-ip").is_err());
        assert_eq!(dns.values(), ["8.8.8.8"]);
    }

    #[test]
    fn test_validate_env() {
        assert_eq!(validate_env("A=1").unwrap(), "A=1");
        assert_eq!(validate_env("A=").unwrap(), "A=");
        assert!(validate_env("=1").is_err());
        assert!(validate_env("A B=1").is_err());
        assert_eq!(
            validate_env("SVCSPEC_TEST_SURELY_UNSET_VAR").unwrap(),
            "SVCSPEC_TEST_SURELY_UNSET_VAR"
        );
    }

    #[test]
    fn test_validate_env_reads_process_env() {
        let key = "PATH";
        if let Ok(path) = std::env::var(key) {
            assert_eq!(validate_env(key).unwrap(), format!("PATH={path}"));
        }
    }

    #[test]
    fn test_validate_label() {
        assert_eq!(validate_label("tier=web").unwrap(), "tier=web");
        assert_eq!(validate_label("flag").unwrap(), "flag");
        assert!(validate_label("=web").is_err());
    }

    #[test]
    fn test_validate_ip_address() {
        assert_eq!(validate_ip_address("10.0.0.1").unwrap(), "10.0.0.1");
        assert_eq!(validate_ip_address("2001:db8:0:0::1").unwrap(), "2001:db8::1");
        assert!(validate_ip_address("10.0.0").is_err());
    }

    #[test]
    fn test_validate_dns_search() {
        assert_eq!(validate_dns_search(".").unwrap(), ".");
        assert_eq!(validate_dns_search("example.com").unwrap(), "example.com");
        assert_eq!(validate_dns_search("example.com.").unwrap(), "example.com");
        assert!(validate_dns_search("-bad.com").is_err());
        assert!(validate_dns_search("a..b").is_err());
        assert!(validate_dns_search(&"a".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_extra_host() {
        assert_eq!(validate_extra_host("db:10.0.0.2").unwrap(), "db:10.0.0.2");
        assert_eq!(validate_extra_host("v6:::1").unwrap(), "v6:::1");
        assert!(validate_extra_host("db").is_err());
        assert!(validate_extra_host(":10.0.0.2").is_err());
        assert!(validate_extra_host("db:nowhere").is_err());
    }
}
