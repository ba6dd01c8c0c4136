//! Conversions from raw option lists into specification records.

use std::collections::BTreeMap;

use crate::error::CompileError;
use crate::options::SecretRequestSpec;
use crate::swarm::{NetworkAttachmentConfig, SecretFile, SecretReference};

/// Converts `KEY=VALUE` entries into a map. A bare `KEY` maps to an empty
/// value; later duplicates overwrite earlier ones.
#[must_use]
pub fn convert_kv_strings_to_map<S: AsRef<str>>(values: &[S]) -> BTreeMap<String, String> {
    values
        .iter()
        .map(|entry| {
            let entry = entry.as_ref();
            let (key, value) = entry.split_once('=').unwrap_or((entry, ""));
            (key.to_string(), value.to_string())
        })
        .collect()
}

/// Rewrites `host:ip` entries into hosts-file `ip host` lines.
///
/// Entries are expected to have passed
/// [`validate_extra_host`](crate::options::validate_extra_host).
///
/// # Errors
///
/// Returns [`CompileError::MalformedExtraHost`] for an entry without a `:`.
pub fn convert_extra_hosts<S: AsRef<str>>(extra_hosts: &[S]) -> Result<Vec<String>, CompileError> {
    extra_hosts
        .iter()
        .map(|entry| {
            let entry = entry.as_ref();
            entry
                .split_once(':')
                .map(|(host, ip)| format!("{ip} {host}"))
                .ok_or_else(|| CompileError::MalformedExtraHost {
                    entry: entry.to_string(),
                })
        })
        .collect()
}

/// Turns each network name into a bare attachment record.
#[must_use]
pub fn convert_networks<S: AsRef<str>>(networks: &[S]) -> Vec<NetworkAttachmentConfig> {
    networks
        .iter()
        .map(|network| NetworkAttachmentConfig {
            target: network.as_ref().to_string(),
            aliases: Vec::new(),
        })
        .collect()
}

/// Turns secret requests into references. The secret id stays empty until
/// the name is resolved against the store.
#[must_use]
pub fn convert_secrets(requests: &[SecretRequestSpec]) -> Vec<SecretReference> {
    requests
        .iter()
        .map(|request| {
            let name = if request.target().is_empty() {
                request.source()
            } else {
                request.target()
            };
            SecretReference {
                secret_id: String::new(),
                secret_name: request.source().to_string(),
                file: Some(SecretFile {
                    name: name.to_string(),
                    uid: request.uid().to_string(),
                    gid: request.gid().to_string(),
                    mode: request.mode(),
                }),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{FlagValue, SecretOpt};

    #[test]
    fn test_kv_strings_to_map() {
        let map = convert_kv_strings_to_map(&["tier=web", "flag", "tier=db", "url=a=b"]);
        assert_eq!(map.len(), 3);
        assert_eq!(map["tier"], "db");
        assert_eq!(map["flag"], "");
        assert_eq!(map["url"], "a=b");
    }

    #[test]
    fn test_convert_extra_hosts() {
        let hosts = convert_extra_hosts(&["db:10.0.0.2", "v6:::1"]).unwrap();
        assert_eq!(hosts, vec!["10.0.0.2 db", "::1 v6"]);
    }

    #[test]
    fn test_convert_extra_hosts_rejects_missing_separator() {
        assert_eq!(
            convert_extra_hosts(&["db"]),
            Err(CompileError::MalformedExtraHost {
                entry: String::from("db")
            })
        );
    }

    #[test]
    fn test_convert_networks() {
        let nets = convert_networks(&["front", "back"]);
        assert_eq!(nets.len(), 2);
        assert_eq!(nets[1].target, "back");
        assert!(nets[0].aliases.is_empty());
    }

    #[test]
    fn test_convert_secrets() {
        let mut secrets = SecretOpt::new();
        secrets.set("source=db_pass,target=password,uid=33,mode=0400").unwrap();
        secrets.set("source=api_key").unwrap();

        let refs = convert_secrets(secrets.value());
        assert_eq!(refs[0].secret_name, "db_pass");
        assert!(refs[0].secret_id.is_empty());
        assert_eq!(
            refs[0].file,
            Some(SecretFile {
                name: String::from("password"),
                uid: String::from("33"),
                gid: String::from("0"),
                mode: 0o400,
            })
        );
        assert_eq!(refs[1].file.as_ref().map(|f| f.name.as_str()), Some("api_key"));
    }
}
